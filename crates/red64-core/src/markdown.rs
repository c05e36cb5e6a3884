//! Section slicing for rule documents and product docs.
//!
//! Rule documents: the `## DON'T` section runs until the next level-2 heading
//! (`## ` at line start, so `###` subsections stay inside).
//!
//! Product docs: a named section runs until the next line opening with `##`,
//! `###` included. Every function returns an empty value when nothing matches.

use regex::Regex;
use std::sync::OnceLock;

static H2_RE: OnceLock<Regex> = OnceLock::new();
static DONT_RE: OnceLock<Regex> = OnceLock::new();
static FENCE_RE: OnceLock<Regex> = OnceLock::new();

fn h2_re() -> &'static Regex {
    H2_RE.get_or_init(|| Regex::new(r"(?m)^##\s").unwrap())
}

fn dont_re() -> &'static Regex {
    DONT_RE.get_or_init(|| Regex::new(r"(?im)^##\s*DON'T\s*$").unwrap())
}

fn fence_re() -> &'static Regex {
    FENCE_RE.get_or_init(|| Regex::new(r"(?s)```\w*\n(.*?)```").unwrap())
}

/// Trimmed body of the first section whose heading matches `heading`.
pub fn section_body(content: &str, heading: &Regex) -> String {
    let Some(m) = heading.find(content) else {
        return String::new();
    };
    let rest = &content[m.end()..];
    let end = h2_re().find(rest).map(|n| n.start()).unwrap_or(rest.len());
    rest[..end].trim().to_string()
}

/// Body of the `## DON'T` section (heading matched case-insensitively).
pub fn dont_section(content: &str) -> String {
    section_body(content, dont_re())
}

/// Body of `## <name>` or `## The <name>`, case-insensitive. The heading is
/// not anchored, so `### <name>` opens a section too.
pub fn named_section(content: &str, name: &str) -> String {
    let pattern = format!(r"(?i)##\s*(?:The\s+)?{}\s*\n", regex::escape(name));
    let Ok(heading) = Regex::new(&pattern) else {
        return String::new();
    };
    let Some(m) = heading.find(content) else {
        return String::new();
    };
    let rest = &content[m.end()..];
    let end = rest.find("\n##").unwrap_or(rest.len());
    rest[..end].trim().to_string()
}

/// Contents of every fenced code block, trimmed, empty blocks dropped.
pub fn fenced_code_blocks(section: &str) -> Vec<String> {
    fence_re()
        .captures_iter(section)
        .map(|c| c[1].trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

//! File-signal detection: which languages, files, and directories a prompt
//! talks about.
//!
//! A signal is one of
//! - an extension token such as `.py`,
//! - an explicit filename such as `config.yaml`,
//! - a directory-style path reference that always ends in `/`.

use regex::Regex;
use std::sync::OnceLock;

/// Known extensions in declaration order, each with the keywords that imply it.
pub const EXTENSION_KEYWORDS: &[(&str, &[&str])] = &[
    (".py", &["python", "py", ".py"]),
    (".ts", &["typescript", "ts", ".ts"]),
    (".js", &["javascript", "js", ".js"]),
    (".md", &["markdown", "md", ".md"]),
    (".yaml", &["yaml", ".yaml", ".yml"]),
    (".json", &["json", ".json"]),
    (".html", &["html", ".html"]),
    (".css", &["css", ".css"]),
];

static FILENAME_RE: OnceLock<Regex> = OnceLock::new();
static PATH_RE: OnceLock<Regex> = OnceLock::new();

fn filename_re() -> &'static Regex {
    FILENAME_RE.get_or_init(|| {
        Regex::new(r"\b([a-zA-Z0-9_-]+\.(?:py|ts|js|md|yaml|yml|json|html|css))\b").unwrap()
    })
}

fn path_re() -> &'static Regex {
    PATH_RE.get_or_init(|| Regex::new(r"\b([a-zA-Z0-9_.-]+(?:/[a-zA-Z0-9_.-]+)+/?)\b").unwrap())
}

/// Extensions implied by language names or literal extension tokens.
/// At most one entry per extension, in [`EXTENSION_KEYWORDS`] order.
pub fn detect_extensions(prompt: &str) -> Vec<String> {
    let lower = prompt.to_lowercase();
    EXTENSION_KEYWORDS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(ext, _)| (*ext).to_string())
        .collect()
}

/// Filenames with a known extension, distinct, in order of first appearance.
pub fn detect_filenames(prompt: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for cap in filename_re().captures_iter(prompt) {
        let name = &cap[1];
        if !found.iter().any(|f| f == name) {
            found.push(name.to_string());
        }
    }
    found
}

/// Slash-separated references whose first segment contains a letter,
/// normalized to end with `/`. Distinct, in order of first appearance.
pub fn detect_paths(prompt: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for cap in path_re().captures_iter(prompt) {
        let raw = &cap[1];
        let first = raw.split('/').next().unwrap_or("");
        if !first.chars().any(char::is_alphabetic) {
            continue;
        }
        let path = if raw.ends_with('/') {
            raw.to_string()
        } else {
            format!("{raw}/")
        };
        if !found.contains(&path) {
            found.push(path);
        }
    }
    found
}

/// Extensions, then filenames, then paths. Passes are independent: a filename
/// may also show up inside a path reference.
pub fn detect_file_signals(prompt: &str) -> Vec<String> {
    let mut signals = detect_extensions(prompt);
    signals.extend(detect_filenames(prompt));
    signals.extend(detect_paths(prompt));
    signals
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filenames_pass_finds_exactly_the_named_files() {
        let prompt = "Edit the config.yaml file and update hooks.json";
        assert_eq!(detect_filenames(prompt), vec!["config.yaml", "hooks.json"]);

        let all = detect_file_signals(prompt);
        assert!(all.contains(&"config.yaml".to_string()));
        assert!(all.contains(&"hooks.json".to_string()));
    }

    #[test]
    fn filenames_are_deduplicated_in_discovery_order() {
        let prompt = "compare b.py with a.py, then b.py again";
        assert_eq!(detect_filenames(prompt), vec!["b.py", "a.py"]);
    }

    #[test]
    fn extension_keywords_follow_declaration_order() {
        let exts = detect_extensions("Write some CSS and Python");
        assert_eq!(exts, vec![".py", ".css"]);
    }

    #[test]
    fn yml_maps_to_yaml() {
        assert_eq!(detect_extensions("open ci.yml"), vec![".yaml"]);
    }

    #[test]
    fn extension_emitted_once() {
        assert_eq!(detect_extensions("python python .py"), vec![".py"]);
    }

    #[test]
    fn tsx_is_not_a_filename_but_implies_ts() {
        let prompt = "Update the component.tsx file";
        assert!(detect_filenames(prompt).is_empty());
        assert!(detect_extensions(prompt).contains(&".ts".to_string()));
    }

    #[test]
    fn paths_get_trailing_slash() {
        assert_eq!(detect_paths("look in src/components please"), vec!["src/components/"]);
    }

    #[test]
    fn paths_need_a_letter_in_first_segment() {
        assert!(detect_paths("ratio 1/2 and 3/4").is_empty());
    }

    #[test]
    fn path_and_filename_passes_are_independent() {
        let signals = detect_file_signals("fix src/app.ts");
        assert_eq!(signals, vec![".ts", "app.ts", "src/app.ts/"]);
    }

    #[test]
    fn empty_prompt_has_no_signals() {
        assert!(detect_file_signals("").is_empty());
    }
}

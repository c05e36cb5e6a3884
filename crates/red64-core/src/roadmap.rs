use crate::error::{Red64Error, Result};
use crate::paths;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

static UNCHECKED_RE: OnceLock<Regex> = OnceLock::new();
static NUMBER_RE: OnceLock<Regex> = OnceLock::new();
static TITLE_RE: OnceLock<Regex> = OnceLock::new();
static TRAILING_NOTE_RE: OnceLock<Regex> = OnceLock::new();
static TRAILING_EFFORT_RE: OnceLock<Regex> = OnceLock::new();
static EFFORT_RE: OnceLock<Regex> = OnceLock::new();
static MILESTONE_PREFIX_RE: OnceLock<Regex> = OnceLock::new();

fn unchecked_re() -> &'static Regex {
    UNCHECKED_RE.get_or_init(|| Regex::new(r"^\d+\.\s*\[\s*\]").unwrap())
}

fn number_re() -> &'static Regex {
    NUMBER_RE.get_or_init(|| Regex::new(r"^(\d+)\.\s*\[").unwrap())
}

fn title_re() -> &'static Regex {
    TITLE_RE.get_or_init(|| Regex::new(r"^\d+\.\s*\[\s*[xX]?\s*\]\s*(.+)").unwrap())
}

fn trailing_note_re() -> &'static Regex {
    TRAILING_NOTE_RE.get_or_init(|| Regex::new(r"\s*--\s*.*$").unwrap())
}

fn trailing_effort_re() -> &'static Regex {
    TRAILING_EFFORT_RE.get_or_init(|| Regex::new(r"\s*`(XS|S|M|L|XL)`\s*$").unwrap())
}

fn effort_re() -> &'static Regex {
    EFFORT_RE.get_or_init(|| Regex::new(r"`(XS|S|M|L|XL)`").unwrap())
}

fn milestone_prefix_re() -> &'static Regex {
    MILESTONE_PREFIX_RE.get_or_init(|| Regex::new(r"^Milestone\s+\d+:\s*").unwrap())
}

// ---------------------------------------------------------------------------
// CurrentItem
// ---------------------------------------------------------------------------

/// The first unchecked roadmap entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentItem {
    pub item_number: u32,
    pub item_title: String,
    /// `XS`, `S`, `M`, `L`, `XL`, or empty.
    pub effort_estimate: String,
    /// Empty when the item sits above every `## ` heading.
    pub parent_milestone: String,
}

pub trait RoadmapProvider {
    fn current_item(&self) -> Result<Option<CurrentItem>>;
}

/// Reads `.red64/product/roadmap.md` under a project root.
#[derive(Debug, Clone)]
pub struct FsRoadmapProvider {
    root: PathBuf,
}

impl FsRoadmapProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self) -> PathBuf {
        paths::roadmap_path(&self.root)
    }
}

impl RoadmapProvider for FsRoadmapProvider {
    fn current_item(&self) -> Result<Option<CurrentItem>> {
        load_roadmap(&self.path())
    }
}

pub fn load_roadmap(path: &Path) -> Result<Option<CurrentItem>> {
    if !path.is_file() {
        return Ok(None);
    }
    parse_roadmap(&std::fs::read_to_string(path)?)
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Find the first `N. [ ]` line. `Ok(None)` when every item is checked or
/// the document is blank.
pub fn parse_roadmap(content: &str) -> Result<Option<CurrentItem>> {
    let lines: Vec<&str> = content.lines().collect();
    for (idx, raw) in lines.iter().enumerate() {
        let line = raw.trim();
        if !unchecked_re().is_match(line) {
            continue;
        }
        let item_number = parse_item_number(line);
        let item_title = parse_item_title(line);
        if item_number == 0 || item_title.is_empty() {
            return Err(Red64Error::RoadmapMalformed(line.to_string()));
        }
        return Ok(Some(CurrentItem {
            item_number,
            item_title,
            effort_estimate: parse_effort(line),
            parent_milestone: milestone_before(&lines[..idx]),
        }));
    }
    Ok(None)
}

fn parse_item_number(line: &str) -> u32 {
    number_re()
        .captures(line)
        .and_then(|c| c[1].parse().ok())
        .unwrap_or(0)
}

/// Title without the checkbox, any ` -- note` tail, or a trailing effort tag.
fn parse_item_title(line: &str) -> String {
    let Some(c) = title_re().captures(line) else {
        return String::new();
    };
    let title = c[1].trim();
    let title = trailing_note_re().replace(title, "");
    let title = trailing_effort_re().replace(&title, "");
    title.trim().to_string()
}

fn parse_effort(line: &str) -> String {
    effort_re()
        .captures(line)
        .map(|c| c[1].to_string())
        .unwrap_or_default()
}

/// Last `## ` heading above the item, with any `Milestone N:` prefix removed.
fn milestone_before(lines: &[&str]) -> String {
    lines
        .iter()
        .rev()
        .find_map(|l| l.strip_prefix("## "))
        .map(|h| milestone_prefix_re().replace(h.trim(), "").into_owned())
        .unwrap_or_default()
}

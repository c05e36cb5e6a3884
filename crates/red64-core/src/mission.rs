use crate::error::Result;
use crate::markdown;
use crate::paths;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub const MAX_KEY_FEATURES: usize = 10;
const FEATURE_CHARS: usize = 100;
const FALLBACK_SENTENCE_CHARS: usize = 200;

static SENTENCE_RE: OnceLock<Regex> = OnceLock::new();
static BOLD_RE: OnceLock<Regex> = OnceLock::new();
static FEATURE_COLON_INSIDE_RE: OnceLock<Regex> = OnceLock::new();
static FEATURE_COLON_OUTSIDE_RE: OnceLock<Regex> = OnceLock::new();

fn sentence_re() -> &'static Regex {
    SENTENCE_RE.get_or_init(|| Regex::new(r"^[^.!?]*[.!?]").unwrap())
}

fn bold_re() -> &'static Regex {
    BOLD_RE.get_or_init(|| Regex::new(r"\*\*([^*]+)\*\*").unwrap())
}

fn feature_colon_inside_re() -> &'static Regex {
    FEATURE_COLON_INSIDE_RE.get_or_init(|| Regex::new(r"^\*\*(.+?):\*\*\s*(.*)").unwrap())
}

fn feature_colon_outside_re() -> &'static Regex {
    FEATURE_COLON_OUTSIDE_RE.get_or_init(|| Regex::new(r"^\*\*([^*]+)\*\*:\s*(.*)").unwrap())
}

// ---------------------------------------------------------------------------
// MissionLite
// ---------------------------------------------------------------------------

/// Condensed product mission, small enough to inject on every prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionLite {
    pub pitch: String,
    pub problem: String,
    pub key_features: Vec<String>,
}

impl MissionLite {
    pub fn is_empty(&self) -> bool {
        self.pitch.is_empty() && self.problem.is_empty() && self.key_features.is_empty()
    }
}

pub trait MissionProvider {
    fn mission_summary(&self) -> Result<Option<MissionLite>>;
}

/// Reads `.red64/product/mission.md` under a project root.
#[derive(Debug, Clone)]
pub struct FsMissionProvider {
    root: PathBuf,
}

impl FsMissionProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self) -> PathBuf {
        paths::mission_path(&self.root)
    }
}

impl MissionProvider for FsMissionProvider {
    fn mission_summary(&self) -> Result<Option<MissionLite>> {
        load_mission(&self.path())
    }
}

/// Load and summarize the mission document at `path`, if present.
pub fn load_mission(path: &Path) -> Result<Option<MissionLite>> {
    if !path.is_file() {
        return Ok(None);
    }
    Ok(summarize_mission(&std::fs::read_to_string(path)?))
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// `None` for a blank document or one where nothing could be extracted.
pub fn summarize_mission(content: &str) -> Option<MissionLite> {
    if content.trim().is_empty() {
        return None;
    }
    let mission = MissionLite {
        pitch: extract_pitch(content),
        problem: extract_problem(content),
        key_features: extract_key_features(content),
    };
    (!mission.is_empty()).then_some(mission)
}

/// Text up to and including the first `.`, `!` or `?`. Without a terminator,
/// the first line that is not a heading or bullet, else the first 200 chars.
pub fn first_sentence(text: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        return String::new();
    }
    if let Some(m) = sentence_re().find(text) {
        return m.as_str().trim().to_string();
    }
    if let Some(line) = text
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with('#') && !l.starts_with('-'))
    {
        return line.to_string();
    }
    text.chars().take(FALLBACK_SENTENCE_CHARS).collect()
}

/// Non-empty trimmed lines of a section, minus `###` headings and one-line
/// HTML comments.
fn section_lines(content: &str, name: &str) -> Vec<String> {
    markdown::named_section(content, name)
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .filter(|l| !l.starts_with("###"))
        .filter(|l| !(l.starts_with("<!--") && l.ends_with("-->")))
        .map(str::to_string)
        .collect()
}

fn extract_pitch(content: &str) -> String {
    for line in section_lines(content, "Pitch") {
        if line.starts_with("**Tagline") {
            continue;
        }
        let sentence = first_sentence(&line);
        if !sentence.is_empty() {
            return bold_re().replace_all(&sentence, "$1").into_owned();
        }
    }
    String::new()
}

fn extract_problem(content: &str) -> String {
    for line in section_lines(content, "Problem") {
        if line.starts_with("**") && line.ends_with("**") {
            continue;
        }
        if line.starts_with('-') {
            continue;
        }
        let sentence = first_sentence(&line);
        if !sentence.is_empty() {
            return sentence;
        }
    }
    String::new()
}

fn extract_key_features(content: &str) -> Vec<String> {
    section_lines(content, "Key Features")
        .iter()
        .filter_map(|line| line.strip_prefix("- "))
        .map(|text| feature_name(text.trim()))
        .take(MAX_KEY_FEATURES)
        .collect()
}

/// `**Name:** desc` and `**Name**: desc` give `Name`; anything else is
/// clipped to 100 chars.
fn feature_name(text: &str) -> String {
    if let Some(c) = feature_colon_inside_re().captures(text) {
        return c[1].trim().to_string();
    }
    if text.starts_with("**") {
        if let Some(c) = feature_colon_outside_re().captures(text) {
            return c[1].trim().to_string();
        }
    }
    text.chars().take(FEATURE_CHARS).collect()
}

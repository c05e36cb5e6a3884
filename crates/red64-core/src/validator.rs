//! Pre-write lint of proposed file content against enabled standards.
//!
//! This is a best-effort substring and regex check, not a parser. Every rule
//! is gated on the standard's own DON'T text mentioning the concept, so a
//! standard that never forbids `var` never blocks on it.

use crate::error::Result;
use crate::standards::{DontPatternCache, StandardsMatcher, StandardsStore};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Tools whose payload carries file content worth checking.
pub const CHECKED_TOOLS: &[&str] = &["Edit", "Write"];

const SUGGESTION_PATTERN_CHARS: usize = 100;

// ---------------------------------------------------------------------------
// Verdict
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Allow,
    Block,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub decision: Decision,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Verdict {
    pub fn allow() -> Self {
        Self {
            decision: Decision::Allow,
            reason: None,
            suggestion: None,
        }
    }

    pub fn block(reason: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self {
            decision: Decision::Block,
            reason: Some(reason.into()),
            suggestion: Some(suggestion.into()),
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.decision == Decision::Block
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Substring found in lower-cased content, gated on the same substring
/// (spaces removed) appearing in a DON'T pattern.
pub struct FixedCheck {
    pub needle: &'static str,
    pub violation: &'static str,
    pub suggestion: &'static str,
}

pub const FIXED_CHECKS: &[FixedCheck] = &[
    FixedCheck {
        needle: ": any",
        violation: "any type usage",
        suggestion: "Use explicit types instead of 'any'.",
    },
    FixedCheck {
        needle: ": any =",
        violation: "any type usage",
        suggestion: "Use explicit types instead of 'any'.",
    },
    FixedCheck {
        needle: ": any;",
        violation: "any type usage",
        suggestion: "Use explicit types instead of 'any'.",
    },
    FixedCheck {
        needle: "var ",
        violation: "var keyword usage",
        suggestion: "Use 'const' or 'let' instead of 'var'.",
    },
    FixedCheck {
        needle: "eval(",
        violation: "eval() usage",
        suggestion: "Avoid using eval() for security reasons.",
    },
];

/// Regex run on the raw content, gated on `name` appearing in a DON'T pattern.
pub struct Heuristic {
    pub name: &'static str,
    regex: fn() -> &'static Regex,
}

static SINGLE_LETTER_RE: OnceLock<Regex> = OnceLock::new();
static HUNGARIAN_RE: OnceLock<Regex> = OnceLock::new();

fn single_letter_re() -> &'static Regex {
    SINGLE_LETTER_RE.get_or_init(|| Regex::new(r"\bconst [a-z] =").unwrap())
}

fn hungarian_re() -> &'static Regex {
    HUNGARIAN_RE.get_or_init(|| Regex::new(r"\b(str|arr|obj|int|bool)[A-Z]").unwrap())
}

pub const HEURISTICS: &[Heuristic] = &[
    Heuristic {
        name: "single-letter variable",
        regex: single_letter_re,
    },
    Heuristic {
        name: "hungarian notation",
        regex: hungarian_re,
    },
];

fn squash(s: &str) -> String {
    s.to_lowercase().replace(' ', "")
}

fn check_fixed(content: &str, patterns: &[String], standard: &str) -> Option<Verdict> {
    let lower = content.to_lowercase();
    let squashed: Vec<String> = patterns.iter().map(|p| squash(p)).collect();
    FIXED_CHECKS
        .iter()
        .filter(|c| lower.contains(c.needle))
        .find(|c| {
            let needle = c.needle.replace(' ', "");
            squashed.iter().any(|p| p.contains(&needle))
        })
        .map(|c| {
            Verdict::block(
                format!("Violates {standard} standard: {}", c.violation),
                c.suggestion,
            )
        })
}

fn check_heuristics(content: &str, patterns: &[String], standard: &str) -> Option<Verdict> {
    let hit = patterns.iter().find(|pattern| {
        let lower = pattern.to_lowercase();
        HEURISTICS
            .iter()
            .any(|h| lower.contains(h.name) && (h.regex)().is_match(content))
    })?;
    let mut excerpt: String = hit.chars().take(SUGGESTION_PATTERN_CHARS).collect();
    if hit.chars().count() > SUGGESTION_PATTERN_CHARS {
        excerpt.push_str("...");
    }
    Some(Verdict::block(
        format!("Violates {standard} standard: matches DON'T pattern"),
        format!("Review the DON'T pattern: {excerpt}"),
    ))
}

/// Layer (a) then layer (b) for one standard's DON'T patterns.
pub fn check_content(content: &str, patterns: &[String], standard: &str) -> Option<Verdict> {
    check_fixed(content, patterns, standard).or_else(|| check_heuristics(content, patterns, standard))
}

// ---------------------------------------------------------------------------
// EditValidator
// ---------------------------------------------------------------------------

/// One proposed file change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditRequest {
    pub tool_name: String,
    pub file_path: String,
    pub content: String,
}

pub struct EditValidator<S> {
    matcher: StandardsMatcher<S>,
    cache: DontPatternCache,
}

impl<S: StandardsStore> EditValidator<S> {
    pub fn new(store: S) -> Self {
        Self {
            matcher: StandardsMatcher::new(store),
            cache: DontPatternCache::new(),
        }
    }

    pub fn cache(&self) -> &DontPatternCache {
        &self.cache
    }

    /// First violation across applicable standards in `enabled` order, else allow.
    pub fn validate(&mut self, request: &EditRequest, enabled: &[String]) -> Result<Verdict> {
        if !CHECKED_TOOLS.contains(&request.tool_name.as_str()) {
            return Ok(Verdict::allow());
        }
        if request.file_path.is_empty() || request.content.is_empty() || enabled.is_empty() {
            return Ok(Verdict::allow());
        }

        let applicable = self.matcher.applicable_to_file(&request.file_path, enabled)?;
        for identifier in &applicable {
            let patterns = self.cache.patterns(self.matcher.store(), identifier)?;
            if patterns.is_empty() {
                continue;
            }
            if let Some(verdict) = check_content(&request.content, patterns, identifier) {
                tracing::info!(
                    standard = %identifier,
                    file = %request.file_path,
                    reason = verdict.reason.as_deref().unwrap_or(""),
                    "blocking edit"
                );
                return Ok(verdict);
            }
        }
        Ok(Verdict::allow())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// TaskType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskType {
    Shape,
    WriteSpec,
    Implement,
    Review,
    Test,
    Debug,
    Refactor,
    #[default]
    Unknown,
}

impl TaskType {
    pub fn all() -> &'static [TaskType] {
        &[
            TaskType::Shape,
            TaskType::WriteSpec,
            TaskType::Implement,
            TaskType::Review,
            TaskType::Test,
            TaskType::Debug,
            TaskType::Refactor,
            TaskType::Unknown,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskType::Shape => "shape",
            TaskType::WriteSpec => "write-spec",
            TaskType::Implement => "implement",
            TaskType::Review => "review",
            TaskType::Test => "test",
            TaskType::Debug => "debug",
            TaskType::Refactor => "refactor",
            TaskType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskType {
    type Err = crate::error::Red64Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskType::all()
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| crate::error::Red64Error::InvalidTaskType(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// ContextItem
// ---------------------------------------------------------------------------

/// A named block of text competing for space in the injected context.
///
/// Lower `priority` is more important. Fractional values slot items between
/// integral tiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextItem {
    pub name: String,
    pub content: String,
    pub priority: f64,
}

impl ContextItem {
    pub fn new(name: impl Into<String>, content: impl Into<String>, priority: f64) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            priority,
        }
    }

    /// Same name and priority, different content. Items are never edited in place.
    pub fn with_content(&self, content: String) -> Self {
        Self {
            name: self.name.clone(),
            content,
            priority: self.priority,
        }
    }
}

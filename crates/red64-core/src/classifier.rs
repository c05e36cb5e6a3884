use crate::types::TaskType;

// ---------------------------------------------------------------------------
// TaskRule
// ---------------------------------------------------------------------------

/// One task category and the keywords that select it.
#[derive(Debug, Clone, Copy)]
pub struct TaskRule {
    pub task: TaskType,
    pub keywords: &'static [&'static str],
}

// ---------------------------------------------------------------------------
// Default rules (priority-ordered)
// ---------------------------------------------------------------------------

/// Scan order is the tie-break: a prompt that says both "fix" and "build" is
/// a debug task.
pub fn default_task_rules() -> Vec<TaskRule> {
    vec![
        TaskRule {
            task: TaskType::Debug,
            keywords: &[
                "debug", "fix", "error", "bug", "issue", "problem", "broken", "failing",
            ],
        },
        TaskRule {
            task: TaskType::Test,
            keywords: &[
                "test",
                "verify",
                "validate",
                "assert",
                "unit test",
                "integration test",
            ],
        },
        TaskRule {
            task: TaskType::Review,
            keywords: &[
                "review", "check", "audit", "inspect", "examine", "analyze", "look at",
            ],
        },
        TaskRule {
            task: TaskType::Shape,
            keywords: &[
                "requirements",
                "scope",
                "define",
                "plan",
                "outline",
                "architect",
                "design",
            ],
        },
        TaskRule {
            task: TaskType::WriteSpec,
            keywords: &[
                "spec",
                "specification",
                "document",
                "write spec",
                "write-spec",
                "writespec",
                "prd",
            ],
        },
        TaskRule {
            task: TaskType::Refactor,
            keywords: &[
                "refactor",
                "restructure",
                "reorganize",
                "clean up",
                "cleanup",
                "improve",
                "optimize",
            ],
        },
        TaskRule {
            task: TaskType::Implement,
            keywords: &[
                "implement", "build", "create", "code", "develop", "make", "add", "write",
            ],
        },
    ]
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

pub struct Classifier {
    rules: Vec<TaskRule>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(default_task_rules())
    }
}

impl Classifier {
    pub fn new(rules: Vec<TaskRule>) -> Self {
        Self { rules }
    }

    /// Case-insensitive, unanchored substring match; first matching rule wins.
    /// Substrings inside longer words count ("prefix" hits "fix").
    pub fn classify(&self, prompt: &str) -> TaskType {
        let lower = prompt.to_lowercase();
        for rule in &self.rules {
            if rule.keywords.iter().any(|k| lower.contains(k)) {
                return rule.task;
            }
        }
        TaskType::Unknown
    }
}

/// Classify with the default rule table.
pub fn detect_task_type(prompt: &str) -> TaskType {
    Classifier::default().classify(prompt)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_beats_test() {
        assert_eq!(detect_task_type("Debug this failing test"), TaskType::Debug);
    }

    #[test]
    fn write_spec_detected() {
        assert_eq!(detect_task_type("Write a spec for X"), TaskType::WriteSpec);
    }

    #[test]
    fn unmatched_is_unknown() {
        assert_eq!(detect_task_type("hello there"), TaskType::Unknown);
        assert_eq!(detect_task_type(""), TaskType::Unknown);
    }

    #[test]
    fn debug_beats_implement() {
        assert_eq!(detect_task_type("Fix the login and build the form"), TaskType::Debug);
    }

    #[test]
    fn each_category_reachable() {
        assert_eq!(detect_task_type("Please review my PR"), TaskType::Review);
        assert_eq!(detect_task_type("Verify the output"), TaskType::Test);
        assert_eq!(detect_task_type("Outline the requirements"), TaskType::Shape);
        assert_eq!(detect_task_type("Refactor the parser"), TaskType::Refactor);
        assert_eq!(detect_task_type("Implement login"), TaskType::Implement);
    }

    #[test]
    fn case_insensitive() {
        assert_eq!(detect_task_type("REFACTOR NOW"), TaskType::Refactor);
    }

    #[test]
    fn substring_match_is_unanchored() {
        // "prefix" contains "fix"
        assert_eq!(detect_task_type("rename the prefix"), TaskType::Debug);
    }

    #[test]
    fn custom_rules_respected() {
        let c = Classifier::new(vec![TaskRule {
            task: TaskType::Review,
            keywords: &["lgtm"],
        }]);
        assert_eq!(c.classify("LGTM, ship it"), TaskType::Review);
        assert_eq!(c.classify("fix it"), TaskType::Unknown);
    }
}

//! The context pipeline behind the prompt-submit hook.
//!
//! `CONFIG_CHECK` is the only stage that can fail the run. Every later stage
//! is guarded: an error or a panic is logged and replaced by that stage's
//! default, so a broken standards package or a malformed roadmap never
//! blocks a prompt.

use crate::budget::{self, Allocation};
use crate::classifier::Classifier;
use crate::config::Config;
use crate::detector;
use crate::error::{Red64Error, Result};
use crate::mission::{FsMissionProvider, MissionProvider};
use crate::product;
use crate::roadmap::{FsRoadmapProvider, RoadmapProvider};
use crate::standards::{FsStandardsStore, StandardsMatch, StandardsMatcher, StandardsStore};
use crate::types::{ContextItem, TaskType};
use serde::{Deserialize, Serialize};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

pub const CONTEXT_HEADER: &str = "## Red64 Context";
pub const STANDARDS_ITEM_PREFIX: &str = "standards:";

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ConfigCheck,
    Classify,
    FileDetect,
    StandardsMatch,
    BudgetAllocate,
    ProductContext,
    Format,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::ConfigCheck => "config_check",
            Stage::Classify => "classify",
            Stage::FileDetect => "file_detect",
            Stage::StandardsMatch => "standards_match",
            Stage::BudgetAllocate => "budget_allocate",
            Stage::ProductContext => "product_context",
            Stage::Format => "format",
        }
    }
}

/// Run one stage, substituting `fallback` if it errors or panics.
fn guarded<T>(stage: Stage, fallback: T, f: impl FnOnce() -> Result<T>) -> T {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => {
            tracing::debug!(stage = stage.as_str(), "stage complete");
            value
        }
        Ok(Err(e)) => {
            tracing::warn!(stage = stage.as_str(), error = %e, "stage failed, using default");
            fallback
        }
        Err(_) => {
            let e = Red64Error::StagePanicked {
                stage: stage.as_str(),
            };
            tracing::warn!(stage = stage.as_str(), error = %e, "stage failed, using default");
            fallback
        }
    }
}

// ---------------------------------------------------------------------------
// AssembledContext
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssembledContext {
    pub task_type: TaskType,
    pub file_types: Vec<String>,
    /// Identifiers whose sections made it into the output, in precedence order.
    pub standards: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precedence_note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusion_summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_context: Option<String>,
    /// Rendered markdown; empty when the context loader is disabled.
    pub additional_context: String,
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

pub fn standards_item_name(identifier: &str) -> String {
    format!("{STANDARDS_ITEM_PREFIX}{identifier}")
}

/// One context item per matched standard, priced inside the configured tier:
/// `base + i / (n + 1)` keeps precedence order and never reaches `base + 1`.
pub fn standards_items(matched: &StandardsMatch, base_priority: f64) -> Vec<ContextItem> {
    let n = matched.standards.len() as f64;
    matched
        .standards
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let content = s
                .rule_documents
                .iter()
                .map(|d| d.content.as_str())
                .collect::<Vec<_>>()
                .join("\n\n");
            ContextItem::new(
                standards_item_name(&s.identifier),
                content,
                base_priority + i as f64 / (n + 1.0),
            )
        })
        .collect()
}

/// Note line (if any) followed by one `## Standards: <id>` section per
/// surviving standard. `None` when no section survived.
pub fn render_standards_block(
    matched: &StandardsMatch,
    allocation: &Allocation,
) -> Option<(String, Vec<String>)> {
    let mut rendered = Vec::new();
    let mut sections = Vec::new();
    for s in &matched.standards {
        if let Some(item) = allocation.selected_item(&standards_item_name(&s.identifier)) {
            sections.push(format!("## Standards: {}\n\n{}", s.identifier, item.content));
            rendered.push(s.identifier.clone());
        }
    }
    if sections.is_empty() {
        return None;
    }
    let mut blocks = Vec::new();
    if let Some(note) = &matched.precedence_note {
        blocks.push(format!("*Note: {note}*"));
    }
    blocks.extend(sections);
    Some((blocks.join("\n\n"), rendered))
}

pub fn format_context(
    task_type: TaskType,
    file_types: &[String],
    exclusion_summary: Option<&str>,
    standards_block: Option<&str>,
    product_context: Option<&str>,
) -> String {
    let mut lines = vec![
        CONTEXT_HEADER.to_string(),
        String::new(),
        format!("**Detected Task Type:** {task_type}"),
    ];
    if !file_types.is_empty() {
        lines.push(format!("**Detected File Types:** {}", file_types.join(", ")));
    }
    for block in [
        exclusion_summary.map(|s| format!("*{s}*")),
        standards_block.map(str::to_string),
        product_context.map(str::to_string),
    ]
    .into_iter()
    .flatten()
    {
        lines.push(String::new());
        lines.push(block);
    }
    lines.join("\n")
}

// ---------------------------------------------------------------------------
// ContextAssembler
// ---------------------------------------------------------------------------

pub struct ContextAssembler<S> {
    classifier: Classifier,
    matcher: StandardsMatcher<S>,
    mission: Box<dyn MissionProvider>,
    roadmap: Box<dyn RoadmapProvider>,
}

impl ContextAssembler<FsStandardsStore> {
    /// Filesystem-backed assembler for the project at `root`.
    pub fn for_project(root: &Path, plugins_dir: &Path) -> Self {
        Self::new(
            FsStandardsStore::new(plugins_dir),
            Box::new(FsMissionProvider::new(root)),
            Box::new(FsRoadmapProvider::new(root)),
        )
    }
}

impl<S: StandardsStore> ContextAssembler<S> {
    pub fn new(
        store: S,
        mission: Box<dyn MissionProvider>,
        roadmap: Box<dyn RoadmapProvider>,
    ) -> Self {
        Self {
            classifier: Classifier::default(),
            matcher: StandardsMatcher::new(store),
            mission,
            roadmap,
        }
    }

    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Run the pipeline for one prompt. Only an unavailable config is an error.
    pub fn assemble(&self, prompt: &str, config: Result<Config>) -> Result<AssembledContext> {
        let config = config?;
        tracing::debug!(stage = Stage::ConfigCheck.as_str(), "stage complete");

        if !config.context_loader.enabled {
            tracing::debug!("context loader disabled");
            return Ok(AssembledContext::default());
        }

        let task_type = if config.context_loader.task_detection {
            guarded(Stage::Classify, TaskType::Unknown, || {
                Ok(self.classifier.classify(prompt))
            })
        } else {
            TaskType::Unknown
        };

        let file_types = if config.context_loader.file_type_detection {
            guarded(Stage::FileDetect, Vec::new(), || {
                Ok(detector::detect_file_signals(prompt))
            })
        } else {
            Vec::new()
        };

        let matched = guarded(Stage::StandardsMatch, StandardsMatch::default(), || {
            self.matcher.find_matches(&file_types, &config.standards.enabled)
        });

        let items = standards_items(&matched, config.standards.token_budget_priority);
        let allocation = guarded(Stage::BudgetAllocate, Allocation::unfiltered(&items), || {
            Ok(budget::allocate(
                &items,
                config.token_budget.max_tokens as usize,
                config.token_budget.overflow_behavior,
            ))
        });

        let product_context = guarded(Stage::ProductContext, None, || {
            Ok(product::gather_product_context(
                self.mission.as_ref(),
                self.roadmap.as_ref(),
            ))
        });

        let (standards_block, standards) = match render_standards_block(&matched, &allocation) {
            Some((block, ids)) => (Some(block), ids),
            None => (None, Vec::new()),
        };

        let additional_context = format_context(
            task_type,
            &file_types,
            allocation.exclusion_summary.as_deref(),
            standards_block.as_deref(),
            product_context.as_deref(),
        );
        tracing::debug!(stage = Stage::Format.as_str(), chars = additional_context.len(), "stage complete");

        Ok(AssembledContext {
            task_type,
            file_types,
            standards,
            precedence_note: matched.precedence_note,
            exclusion_summary: allocation.exclusion_summary,
            product_context,
            additional_context,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

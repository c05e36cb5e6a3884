//! Token-budget allocation for context items.
//!
//! Token counts here are an estimate, not a tokenizer: every character is a
//! quarter token ([`CHARS_PER_TOKEN`]). The estimate is the single source of
//! truth for all budget decisions in red64. It deliberately over- or
//! under-counts real model tokens; that is accepted, not a bug.

use crate::config::OverflowBehavior;
use crate::types::ContextItem;
use serde::{Deserialize, Serialize};

pub const CHARS_PER_TOKEN: usize = 4;
pub const ELLIPSIS: &str = "...";
/// Truncated items at or below this many tokens are not worth keeping.
pub const MIN_TRUNCATED_TOKENS: usize = 10;

/// Estimated tokens: characters (not bytes) divided by four, rounded down.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / CHARS_PER_TOKEN
}

pub fn total_tokens(items: &[ContextItem]) -> usize {
    items.iter().map(|i| estimate_tokens(&i.content)).sum()
}

/// Cut `content` to `max_tokens * 4` characters and mark the cut with `...`.
/// Content that already fits is returned unchanged.
pub fn truncate_content(content: &str, max_tokens: usize) -> String {
    let max_chars = max_tokens * CHARS_PER_TOKEN;
    match content.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}{ELLIPSIS}", &content[..byte_idx]),
        None => content.to_string(),
    }
}

/// Stable sort, lowest priority value first; equal priorities keep input order.
pub fn sort_by_priority(items: &[ContextItem]) -> Vec<ContextItem> {
    let mut sorted = items.to_vec();
    sorted.sort_by(|a, b| a.priority.total_cmp(&b.priority));
    sorted
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub selected: Vec<ContextItem>,
    /// Names of items dropped with exclusion enabled, in priority order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excluded: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusion_summary: Option<String>,
}

impl Allocation {
    /// Every item, sorted, nothing filtered.
    pub fn unfiltered(items: &[ContextItem]) -> Self {
        Self {
            selected: sort_by_priority(items),
            excluded: Vec::new(),
            exclusion_summary: None,
        }
    }

    pub fn is_selected(&self, name: &str) -> bool {
        self.selected.iter().any(|i| i.name == name)
    }

    pub fn selected_item(&self, name: &str) -> Option<&ContextItem> {
        self.selected.iter().find(|i| i.name == name)
    }
}

pub fn exclusion_summary(excluded: &[String]) -> String {
    format!(
        "Excluded {} item(s) due to budget: {}",
        excluded.len(),
        excluded.join(", ")
    )
}

/// Fit `items` into `max_tokens`.
///
/// Items are taken in priority order. One that does not fit is truncated to
/// the remaining budget when `truncate` is on and the result keeps more than
/// [`MIN_TRUNCATED_TOKENS`]; otherwise it is dropped and named in the summary
/// when `exclude` is on. With `exclude` off the item is force-truncated into
/// whatever budget is left, ignoring the [`MIN_TRUNCATED_TOKENS`] floor.
pub fn allocate(items: &[ContextItem], max_tokens: usize, behavior: OverflowBehavior) -> Allocation {
    let sorted = sort_by_priority(items);

    if total_tokens(&sorted) <= max_tokens {
        return Allocation {
            selected: sorted,
            ..Allocation::default()
        };
    }

    let mut selected = Vec::new();
    let mut excluded = Vec::new();
    let mut used = 0usize;

    for item in &sorted {
        let tokens = estimate_tokens(&item.content);
        if used + tokens <= max_tokens {
            selected.push(item.clone());
            used += tokens;
            continue;
        }

        let remaining = max_tokens.saturating_sub(used);
        if behavior.truncate && remaining > 0 {
            let cut = truncate_content(&item.content, remaining);
            let cut_tokens = estimate_tokens(&cut);
            if cut_tokens > MIN_TRUNCATED_TOKENS {
                tracing::debug!(item = %item.name, tokens, kept = cut_tokens, "truncated context item");
                selected.push(item.with_content(cut));
                used += cut_tokens;
                continue;
            }
        }

        if behavior.exclude {
            tracing::debug!(item = %item.name, tokens, "excluded context item");
            excluded.push(item.name.clone());
        } else if remaining > 0 {
            let cut = truncate_content(&item.content, remaining);
            used += estimate_tokens(&cut);
            selected.push(item.with_content(cut));
        }
    }

    let exclusion_summary = (!excluded.is_empty() && behavior.summary)
        .then(|| exclusion_summary(&excluded));

    Allocation {
        selected,
        excluded,
        exclusion_summary,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, chars: usize, priority: f64) -> ContextItem {
        ContextItem::new(name, "x".repeat(chars), priority)
    }

    fn all_on() -> OverflowBehavior {
        OverflowBehavior::default()
    }

    #[test]
    fn estimate_is_floor_of_quarter_chars() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abc"), 0);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens(&"a".repeat(803)), 200);
        // chars, not bytes
        assert_eq!(estimate_tokens("éééé"), 1);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_content("ééééé", 1), "éééé...");
        assert_eq!(truncate_content("short", 10), "short");
    }

    #[test]
    fn equal_priorities_keep_input_order() {
        let items = vec![item("b", 40, 1.0), item("a", 40, 1.0), item("c", 40, 0.5)];
        let a = allocate(&items, 100, all_on());
        let names: Vec<_> = a.selected.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["c", "b", "a"]);

        let sorted: Vec<_> = sort_by_priority(&items).into_iter().map(|i| i.name).collect();
        assert_eq!(sorted, vec!["c", "b", "a"]);
    }

    #[test]
    fn empty_input_is_empty_output() {
        let a = allocate(&[], 100, all_on());
        assert!(a.selected.is_empty());
        assert!(a.exclusion_summary.is_none());
    }

    #[test]
    fn everything_fits_is_returned_sorted_and_unchanged() {
        let items = vec![item("b", 40, 2.0), item("a", 40, 1.0)];
        let a = allocate(&items, 20, all_on());
        let names: Vec<_> = a.selected.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(a.selected[0].content.len(), 40);
        assert!(a.exclusion_summary.is_none());
    }

    #[test]
    fn two_large_items_with_budget_150() {
        let items = vec![item("first", 800, 1.0), item("second", 800, 2.0)];
        let a = allocate(&items, 150, all_on());

        assert_eq!(a.selected.len(), 1);
        assert_eq!(a.selected[0].name, "first");
        assert!(total_tokens(&a.selected) <= 150);
        assert!(a.selected[0].content.ends_with(ELLIPSIS));
        assert_eq!(a.excluded, vec!["second"]);
        let summary = a.exclusion_summary.unwrap();
        assert_eq!(summary, "Excluded 1 item(s) due to budget: second");
    }

    #[test]
    fn default_budget_caps_single_huge_item() {
        let items = vec![item("huge", 16_000, 1.0)];
        let a = allocate(&items, 3000, all_on());
        assert_eq!(a.selected.len(), 1);
        assert!(a.selected[0].content.chars().count() <= 12_003);
        assert!(estimate_tokens(&a.selected[0].content) <= 3000);
    }

    #[test]
    fn tiny_truncation_is_excluded_instead() {
        // 95 tokens used, 5 left: a 5-token cut is below the floor.
        let items = vec![item("big", 380, 1.0), item("next", 400, 2.0)];
        let a = allocate(&items, 100, all_on());
        assert_eq!(a.selected.len(), 1);
        assert_eq!(a.excluded, vec!["next"]);
    }

    #[test]
    fn summary_flag_off_hides_summary_but_still_excludes() {
        let behavior = OverflowBehavior {
            summary: false,
            ..all_on()
        };
        let items = vec![item("a", 400, 1.0), item("b", 400, 2.0)];
        let a = allocate(&items, 100, behavior);
        assert_eq!(a.excluded, vec!["b"]);
        assert!(a.exclusion_summary.is_none());
    }

    #[test]
    fn truncate_off_excludes_whole_items() {
        let behavior = OverflowBehavior {
            truncate: false,
            ..all_on()
        };
        let items = vec![item("a", 200, 1.0), item("b", 400, 2.0), item("c", 40, 3.0)];
        let a = allocate(&items, 100, behavior);
        let names: Vec<_> = a.selected.iter().map(|i| i.name.as_str()).collect();
        // c still fits after b is dropped
        assert_eq!(names, vec!["a", "c"]);
        assert_eq!(a.excluded, vec!["b"]);
    }

    #[test]
    fn exclude_off_forces_truncation_below_floor() {
        let behavior = OverflowBehavior {
            truncate: true,
            exclude: false,
            summary: true,
        };
        let items = vec![item("big", 380, 1.0), item("next", 400, 2.0)];
        let a = allocate(&items, 100, behavior);
        assert_eq!(a.selected.len(), 2);
        assert_eq!(a.selected[1].content, format!("{}...", "x".repeat(20)));
        assert_eq!(total_tokens(&a.selected), 100);
        assert!(a.excluded.is_empty());
        assert!(a.exclusion_summary.is_none());
    }

    #[test]
    fn exclude_off_with_no_budget_left_drops_silently() {
        let behavior = OverflowBehavior {
            truncate: false,
            exclude: false,
            summary: true,
        };
        let items = vec![item("a", 400, 1.0), item("b", 400, 2.0)];
        let a = allocate(&items, 100, behavior);
        assert_eq!(a.selected.len(), 1);
        assert!(a.excluded.is_empty());
        assert!(a.exclusion_summary.is_none());
    }

    #[test]
    fn fractional_priorities_interleave() {
        let items = vec![
            item("tier4", 4, 4.0),
            item("std-b", 4, 3.0 + 2.0 / 3.0),
            item("std-a", 4, 3.0 + 1.0 / 3.0),
            item("tier3", 4, 3.0),
        ];
        let a = allocate(&items, 100, all_on());
        let names: Vec<_> = a.selected.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["tier3", "std-a", "std-b", "tier4"]);
    }

    #[test]
    fn unfiltered_sorts_without_dropping() {
        let items = vec![item("b", 4000, 2.0), item("a", 4000, 1.0)];
        let a = Allocation::unfiltered(&items);
        assert_eq!(a.selected.len(), 2);
        assert_eq!(a.selected[0].name, "a");
        assert!(a.is_selected("b"));
        assert!(a.selected_item("zzz").is_none());
    }
}

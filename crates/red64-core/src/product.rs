//! Product context: a condensed mission plus the roadmap item in progress.

use crate::mission::{MissionLite, MissionProvider};
use crate::roadmap::{CurrentItem, RoadmapProvider};

pub const PRODUCT_HEADER: &str = "## Product Context";
/// Shown by the `product` command when neither document yields anything.
pub const NO_PRODUCT_CONTEXT: &str = "*No product context available. Run `/red64:plan-mission` and `/red64:plan-roadmap` to set up product planning.*";

fn mission_lines(mission: &MissionLite) -> Vec<String> {
    let mut lines = vec!["### Product Mission".to_string(), String::new()];
    if !mission.pitch.is_empty() {
        lines.push(format!("**Pitch:** {}", mission.pitch));
    }
    if !mission.problem.is_empty() {
        lines.push(format!("**Problem:** {}", mission.problem));
    }
    if !mission.key_features.is_empty() {
        lines.push(String::new());
        lines.push("**Key Features:**".to_string());
        lines.extend(mission.key_features.iter().map(|f| format!("- {f}")));
    }
    lines
}

fn roadmap_lines(item: &CurrentItem) -> Vec<String> {
    let mut lines = vec!["### Current Work Item".to_string(), String::new()];
    if !item.parent_milestone.is_empty() {
        lines.push(format!("**Milestone:** {}", item.parent_milestone));
    }
    if !item.item_title.is_empty() {
        let effort = if item.effort_estimate.is_empty() {
            String::new()
        } else {
            format!(" ({})", item.effort_estimate)
        };
        lines.push(format!("**Item {}:** {}{effort}", item.item_number, item.item_title));
    }
    lines
}

/// Render the product block, or `None` when there is nothing to say.
pub fn render_product_context(
    mission: Option<&MissionLite>,
    item: Option<&CurrentItem>,
) -> Option<String> {
    if mission.is_none() && item.is_none() {
        return None;
    }
    let mut lines = vec![PRODUCT_HEADER.to_string(), String::new()];
    if let Some(m) = mission {
        lines.extend(mission_lines(m));
        if item.is_some() {
            lines.push(String::new());
        }
    }
    if let Some(i) = item {
        lines.extend(roadmap_lines(i));
    }
    Some(lines.join("\n"))
}

/// Gather both halves of the product context. A provider error only drops
/// its own half.
pub fn gather_product_context(
    mission: &dyn MissionProvider,
    roadmap: &dyn RoadmapProvider,
) -> Option<String> {
    let mission = mission.mission_summary().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "mission summary unavailable");
        None
    });
    let item = roadmap.current_item().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "roadmap status unavailable");
        None
    });
    render_product_context(mission.as_ref(), item.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Red64Error, Result};

    struct FixedMission(Option<MissionLite>);
    impl MissionProvider for FixedMission {
        fn mission_summary(&self) -> Result<Option<MissionLite>> {
            Ok(self.0.clone())
        }
    }

    struct BrokenRoadmap;
    impl RoadmapProvider for BrokenRoadmap {
        fn current_item(&self) -> Result<Option<CurrentItem>> {
            Err(Red64Error::RoadmapMalformed("1. [ ]".into()))
        }
    }

    struct FixedRoadmap(Option<CurrentItem>);
    impl RoadmapProvider for FixedRoadmap {
        fn current_item(&self) -> Result<Option<CurrentItem>> {
            Ok(self.0.clone())
        }
    }

    fn mission() -> MissionLite {
        MissionLite {
            pitch: "A context engine.".into(),
            problem: "Agents forget rules.".into(),
            key_features: vec!["Budgeting".into(), "Standards".into()],
        }
    }

    fn item() -> CurrentItem {
        CurrentItem {
            item_number: 4,
            item_title: "Fourth task".into(),
            effort_estimate: "M".into(),
            parent_milestone: "Features".into(),
        }
    }

    #[test]
    fn full_block_layout() {
        let out = render_product_context(Some(&mission()), Some(&item())).unwrap();
        let expected = "## Product Context

### Product Mission

**Pitch:** A context engine.
**Problem:** Agents forget rules.

**Key Features:**
- Budgeting
- Standards

### Current Work Item

**Milestone:** Features
**Item 4:** Fourth task (M)";
        assert_eq!(out, expected);
    }

    #[test]
    fn roadmap_only_without_effort() {
        let mut i = item();
        i.effort_estimate.clear();
        i.parent_milestone.clear();
        let out = render_product_context(None, Some(&i)).unwrap();
        assert_eq!(
            out,
            "## Product Context\n\n### Current Work Item\n\n**Item 4:** Fourth task"
        );
    }

    #[test]
    fn nothing_available_is_none() {
        assert!(render_product_context(None, None).is_none());
    }

    #[test]
    fn failing_provider_drops_only_its_half() {
        let out = gather_product_context(&FixedMission(Some(mission())), &BrokenRoadmap).unwrap();
        assert!(out.contains("### Product Mission"));
        assert!(!out.contains("### Current Work Item"));
        assert!(!out.ends_with('\n'));

        assert!(gather_product_context(&FixedMission(None), &FixedRoadmap(None)).is_none());
    }
}

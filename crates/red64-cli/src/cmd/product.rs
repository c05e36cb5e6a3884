use crate::output::print_json;
use anyhow::Context;
use red64_core::mission::{FsMissionProvider, MissionProvider};
use red64_core::product::{render_product_context, NO_PRODUCT_CONTEXT, PRODUCT_HEADER};
use red64_core::roadmap::{FsRoadmapProvider, RoadmapProvider};
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let mission = FsMissionProvider::new(root)
        .mission_summary()
        .context("failed to read mission")?;
    let current_item = FsRoadmapProvider::new(root)
        .current_item()
        .context("failed to parse roadmap")?;
    let rendered = render_product_context(mission.as_ref(), current_item.as_ref());

    if json {
        let value = serde_json::json!({
            "mission_lite": mission,
            "current_item": current_item,
            "product_context": rendered,
        });
        print_json(&value)?;
        return Ok(());
    }

    match rendered {
        Some(block) => println!("{block}"),
        None => println!("{PRODUCT_HEADER}\n\n{NO_PRODUCT_CONTEXT}"),
    }
    Ok(())
}

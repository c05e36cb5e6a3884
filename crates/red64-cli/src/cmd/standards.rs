use crate::output::print_json;
use anyhow::Context;
use red64_core::config::Config;
use red64_core::paths;
use red64_core::standards::{FsStandardsStore, StandardsMatcher};
use std::path::{Path, PathBuf};

pub fn run(
    root: &Path,
    signals: &[String],
    plugins_dir: Option<PathBuf>,
    json: bool,
) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let plugins_dir = plugins_dir.unwrap_or_else(|| paths::plugins_dir(root));
    let matcher = StandardsMatcher::new(FsStandardsStore::new(&plugins_dir));
    let matched = matcher
        .find_matches(signals, &config.standards.enabled)
        .with_context(|| format!("failed to read standards from {}", plugins_dir.display()))?;

    if json {
        print_json(&matched)?;
        return Ok(());
    }

    if matched.is_empty() {
        println!("No enabled standards match.");
        return Ok(());
    }
    for s in &matched.standards {
        let docs: Vec<&str> = s.rule_documents.iter().map(|d| d.name.as_str()).collect();
        println!("{:<32} {}", s.identifier, docs.join(", "));
    }
    if let Some(note) = &matched.precedence_note {
        println!();
        println!("{note}");
    }
    Ok(())
}

use crate::output::print_json;
use anyhow::Context;
use red64_core::budget::{self, estimate_tokens};
use red64_core::config::{Config, TokenBudget};
use red64_core::types::ContextItem;
use std::io::Read;
use std::path::Path;

/// Allocate a JSON array of `{name, content, priority}` items read from stdin.
pub fn run(root: &Path, max_tokens: Option<u32>, json: bool) -> anyhow::Result<()> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("failed to read items from stdin")?;
    let items: Vec<ContextItem> =
        serde_json::from_str(&input).context("expected a JSON array of context items")?;

    let mut token_budget = match Config::load(root) {
        Ok(config) => config.token_budget,
        Err(e) => {
            tracing::debug!(error = %e, "config unavailable, using default budget");
            TokenBudget::default()
        }
    };
    if let Some(max) = max_tokens {
        anyhow::ensure!(max > 0, "--max-tokens must be greater than 0");
        token_budget.max_tokens = max;
    }

    let allocation = budget::allocate(
        &items,
        token_budget.max_tokens as usize,
        token_budget.overflow_behavior,
    );

    if json {
        print_json(&allocation)?;
        return Ok(());
    }

    println!("Budget: {} tokens", token_budget.max_tokens);
    for item in &allocation.selected {
        println!(
            "  {:<32} priority {:<6} {:>6} tokens",
            item.name,
            item.priority,
            estimate_tokens(&item.content)
        );
    }
    if let Some(summary) = &allocation.exclusion_summary {
        println!("{summary}");
    }
    Ok(())
}

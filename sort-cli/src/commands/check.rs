//! Validate a scenario file without running it.

use anyhow::Result;
use std::collections::BTreeMap;
use std::path::Path;

use crate::config::Scenario;

/// Run the check command.
pub async fn run(path: &Path) -> Result<()> {
    let scenario = Scenario::load(path).await?;

    println!("=== sortline check ===");
    println!();
    println!("Scenario: {}", path.display());
    println!(
        "  Watch:   {}",
        scenario.collection.watch_attribute.as_deref().unwrap_or("(any attribute)")
    );
    match scenario.lock_timeout() {
        Some(limit) => println!("  Timeout: {:?}", limit),
        None => println!("  Timeout: none"),
    }
    println!(
        "  Order:   score {}",
        if scenario.collection.descending { "descending" } else { "ascending" }
    );
    println!("  Steps:   {}", scenario.steps.len());
    for (op, count) in summarize(&scenario) {
        println!("    {:<10} {}", op, count);
    }
    println!();
    println!("OK");

    Ok(())
}

/// Step counts per op.
fn summarize(scenario: &Scenario) -> BTreeMap<&'static str, usize> {
    let mut counts = BTreeMap::new();
    for step in &scenario.steps {
        *counts.entry(step.op()).or_insert(0) += 1;
    }
    counts
}

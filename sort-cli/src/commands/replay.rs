//! Apply a scenario to a collection and report what happened.

use anyhow::{Context, Result};
use serde::Serialize;
use sortline_collection::{AsyncSortedCollection, CollectionEvent, Order, SortedCollection};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{Scenario, Step};
use crate::entry::Entry;

/// Outcome of a replay.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Every structural event, in commit order.
    pub events: Vec<CollectionEvent>,
    /// Final `(name, score)` order.
    pub order: Vec<(String, i64)>,
    /// Whether the final order agrees with the sort key.
    pub sorted: bool,
    /// Steps that were skipped (out-of-range index, absent entry).
    pub skipped: usize,
}

/// Run the replay command.
pub async fn run(scenario: &Scenario, json: bool) -> Result<()> {
    let report = execute(scenario).await?;

    if json {
        for event in &report.events {
            println!("{}", serde_json::to_string(event)?);
        }
        println!("{}", serde_json::to_string(&report.order)?);
    } else {
        println!("=== sortline replay ===");
        println!();
        println!("Events ({}):", report.events.len());
        for event in &report.events {
            println!("  {}", event);
        }
        println!();
        println!("Final order ({}):", report.order.len());
        for (i, (name, score)) in report.order.iter().enumerate() {
            println!("  [{}] {} ({})", i, name, score);
        }
        if report.skipped > 0 {
            println!();
            println!("Skipped steps: {}", report.skipped);
        }
    }

    if !report.sorted {
        anyhow::bail!("final order is not sorted (replace_at does not re-sort)");
    }
    Ok(())
}

/// Apply every step and collect the events the collection emitted.
pub async fn execute(scenario: &Scenario) -> Result<Report> {
    let collection = build(scenario)?;
    let (observer, mut rx) = collection.events();
    let mut entries: HashMap<String, Arc<Entry>> = HashMap::new();
    let mut events = Vec::new();
    let mut skipped = 0;

    for (n, step) in scenario.steps.iter().enumerate() {
        let n = n + 1;
        debug!(step = n, op = step.op(), "applying");

        match step {
            Step::Insert { name, score } => {
                let entry = Entry::new(name.clone(), *score);
                entries.insert(name.clone(), Arc::clone(&entry));
                collection.insert(entry).await?;
            }
            Step::Remove { name } => {
                let entry = lookup(&entries, name)?;
                if collection.remove(entry).await?.is_none() {
                    warn!(step = n, %name, "entry not in collection");
                    skipped += 1;
                }
            }
            Step::RemoveAt { index } => match collection.remove_at(*index).await {
                Ok(_) => {}
                Err(e) if e.is_out_of_range() => {
                    warn!(step = n, error = %e, "skipped");
                    skipped += 1;
                }
                Err(e) => return Err(e.into()),
            },
            Step::ReplaceAt { index, name, score } => {
                // Registered even if skipped; later steps may still name it.
                let entry = Entry::new(name.clone(), *score);
                entries.insert(name.clone(), Arc::clone(&entry));
                match collection.replace_at(*index, entry).await {
                    Ok(_) => {}
                    Err(e) if e.is_out_of_range() => {
                        warn!(step = n, error = %e, "skipped");
                        skipped += 1;
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            Step::Set { name, score } => lookup(&entries, name)?.set_score(*score),
            Step::Relabel { name, label } => lookup(&entries, name)?.set_label(label.clone()),
            Step::Clear => collection.clear().await?,
        }

        // Observers run synchronously, so every event of this step is queued.
        while let Ok(event) = rx.try_recv() {
            debug!(step = n, %event, "event");
            events.push(event);
        }
    }

    collection.collection().unobserve(observer);

    let order = collection
        .snapshot()
        .iter()
        .map(|e| (e.name().to_string(), e.score()))
        .collect();
    let sorted = collection.collection().is_sorted();
    info!(events = events.len(), skipped, sorted, "replay finished");

    Ok(Report {
        events,
        order,
        sorted,
        skipped,
    })
}

fn build(scenario: &Scenario) -> Result<AsyncSortedCollection<Entry>> {
    let by_score = Order::<Entry>::by_key(|e| e.score());
    let order = if scenario.collection.descending {
        by_score.reversed()
    } else {
        by_score
    };

    let mut builder = SortedCollection::builder().order(order);
    if let Some(attr) = &scenario.collection.watch_attribute {
        builder = builder.watch_attribute(attr.clone());
    }
    let collection = builder.build().context("Invalid collection settings")?;

    let collection = AsyncSortedCollection::new(collection);
    Ok(match scenario.lock_timeout() {
        Some(limit) => collection.with_lock_timeout(limit),
        None => collection,
    })
}

fn lookup<'a>(entries: &'a HashMap<String, Arc<Entry>>, name: &str) -> Result<&'a Entry> {
    entries
        .get(name)
        .map(|e| e.as_ref())
        .with_context(|| format!("unknown entry '{}'", name))
}

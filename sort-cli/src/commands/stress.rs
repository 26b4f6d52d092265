//! Concurrent inserts from many tasks, then verify nothing was lost.

use anyhow::Result;
use sortline_collection::{AsyncSortedCollection, SortedCollection};
use std::time::{Duration, Instant};
use tracing::info;

/// Outcome of a stress run.
#[derive(Debug, Clone)]
pub struct StressReport {
    /// Inserts performed.
    pub inserted: u64,
    /// Final length of the collection.
    pub len: usize,
    /// Whether the final order is ascending with no gaps.
    pub intact: bool,
    /// Wall-clock time of the insert phase.
    pub elapsed: Duration,
}

/// Run the stress command.
pub async fn run(tasks: u64, per_task: u64, timeout_ms: Option<u64>) -> Result<()> {
    let report = execute(tasks, per_task, timeout_ms.map(Duration::from_millis)).await?;

    println!("=== sortline stress ===");
    println!();
    println!("Tasks:    {}", tasks);
    println!("Per task: {}", per_task);
    println!("Inserted: {}", report.inserted);
    println!("Length:   {}", report.len);
    println!("Elapsed:  {:?}", report.elapsed);

    if !report.intact {
        anyhow::bail!(
            "collection lost or misordered items ({} inserted, {} present)",
            report.inserted,
            report.len
        );
    }
    println!();
    println!("OK");
    Ok(())
}

/// Insert `tasks * per_task` distinct keys, interleaved across tasks.
pub async fn execute(tasks: u64, per_task: u64, timeout: Option<Duration>) -> Result<StressReport> {
    if tasks == 0 {
        anyhow::bail!("--tasks must be at least 1");
    }

    let mut collection = AsyncSortedCollection::new(SortedCollection::<u64>::new());
    if let Some(limit) = timeout {
        collection = collection.with_lock_timeout(limit);
    }

    let started = Instant::now();
    let handles: Vec<_> = (0..tasks)
        .map(|t| {
            let collection = collection.clone();
            tokio::spawn(async move {
                for i in 0..per_task {
                    collection.insert(i * tasks + t).await?;
                }
                Ok::<_, sortline_collection::CollectionError>(())
            })
        })
        .collect();
    for handle in handles {
        handle.await??;
    }
    let elapsed = started.elapsed();

    let inserted = tasks * per_task;
    let values = collection.values();
    let intact = values.len() as u64 == inserted
        && values.iter().enumerate().all(|(i, v)| *v == i as u64);
    info!(inserted, len = values.len(), ?elapsed, intact, "stress finished");

    Ok(StressReport {
        inserted,
        len: values.len(),
        intact,
        elapsed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_inserts_stay_intact() {
        let report = execute(8, 50, None).await.unwrap();
        assert_eq!(report.inserted, 400);
        assert_eq!(report.len, 400);
        assert!(report.intact);
    }

    #[tokio::test]
    async fn generous_timeout_still_succeeds() {
        let report = execute(4, 10, Some(Duration::from_secs(5))).await.unwrap();
        assert!(report.intact);
    }

    #[tokio::test]
    async fn zero_tasks_rejected() {
        assert!(execute(0, 10, None).await.is_err());
    }

    #[tokio::test]
    async fn zero_per_task_is_empty() {
        let report = execute(3, 0, None).await.unwrap();
        assert_eq!(report.len, 0);
        assert!(report.intact);
    }
}

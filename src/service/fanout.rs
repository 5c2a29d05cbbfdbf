//! Concurrent shard fetch for full-table reads
//!
//! One task per (year, month) in a `JoinSet`, bounded by a semaphore. The
//! parent drains every task before looking at failures and is the only
//! writer of the result map.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use crate::store::ShardStore;
use crate::types::{PeriodRows, Result, Row, ShardId, Table, TableStoreError};

/// Default number of shard fetches in flight per full-table read
pub const DEFAULT_FANOUT_LIMIT: usize = 16;

/// Default deadline for a whole full-table read
pub const DEFAULT_FANOUT_TIMEOUT: Duration = Duration::from_secs(10);

/// Limits applied to a full-table read
#[derive(Debug, Clone)]
pub struct FanoutConfig {
    /// Maximum concurrent shard fetches
    pub max_concurrent_fetches: usize,
    /// Deadline for the whole fan-out; `None` waits indefinitely
    pub deadline: Option<Duration>,
}

impl Default for FanoutConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: DEFAULT_FANOUT_LIMIT,
            deadline: Some(DEFAULT_FANOUT_TIMEOUT),
        }
    }
}

type FetchOutcome = (String, String, Result<Vec<Row>>);

/// Rows of a shard, or none if the shard was allocated but never written
pub(crate) async fn rows_or_empty(shards: &dyn ShardStore, shard: ShardId) -> Result<Vec<Row>> {
    match shards.get_rows(shard).await {
        Ok(rows) => Ok(rows),
        Err(e) if e.is_not_found() => {
            warn!("Shard {} referenced but never written, reading as empty", shard);
            Ok(Vec::new())
        }
        Err(e) => Err(e),
    }
}

/// Fetch every period of `table`.
///
/// The result holds every index key exactly once, including years whose
/// month map is empty. Any genuine failure fails the whole read with one
/// `AggregateFailure` listing every failed period.
pub async fn fetch_all_periods(
    shards: Arc<dyn ShardStore>,
    table: &Table,
    config: &FanoutConfig,
) -> Result<PeriodRows> {
    let mut data = PeriodRows::new();
    for year in table.period_index.keys() {
        data.insert(year.clone(), Default::default());
    }

    let semaphore = Arc::new(Semaphore::new(config.max_concurrent_fetches.max(1)));
    let mut tasks: JoinSet<FetchOutcome> = JoinSet::new();

    for (year, month, shard) in table.periods() {
        let shards = Arc::clone(&shards);
        let semaphore = Arc::clone(&semaphore);
        let year = year.to_string();
        let month = month.to_string();

        tasks.spawn(async move {
            let rows = match semaphore.acquire_owned().await {
                Ok(_permit) => rows_or_empty(shards.as_ref(), shard).await,
                Err(_) => Err(TableStoreError::Internal("Fan-out semaphore closed".into())),
            };
            (year, month, rows)
        });
    }

    debug!(
        "Fetching {} shards of table {} (limit {})",
        tasks.len(),
        table.id,
        config.max_concurrent_fetches
    );

    let failures = match config.deadline {
        Some(deadline) => {
            let drained = tokio::time::timeout(deadline, drain(&mut tasks, &mut data)).await;
            match drained {
                Ok(failures) => failures,
                Err(_) => {
                    tasks.abort_all();
                    error!(
                        "Full read of table {} exceeded {:?}, aborted",
                        table.id, deadline
                    );
                    return Err(TableStoreError::Timeout(format!(
                        "Full read of table {} exceeded {} ms",
                        table.id,
                        deadline.as_millis()
                    )));
                }
            }
        }
        None => drain(&mut tasks, &mut data).await,
    };

    if !failures.is_empty() {
        error!(
            "Full read of table {} failed for {} shards",
            table.id,
            failures.len()
        );
        return Err(TableStoreError::AggregateFailure(failures));
    }

    Ok(data)
}

/// Join every task, recording rows and collecting failure messages
async fn drain(tasks: &mut JoinSet<FetchOutcome>, data: &mut PeriodRows) -> Vec<String> {
    let mut failures = Vec::new();

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((year, month, Ok(rows))) => {
                data.entry(year).or_default().insert(month, rows);
            }
            Ok((year, month, Err(e))) => {
                failures.push(format!("{}/{}: {}", year, month, e));
            }
            Err(e) => {
                failures.push(format!("Shard fetch task failed: {}", e));
            }
        }
    }

    failures.sort();
    failures
}

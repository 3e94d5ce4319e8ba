use std::future::Future;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool};
use tracing::warn;

use crate::context::ShardContext;
use crate::core::value::bind_params_as;
use crate::core::{Result, SqlParam};

/// How one shard fared during a fan-out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ShardOutcome {
    Ok { rows: usize },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShardReport {
    pub shard: String,
    #[serde(flatten)]
    pub outcome: ShardOutcome,
}

/// Rows gathered from every reachable shard plus a report per shard.
///
/// A failed shard is not an error: it is listed in `reports` and contributes
/// no rows. Row order across shards is unspecified.
#[derive(Debug, Clone)]
pub struct FanOut<T> {
    pub rows: Vec<T>,
    pub reports: Vec<ShardReport>,
}

impl<T> FanOut<T> {
    pub fn failed_shards(&self) -> Vec<&str> {
        self.reports
            .iter()
            .filter(|report| matches!(report.outcome, ShardOutcome::Failed { .. }))
            .map(|report| report.shard.as_str())
            .collect()
    }

    pub fn is_degraded(&self) -> bool {
        self.reports
            .iter()
            .any(|report| matches!(report.outcome, ShardOutcome::Failed { .. }))
    }

    pub fn healthy_shards(&self) -> usize {
        self.reports.len() - self.failed_shards().len()
    }
}

impl ShardContext {
    /// Run `task` once per shard with at most `fanout_concurrency` in flight.
    ///
    /// Results come back in shard-map order regardless of completion order.
    pub async fn for_each_shard<R, F, Fut>(&self, task: F) -> Vec<(String, Result<R>)>
    where
        F: Fn(String, PgPool) -> Fut + Send + Sync,
        Fut: Future<Output = Result<R>> + Send,
        R: Send,
    {
        // Jobs own their shard name and pool; a stream over borrowed pool
        // entries is not `Send` for every lifetime.
        let jobs: Vec<_> = self
            .pools
            .iter()
            .enumerate()
            .map(|(position, (shard, pool))| {
                let shard = shard.to_string();
                let pending = task(shard.clone(), pool.clone());
                async move { (position, shard, pending.await) }
            })
            .collect();

        let mut results = stream::iter(jobs)
            .buffer_unordered(self.fanout_concurrency)
            .collect::<Vec<_>>()
            .await;

        results.sort_by_key(|(position, _, _)| *position);
        results
            .into_iter()
            .map(|(_, shard, result)| (shard, result))
            .collect()
    }

    /// Run `sql` on every shard and concatenate the rows that came back.
    ///
    /// Never fails as a whole; unreachable or failing shards are logged and
    /// reported in [`FanOut::reports`].
    pub async fn run_on_all<T>(&self, sql: &str, params: &[SqlParam]) -> FanOut<T>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let results = self
            .for_each_shard(|_shard, pool| async move {
                let rows = bind_params_as(sqlx::query_as::<_, T>(sql), params)
                    .fetch_all(&pool)
                    .await?;
                Ok(rows)
            })
            .await;

        let mut fan_out = FanOut {
            rows: Vec::new(),
            reports: Vec::with_capacity(results.len()),
        };

        for (shard, result) in results {
            let outcome = match result {
                Ok(rows) => {
                    let count = rows.len();
                    fan_out.rows.extend(rows);
                    ShardOutcome::Ok { rows: count }
                }
                Err(err) => {
                    warn!(shard = %shard, error = %err, "shard excluded from fan-out result");
                    ShardOutcome::Failed {
                        error: err.to_string(),
                    }
                }
            };
            fan_out.reports.push(ShardReport { shard, outcome });
        }

        fan_out
    }
}

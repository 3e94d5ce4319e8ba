use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use sqlx::FromRow;
use sqlx::postgres::PgRow;
use tracing::debug;

use super::Sharded;
use crate::connection::ShardPoolSet;
use crate::context::ShardContext;
use crate::core::Result;

/// Tables that can be searched by primary key across shards.
///
/// A closed set keeps caller-supplied text out of the statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScatterTable {
    TravelPlans,
    Locations,
}

impl ScatterTable {
    pub fn table_name(self) -> &'static str {
        match self {
            ScatterTable::TravelPlans => "travel_plans",
            ScatterTable::Locations => "locations",
        }
    }

    pub(crate) fn lookup_sql(self) -> &'static str {
        match self {
            ScatterTable::TravelPlans => {
                concat!("SELECT ", plan_columns!(), " FROM travel_plans WHERE id = $1")
            }
            ScatterTable::Locations => {
                concat!("SELECT ", location_columns!(), " FROM locations WHERE id = $1")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ProbeOutcome {
    Hit,
    Miss,
    Failed { error: String },
}

/// One shard visited during a scatter lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShardProbe {
    pub shard: String,
    #[serde(flatten)]
    pub outcome: ProbeOutcome,
}

/// Raw result of a locator: the matching rows (if any) and where they were.
#[derive(Default)]
pub struct ScatterHit {
    pub shard: Option<String>,
    pub rows: Vec<PgRow>,
    pub probes: Vec<ShardProbe>,
}

impl fmt::Debug for ScatterHit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScatterHit")
            .field("shard", &self.shard)
            .field("rows", &self.rows.len())
            .field("probes", &self.probes)
            .finish()
    }
}

/// Finds the shard holding a row whose shard cannot be derived from its id.
#[async_trait]
pub trait ShardLocator: Send + Sync {
    async fn locate(&self, pools: &ShardPoolSet, table: ScatterTable, id: &str) -> ScatterHit;
}

/// Asks each shard in turn, in shard-map order, and stops at the first match.
///
/// O(shards) per lookup. A shard that errors is treated as not holding the
/// row and the scan moves on.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinearScanLocator;

#[async_trait]
impl ShardLocator for LinearScanLocator {
    async fn locate(&self, pools: &ShardPoolSet, table: ScatterTable, id: &str) -> ScatterHit {
        let mut hit = ScatterHit::default();

        for (shard, pool) in pools.iter() {
            match sqlx::query(table.lookup_sql())
                .bind(id)
                .fetch_all(pool)
                .await
            {
                Ok(rows) if !rows.is_empty() => {
                    hit.probes.push(ShardProbe {
                        shard: shard.to_string(),
                        outcome: ProbeOutcome::Hit,
                    });
                    hit.shard = Some(shard.to_string());
                    hit.rows = rows;
                    return hit;
                }
                Ok(_) => hit.probes.push(ShardProbe {
                    shard: shard.to_string(),
                    outcome: ProbeOutcome::Miss,
                }),
                Err(err) => {
                    debug!(
                        shard = %shard,
                        table = table.table_name(),
                        error = %err,
                        "scatter lookup skipped shard"
                    );
                    hit.probes.push(ShardProbe {
                        shard: shard.to_string(),
                        outcome: ProbeOutcome::Failed {
                            error: err.to_string(),
                        },
                    });
                }
            }
        }

        hit
    }
}

/// Rows found by a scatter lookup; `shard` is `None` when nothing matched.
#[derive(Debug, Clone)]
pub struct Located<T> {
    pub rows: Vec<T>,
    pub shard: Option<String>,
    pub probes: Vec<ShardProbe>,
}

impl<T> Located<T> {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn into_first(self) -> Option<Sharded<T>> {
        let shard = self.shard?;
        self.rows
            .into_iter()
            .next()
            .map(|value| Sharded { value, shard })
    }
}

impl ShardContext {
    /// Look `id` up in `table` on every shard until one has it.
    ///
    /// An id found nowhere yields an empty result, not an error. Only a row
    /// that cannot be decoded into `T` fails the call.
    pub async fn find_by_id<T>(&self, id: &str, table: ScatterTable) -> Result<Located<T>>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let hit = self.locator.locate(&self.pools, table, id).await;
        let rows = hit
            .rows
            .iter()
            .map(|row| T::from_row(row))
            .collect::<std::result::Result<Vec<T>, sqlx::Error>>()?;

        Ok(Located {
            rows,
            shard: hit.shard,
            probes: hit.probes,
        })
    }
}

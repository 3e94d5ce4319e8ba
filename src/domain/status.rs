use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tracing::warn;

use super::TravelStore;
use crate::core::{Result, ShardError};

const PLAN_STATS: &str = "SELECT COUNT(*), COUNT(*) FILTER (WHERE is_public), MAX(created_at) \
                          FROM travel_plans";

const COUNT_PLANS: &str = "SELECT COUNT(*) FROM travel_plans";

const COUNT_LOCATIONS: &str = "SELECT COUNT(*) FROM locations";

const TABLES_PRESENT: &str = "SELECT COUNT(*) FROM information_schema.tables \
                              WHERE table_schema = 'public' \
                              AND table_name IN ('travel_plans', 'locations')";

/// Tables every shard must carry.
pub const REQUIRED_TABLES: i64 = 2;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ShardHealth {
    Healthy {
        total_plans: i64,
        public_plans: i64,
        last_created: Option<DateTime<Utc>>,
    },
    Error {
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShardStatus {
    pub shard: String,
    #[serde(flatten)]
    pub health: ShardHealth,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ShardCounts {
    Healthy { travel_plans: i64, locations: i64 },
    Error { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShardInfoEntry {
    pub name: String,
    #[serde(flatten)]
    pub counts: ShardCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShardInfo {
    pub total_shards: usize,
    pub shards: Vec<ShardInfoEntry>,
}

/// Result of probing one shard for connectivity and schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShardCheck {
    pub shard: String,
    pub tables_found: i64,
    pub travel_plans: i64,
    pub locations: i64,
}

impl ShardCheck {
    pub fn schema_complete(&self) -> bool {
        self.tables_found >= REQUIRED_TABLES
    }
}

async fn plan_stats(pool: &PgPool) -> Result<(i64, i64, Option<DateTime<Utc>>)> {
    Ok(sqlx::query_as(PLAN_STATS).fetch_one(pool).await?)
}

async fn table_counts(pool: &PgPool) -> Result<(i64, i64)> {
    let mut conn = pool.acquire().await?;
    let (travel_plans,): (i64,) = sqlx::query_as(COUNT_PLANS).fetch_one(&mut *conn).await?;
    let (locations,): (i64,) = sqlx::query_as(COUNT_LOCATIONS)
        .fetch_one(&mut *conn)
        .await?;
    Ok((travel_plans, locations))
}

/// Connect to `pool`, confirm both tables exist and count their rows.
///
/// Row counts are only read when the schema is complete and stay zero otherwise.
pub async fn check_pool(shard: &str, pool: &PgPool) -> Result<ShardCheck> {
    let (tables_found,): (i64,) = sqlx::query_as(TABLES_PRESENT).fetch_one(pool).await?;
    let mut check = ShardCheck {
        shard: shard.to_string(),
        tables_found,
        travel_plans: 0,
        locations: 0,
    };

    if check.schema_complete() {
        let (travel_plans, locations) = table_counts(pool).await?;
        check.travel_plans = travel_plans;
        check.locations = locations;
    }

    Ok(check)
}

impl TravelStore {
    /// Plan statistics for every shard. Never fails as a whole.
    pub async fn shard_status(&self) -> Vec<ShardStatus> {
        self.context()
            .for_each_shard(|_shard, pool| async move { plan_stats(&pool).await })
            .await
            .into_iter()
            .map(|(shard, result)| {
                let health = match result {
                    Ok((total_plans, public_plans, last_created)) => ShardHealth::Healthy {
                        total_plans,
                        public_plans,
                        last_created,
                    },
                    Err(err) => {
                        warn!(shard = %shard, error = %err, "shard status unavailable");
                        ShardHealth::Error {
                            error: err.to_string(),
                        }
                    }
                };
                ShardStatus { shard, health }
            })
            .collect()
    }

    /// Row counts of both tables on every shard. Never fails as a whole.
    pub async fn shard_info(&self) -> ShardInfo {
        let shards: Vec<ShardInfoEntry> = self
            .context()
            .for_each_shard(|_shard, pool| async move { table_counts(&pool).await })
            .await
            .into_iter()
            .map(|(name, result)| {
                let counts = match result {
                    Ok((travel_plans, locations)) => ShardCounts::Healthy {
                        travel_plans,
                        locations,
                    },
                    Err(err) => {
                        warn!(shard = %name, error = %err, "shard info unavailable");
                        ShardCounts::Error {
                            error: err.to_string(),
                        }
                    }
                };
                ShardInfoEntry { name, counts }
            })
            .collect();

        ShardInfo {
            total_shards: shards.len(),
            shards,
        }
    }

    /// Probe every shard, in shard-map order.
    pub async fn check_shards(&self) -> Vec<(String, Result<ShardCheck>)> {
        self.context()
            .for_each_shard(|shard, pool| async move { check_pool(&shard, &pool).await })
            .await
    }

    /// Probe the shard called `name`.
    pub async fn check_shard(&self, name: &str) -> Result<ShardCheck> {
        let pool = self
            .context()
            .pools()
            .get(name)
            .ok_or_else(|| ShardError::Configuration(format!("unknown shard '{name}'")))?;
        check_pool(name, pool).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn health_serializes_with_status_tag() {
        let status = ShardStatus {
            shard: "db_3".into(),
            health: ShardHealth::Error {
                error: "pool timed out".into(),
            },
        };
        assert_eq!(
            serde_json::to_value(status).unwrap(),
            json!({"shard": "db_3", "status": "error", "error": "pool timed out"})
        );
    }

    #[test]
    fn info_entry_flattens_counts() {
        let entry = ShardInfoEntry {
            name: "db_a".into(),
            counts: ShardCounts::Healthy {
                travel_plans: 4,
                locations: 9,
            },
        };
        assert_eq!(
            serde_json::to_value(entry).unwrap(),
            json!({"name": "db_a", "status": "healthy", "travel_plans": 4, "locations": 9})
        );
    }

    #[test]
    fn schema_needs_both_tables() {
        let check = ShardCheck {
            shard: "db_0".into(),
            tables_found: 1,
            travel_plans: 0,
            locations: 0,
        };
        assert!(!check.schema_complete());
    }
}

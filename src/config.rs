use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::connection::{PoolSettings, ShardMap};
use crate::context::ShardContext;
use crate::routing::DEFAULT_SHARD_PREFIX;

const DEFAULT_SHARD_MAP_FILE: &str = "mapping.json";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub shard_map: ShardMap,
    pub shard_prefix: String,
    pub pool: PoolSettings,
    pub fanout_concurrency: Option<usize>,
}

impl AppConfig {
    /// Reads `.env` (if present) and the process environment.
    ///
    /// `SHARD_MAP` holds the shard map inline as JSON and wins over
    /// `SHARD_MAP_FILE`.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let host = env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = parse_var("APP_PORT", 3000u16)?;

        let shard_map = match env::var("SHARD_MAP") {
            Ok(json) => ShardMap::from_json(&json).context("SHARD_MAP is not a valid shard map")?,
            Err(_) => {
                let path = env::var("SHARD_MAP_FILE")
                    .unwrap_or_else(|_| DEFAULT_SHARD_MAP_FILE.to_string());
                ShardMap::from_file(&path)
                    .with_context(|| format!("failed to load shard map from {path}"))?
            }
        };

        let shard_prefix =
            env::var("SHARD_PREFIX").unwrap_or_else(|_| DEFAULT_SHARD_PREFIX.to_string());

        let pool = PoolSettings::new()
            .max_connections(parse_var("DB_MAX_CONNECTIONS", 5u32)?)
            .idle_timeout(Duration::from_millis(parse_var("DB_IDLE_TIMEOUT_MS", 30_000u64)?))
            .acquire_timeout(Duration::from_millis(parse_var(
                "DB_ACQUIRE_TIMEOUT_MS",
                5_000u64,
            )?));
        pool.validate().context("invalid pool settings")?;

        let fanout_concurrency = match env::var("FANOUT_CONCURRENCY") {
            Ok(raw) => Some(
                raw.parse::<usize>()
                    .context("FANOUT_CONCURRENCY must be a valid usize")?,
            ),
            Err(_) => None,
        };

        Ok(Self {
            host,
            port,
            shard_map,
            shard_prefix,
            pool,
            fanout_concurrency,
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Pools (not yet connected) and router for the configured shards.
    pub fn shard_context(&self) -> Result<ShardContext> {
        let ctx = ShardContext::connect_lazy(&self.shard_map, self.pool.clone(), &self.shard_prefix)
            .context("failed to build shard pools")?;

        Ok(match self.fanout_concurrency {
            Some(limit) => ctx.with_fanout_concurrency(limit),
            None => ctx,
        })
    }
}

fn parse_var<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid {}", std::any::type_name::<T>())),
        Err(_) => Ok(default),
    }
}

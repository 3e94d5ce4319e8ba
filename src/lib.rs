// ============================================================================
// travel_shards Library
// ============================================================================

#[macro_use]
mod sql;

pub mod config;
pub mod connection;
pub mod context;
pub mod core;
pub mod domain;
pub mod executor;
pub mod prelude;
pub mod routing;
pub mod web;

// Re-export main types for convenience
pub use context::ShardContext;
pub use core::{Entity, Result, ShardError, SqlParam};
pub use domain::TravelStore;
pub use routing::ShardRouter;

// Re-export connection API
pub use connection::{PoolSettings, PoolStats, ShardMap, ShardPoolSet, ShardTarget};

// Re-export executor results
pub use executor::{FanOut, Located, ScatterTable, ShardExecution, ShardRows, Sharded};

// ============================================================================
// HTTP
// ============================================================================

pub use web::{AppState, build_router};

/// Embedded schema migrations applied to every shard.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

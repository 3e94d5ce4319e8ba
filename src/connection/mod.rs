pub mod config;
pub mod pool;

pub use config::{PoolSettings, ShardMap, ShardTarget};
pub use pool::{PoolStats, ShardPoolSet};

use std::fmt;
use std::sync::Arc;

use sqlx::PgPool;

use crate::connection::{PoolSettings, ShardMap, ShardPoolSet};
use crate::core::{Result, ShardError};
use crate::executor::scatter::{LinearScanLocator, ShardLocator};
use crate::routing::ShardRouter;

/// Everything an operation needs to reach a shard.
///
/// Built once at startup and shared (behind an `Arc`) by every unit of work.
/// The pools are the only shared mutable resource; router and shard order
/// never change after construction. Call [`ShardContext::close`] on shutdown.
pub struct ShardContext {
    pub(crate) pools: ShardPoolSet,
    pub(crate) router: ShardRouter,
    pub(crate) locator: Arc<dyn ShardLocator>,
    pub(crate) fanout_concurrency: usize,
}

impl ShardContext {
    /// Build pools for every shard in `map` and a router over their names.
    pub fn connect_lazy(map: &ShardMap, settings: PoolSettings, prefix: &str) -> Result<Self> {
        let pools = ShardPoolSet::connect_lazy(map, settings)?;
        let router = ShardRouter::new(prefix, pools.names());
        Ok(Self::new(pools, router))
    }

    pub fn new(pools: ShardPoolSet, router: ShardRouter) -> Self {
        let fanout_concurrency = pools.len().max(1);
        Self {
            pools,
            router,
            locator: Arc::new(LinearScanLocator),
            fanout_concurrency,
        }
    }

    /// Replace the strategy used to find entities whose shard is unknown.
    pub fn with_locator(mut self, locator: Arc<dyn ShardLocator>) -> Self {
        self.locator = locator;
        self
    }

    /// Cap the number of shards queried at the same time during fan-out.
    pub fn with_fanout_concurrency(mut self, limit: usize) -> Self {
        self.fanout_concurrency = limit.max(1);
        self
    }

    pub fn pools(&self) -> &ShardPoolSet {
        &self.pools
    }

    pub fn router(&self) -> &ShardRouter {
        &self.router
    }

    pub fn fanout_concurrency(&self) -> usize {
        self.fanout_concurrency
    }

    /// Shard that owns `id`.
    pub fn shard_for(&self, id: &str) -> Result<String> {
        self.router.shard_for(id)
    }

    /// Shard name and pool that own `id`.
    pub(crate) fn owner(&self, id: &str) -> Result<(String, &PgPool)> {
        let shard = self.router.shard_for(id)?;
        match self.pools.get(&shard) {
            Some(pool) => Ok((shard, pool)),
            None => Err(ShardError::ShardNotFound {
                id: id.to_string(),
                shard,
            }),
        }
    }

    /// Drain and close every shard pool.
    pub async fn close(&self) {
        self.pools.close().await;
    }
}

impl fmt::Debug for ShardContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShardContext")
            .field("pools", &self.pools)
            .field("router", &self.router)
            .field("fanout_concurrency", &self.fanout_concurrency)
            .finish()
    }
}

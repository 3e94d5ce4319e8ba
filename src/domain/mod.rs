//! Travel plan and location operations on top of the shard executors.
//!
//! Every update is conditioned on the version the caller last saw. When such
//! an update matches no row, a follow-up read on the same shard decides
//! between `NotFound` and `Conflict`. Another writer may act between the two
//! statements, so the reported `current_version` can already be stale by the
//! time the caller sees it.

pub mod locations;
pub mod models;
pub mod plans;
pub mod status;

use std::sync::Arc;

use crate::context::ShardContext;
use crate::core::{Entity, ShardError};

pub use models::{
    Location, LocationPatch, NewLocation, NewTravelPlan, PlanDetails, TravelPlan,
    TravelPlanPatch, TravelPlanSummary,
};
pub use status::{ShardCheck, ShardCounts, ShardHealth, ShardInfo, ShardInfoEntry, ShardStatus};

/// Entry point for domain operations. Cheap to clone.
#[derive(Debug, Clone)]
pub struct TravelStore {
    ctx: Arc<ShardContext>,
}

impl TravelStore {
    pub fn new(ctx: Arc<ShardContext>) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &ShardContext {
        &self.ctx
    }

    /// Explains why a conditional update on `id` touched nothing.
    ///
    /// `owner_id` routes the follow-up read; `version_sql` selects the stored
    /// version by id.
    async fn missed_update(
        &self,
        entity: Entity,
        id: &str,
        owner_id: &str,
        version_sql: &str,
    ) -> ShardError {
        match self
            .ctx
            .run_on_owner::<(i32,)>(owner_id, version_sql, &[id.into()])
            .await
        {
            Ok(found) => match found.rows.first() {
                Some((current_version,)) => ShardError::conflict(entity, id, *current_version),
                None => ShardError::not_found(entity, id),
            },
            Err(err) => err,
        }
    }
}

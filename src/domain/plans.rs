use tracing::{debug, info};

use super::TravelStore;
use super::models::{
    Location, NewTravelPlan, PlanDetails, TravelPlan, TravelPlanPatch, TravelPlanSummary,
};
use crate::core::{Entity, Result, ShardError, SqlParam};
use crate::executor::{FanOut, ShardExecution, Sharded};

const INSERT_PLAN: &str = concat!(
    "INSERT INTO travel_plans \
     (id, title, description, start_date, end_date, budget, currency, is_public) \
     VALUES ($1, $2, $3, $4, $5, $6::numeric, $7, COALESCE($8, FALSE)) \
     RETURNING ",
    plan_columns!()
);

const SELECT_PLAN: &str = concat!("SELECT ", plan_columns!(), " FROM travel_plans WHERE id = $1");

const SELECT_PLAN_LOCATIONS: &str = concat!(
    "SELECT ",
    location_columns!(),
    " FROM locations WHERE travel_plan_id = $1 ORDER BY visit_order"
);

const LIST_PLANS: &str = concat!(
    "SELECT ",
    plan_summary_columns!(),
    " FROM travel_plans ORDER BY created_at DESC"
);

const UPDATE_PLAN: &str = concat!(
    "UPDATE travel_plans SET \
     title = COALESCE($1, title), \
     description = COALESCE($2, description), \
     start_date = COALESCE($3, start_date), \
     end_date = COALESCE($4, end_date), \
     budget = COALESCE($5::numeric, budget), \
     currency = COALESCE($6, currency), \
     is_public = COALESCE($7, is_public), \
     version = version + 1, \
     updated_at = NOW() \
     WHERE id = $8 AND version = $9 \
     RETURNING ",
    plan_columns!()
);

const PLAN_VERSION: &str = "SELECT version FROM travel_plans WHERE id = $1";

const DELETE_PLAN: &str = "DELETE FROM travel_plans WHERE id = $1";

impl TravelStore {
    /// Insert a plan on the shard its id routes to. Starts at version 1.
    pub async fn create_plan(&self, input: NewTravelPlan) -> Result<Sharded<TravelPlan>> {
        let params = [
            SqlParam::from(input.id.as_str()),
            input.title.into(),
            input.description.into(),
            input.start_date.into(),
            input.end_date.into(),
            input.budget.into(),
            input.currency.into(),
            input.is_public.into(),
        ];

        let created = self
            .context()
            .run_on_owner::<TravelPlan>(&input.id, INSERT_PLAN, &params)
            .await?
            .into_first()
            .ok_or_else(|| ShardError::from(sqlx::Error::RowNotFound))?;

        info!(plan_id = %created.value.id, shard = %created.shard, "travel plan created");
        Ok(created)
    }

    pub async fn get_plan(&self, id: &str) -> Result<Sharded<TravelPlan>> {
        self.context()
            .run_on_owner::<TravelPlan>(id, SELECT_PLAN, &[id.into()])
            .await?
            .into_first()
            .ok_or_else(|| ShardError::not_found(Entity::TravelPlan, id))
    }

    /// The plan plus its locations ordered by `visit_order`.
    ///
    /// Both reads go to the plan's shard, one after the other.
    pub async fn get_plan_with_locations(&self, id: &str) -> Result<PlanDetails> {
        let plan = self.get_plan(id).await?;
        let locations = self
            .context()
            .run_on_owner::<Location>(id, SELECT_PLAN_LOCATIONS, &[id.into()])
            .await?;

        Ok(PlanDetails {
            plan: plan.value,
            locations: locations.rows,
            shard: plan.shard,
        })
    }

    /// Every plan on every reachable shard, newest first.
    ///
    /// Shards that fail are left out and named in the reports.
    pub async fn list_plans(&self) -> FanOut<TravelPlanSummary> {
        let mut plans = self
            .context()
            .run_on_all::<TravelPlanSummary>(LIST_PLANS, &[])
            .await;
        plans
            .rows
            .sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));

        debug!(
            plans = plans.rows.len(),
            failed_shards = plans.failed_shards().len(),
            "listed travel plans"
        );
        plans
    }

    /// Apply `patch` if the stored version still equals `expected_version`.
    ///
    /// On success the version is bumped by one. A stale version yields
    /// `Conflict` carrying the version found afterwards.
    pub async fn update_plan(
        &self,
        id: &str,
        patch: TravelPlanPatch,
        expected_version: i32,
    ) -> Result<Sharded<TravelPlan>> {
        let params = [
            SqlParam::from(patch.title),
            patch.description.into(),
            patch.start_date.into(),
            patch.end_date.into(),
            patch.budget.into(),
            patch.currency.into(),
            patch.is_public.into(),
            id.into(),
            expected_version.into(),
        ];

        let updated = self
            .context()
            .run_on_owner::<TravelPlan>(id, UPDATE_PLAN, &params)
            .await?
            .into_first();

        match updated {
            Some(plan) => {
                info!(plan_id = %id, version = plan.value.version, "travel plan updated");
                Ok(plan)
            }
            None => Err(self
                .missed_update(Entity::TravelPlan, id, id, PLAN_VERSION)
                .await),
        }
    }

    /// Remove a plan; its locations go with it.
    pub async fn delete_plan(&self, id: &str) -> Result<ShardExecution> {
        let deleted = self
            .context()
            .execute_on_owner(id, DELETE_PLAN, &[id.into()])
            .await?;

        if deleted.rows_affected == 0 {
            return Err(ShardError::not_found(Entity::TravelPlan, id));
        }

        info!(plan_id = %id, shard = %deleted.shard, "travel plan deleted");
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_is_conditioned_on_id_and_version() {
        assert!(UPDATE_PLAN.contains("version = version + 1"));
        assert!(UPDATE_PLAN.contains("WHERE id = $8 AND version = $9"));
        assert!(UPDATE_PLAN.contains("budget = COALESCE($5::numeric, budget)"));
    }

    #[test]
    fn listing_selects_summary_columns_only() {
        assert!(LIST_PLANS.starts_with("SELECT id, title, start_date"));
        assert!(!LIST_PLANS.contains("description"));
    }
}

use sqlx::{Postgres, Transaction};
use tracing::{info, warn};
use uuid::Uuid;

use super::TravelStore;
use super::models::{Location, LocationPatch, NewLocation};
use crate::core::{Entity, Result, ShardError, SqlParam};
use crate::executor::{ScatterTable, ShardExecution, ShardRows, Sharded};

const SELECT_PLAN_LOCATIONS: &str = concat!(
    "SELECT ",
    location_columns!(),
    " FROM locations WHERE travel_plan_id = $1 ORDER BY visit_order"
);

const LOCK_PLAN: &str = "SELECT 1 FROM travel_plans WHERE id = $1 FOR UPDATE";

const NEXT_VISIT_ORDER: &str =
    "SELECT COALESCE(MAX(visit_order), 0) + 1 FROM locations WHERE travel_plan_id = $1";

const INSERT_LOCATION: &str = concat!(
    "INSERT INTO locations \
     (id, travel_plan_id, name, address, latitude, longitude, visit_order, \
     arrival_date, departure_date, budget, notes) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10::numeric, $11) \
     RETURNING ",
    location_columns!()
);

const UPDATE_LOCATION: &str = concat!(
    "UPDATE locations SET \
     name = COALESCE($1, name), \
     address = COALESCE($2, address), \
     latitude = COALESCE($3, latitude), \
     longitude = COALESCE($4, longitude), \
     visit_order = COALESCE($5, visit_order), \
     arrival_date = COALESCE($6, arrival_date), \
     departure_date = COALESCE($7, departure_date), \
     budget = COALESCE($8::numeric, budget), \
     notes = COALESCE($9, notes), \
     version = version + 1, \
     updated_at = NOW() \
     WHERE id = $10 AND version = $11 \
     RETURNING ",
    location_columns!()
);

const LOCATION_VERSION: &str = "SELECT version FROM locations WHERE id = $1";

const DELETE_LOCATION: &str = "DELETE FROM locations WHERE id = $1";

impl TravelStore {
    /// Locations of a plan in visit order, read from the plan's shard.
    ///
    /// An unknown plan yields an empty list.
    pub async fn list_locations(&self, plan_id: &str) -> Result<ShardRows<Location>> {
        self.context()
            .run_on_owner::<Location>(plan_id, SELECT_PLAN_LOCATIONS, &[plan_id.into()])
            .await
    }

    /// Append a location to a plan, on the plan's shard.
    ///
    /// The plan row stays locked until commit, so concurrent appends to the
    /// same plan get consecutive visit orders.
    pub async fn create_location(
        &self,
        plan_id: &str,
        input: NewLocation,
    ) -> Result<Sharded<Location>> {
        let (shard, pool) = self.context().owner(plan_id)?;
        let mut tx = pool.begin().await?;

        match append_location(&mut tx, plan_id, input).await {
            Ok(location) => {
                tx.commit().await?;
                info!(
                    location_id = %location.id,
                    plan_id,
                    visit_order = location.visit_order,
                    shard = %shard,
                    "location created"
                );
                Ok(Sharded {
                    value: location,
                    shard,
                })
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(plan_id, shard = %shard, error = %rollback_err, "rollback failed");
                }
                Err(err)
            }
        }
    }

    /// Find a location by id alone, asking shards until one has it.
    pub async fn get_location(&self, id: &str) -> Result<Sharded<Location>> {
        self.context()
            .find_by_id::<Location>(id, ScatterTable::Locations)
            .await?
            .into_first()
            .ok_or_else(|| ShardError::not_found(Entity::Location, id))
    }

    /// Apply `patch` to a location under optimistic concurrency.
    ///
    /// Without `expected_version` the stored version is used, which turns the
    /// call into last-writer-wins for the fields it sets. The write is routed
    /// by the owning plan's id.
    pub async fn update_location(
        &self,
        id: &str,
        patch: LocationPatch,
        expected_version: Option<i32>,
    ) -> Result<Sharded<Location>> {
        let current = self.get_location(id).await?;
        let plan_id = current.value.travel_plan_id.clone();
        let owner = self.context().shard_for(&plan_id)?;
        if owner != current.shard {
            warn!(
                location_id = id,
                plan_id = %plan_id,
                found_on = %current.shard,
                routed_to = %owner,
                "location stored outside its plan's shard"
            );
        }

        let expected_version = expected_version.unwrap_or(current.value.version);
        let params = [
            SqlParam::from(patch.name),
            patch.address.into(),
            patch.latitude.into(),
            patch.longitude.into(),
            patch.visit_order.into(),
            patch.arrival_date.into(),
            patch.departure_date.into(),
            patch.budget.into(),
            patch.notes.into(),
            id.into(),
            expected_version.into(),
        ];

        let updated = self
            .context()
            .run_on_owner::<Location>(&plan_id, UPDATE_LOCATION, &params)
            .await?
            .into_first();

        match updated {
            Some(location) => {
                info!(location_id = id, version = location.value.version, "location updated");
                Ok(location)
            }
            None => Err(self
                .missed_update(Entity::Location, id, &plan_id, LOCATION_VERSION)
                .await),
        }
    }

    pub async fn delete_location(&self, id: &str) -> Result<ShardExecution> {
        let current = self.get_location(id).await?;
        let deleted = self
            .context()
            .execute_on_owner(&current.value.travel_plan_id, DELETE_LOCATION, &[id.into()])
            .await?;

        if deleted.rows_affected == 0 {
            return Err(ShardError::not_found(Entity::Location, id));
        }

        info!(location_id = id, shard = %deleted.shard, "location deleted");
        Ok(deleted)
    }
}

async fn append_location(
    tx: &mut Transaction<'static, Postgres>,
    plan_id: &str,
    input: NewLocation,
) -> Result<Location> {
    let locked: Option<(i32,)> = sqlx::query_as(LOCK_PLAN)
        .bind(plan_id)
        .fetch_optional(&mut **tx)
        .await?;
    if locked.is_none() {
        return Err(ShardError::ParentNotFound(plan_id.to_string()));
    }

    let (visit_order,): (i32,) = sqlx::query_as(NEXT_VISIT_ORDER)
        .bind(plan_id)
        .fetch_one(&mut **tx)
        .await?;

    let location = sqlx::query_as::<_, Location>(INSERT_LOCATION)
        .bind(Uuid::new_v4().to_string())
        .bind(plan_id)
        .bind(input.name)
        .bind(input.address)
        .bind(input.latitude)
        .bind(input.longitude)
        .bind(visit_order)
        .bind(input.arrival_date)
        .bind(input.departure_date)
        .bind(input.budget)
        .bind(input.notes)
        .fetch_one(&mut **tx)
        .await?;

    Ok(location)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visit_order_starts_at_one() {
        assert!(NEXT_VISIT_ORDER.starts_with("SELECT COALESCE(MAX(visit_order), 0) + 1"));
    }

    #[test]
    fn plan_is_locked_before_counting() {
        assert!(LOCK_PLAN.ends_with("FOR UPDATE"));
    }

    #[test]
    fn location_update_is_version_guarded() {
        assert!(UPDATE_LOCATION.contains("WHERE id = $10 AND version = $11"));
        assert!(UPDATE_LOCATION.contains("visit_order = COALESCE($5, visit_order)"));
    }
}

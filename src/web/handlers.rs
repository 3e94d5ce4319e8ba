use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde::Serialize;
use uuid::Uuid;

use super::AppState;
use super::error::{ApiResult, JsonBody};
use super::requests::{
    CreateLocationRequest, CreatePlanRequest, UpdateLocationRequest, UpdatePlanRequest,
};
use crate::domain::{
    Location, PlanDetails, ShardInfo, ShardStatus, TravelPlan, TravelPlanSummary,
};
use crate::executor::Sharded;

/// Lists the shards left out of a fan-out response.
pub const FAILED_SHARDS_HEADER: HeaderName = HeaderName::from_static("x-failed-shards");

/// A row plus the version clients must echo back on update.
#[derive(Debug, Serialize)]
pub struct VersionedBody<T> {
    #[serde(flatten)]
    pub value: T,
    pub current_version: i32,
    pub shard: String,
}

impl From<Sharded<TravelPlan>> for VersionedBody<TravelPlan> {
    fn from(sharded: Sharded<TravelPlan>) -> Self {
        Self {
            current_version: sharded.value.version,
            value: sharded.value,
            shard: sharded.shard,
        }
    }
}

impl From<Sharded<Location>> for VersionedBody<Location> {
    fn from(sharded: Sharded<Location>) -> Self {
        Self {
            current_version: sharded.value.version,
            value: sharded.value,
            shard: sharded.shard,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PlanDetailsBody {
    #[serde(flatten)]
    pub details: PlanDetails,
    pub current_version: i32,
}

pub async fn healthcheck() -> &'static str {
    "OK"
}

pub async fn shard_status(State(state): State<AppState>) -> Json<Vec<ShardStatus>> {
    Json(state.store.shard_status().await)
}

pub async fn shard_info(State(state): State<AppState>) -> Json<ShardInfo> {
    Json(state.store.shard_info().await)
}

pub async fn list_plans(
    State(state): State<AppState>,
) -> (HeaderMap, Json<Vec<TravelPlanSummary>>) {
    let plans = state.store.list_plans().await;

    let mut headers = HeaderMap::new();
    if plans.is_degraded()
        && let Ok(value) = HeaderValue::from_str(&plans.failed_shards().join(","))
    {
        headers.insert(FAILED_SHARDS_HEADER, value);
    }

    (headers, Json(plans.rows))
}

pub async fn create_plan(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreatePlanRequest>,
) -> ApiResult<(StatusCode, Json<VersionedBody<TravelPlan>>)> {
    let input = payload.into_new_plan(Uuid::new_v4().to_string())?;
    let plan = state.store.create_plan(input).await?;

    Ok((StatusCode::CREATED, Json(plan.into())))
}

pub async fn get_plan(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<PlanDetailsBody>> {
    let details = state.store.get_plan_with_locations(&id).await?;

    Ok(Json(PlanDetailsBody {
        current_version: details.plan.version,
        details,
    }))
}

pub async fn update_plan(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<UpdatePlanRequest>,
) -> ApiResult<Json<VersionedBody<TravelPlan>>> {
    let (patch, version) = payload.into_patch()?;
    let plan = state.store.update_plan(&id, patch, version).await?;

    Ok(Json(plan.into()))
}

pub async fn delete_plan(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.store.delete_plan(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_locations(
    State(state): State<AppState>,
    Path(plan_id): Path<String>,
) -> ApiResult<Json<Vec<Location>>> {
    let locations = state.store.list_locations(&plan_id).await?;
    Ok(Json(locations.rows))
}

pub async fn create_location(
    State(state): State<AppState>,
    Path(plan_id): Path<String>,
    JsonBody(payload): JsonBody<CreateLocationRequest>,
) -> ApiResult<(StatusCode, Json<VersionedBody<Location>>)> {
    let input = payload.into_new_location()?;
    let location = state.store.create_location(&plan_id, input).await?;

    Ok((StatusCode::CREATED, Json(location.into())))
}

pub async fn get_location(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<VersionedBody<Location>>> {
    let location = state.store.get_location(&id).await?;
    Ok(Json(location.into()))
}

pub async fn update_location(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<UpdateLocationRequest>,
) -> ApiResult<Json<VersionedBody<Location>>> {
    let (patch, version) = payload.into_patch()?;
    let location = state.store.update_location(&id, patch, version).await?;

    Ok(Json(location.into()))
}

pub async fn delete_location(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.store.delete_location(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

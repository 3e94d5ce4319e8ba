//! HTTP surface over the travel store.

pub mod error;
pub mod handlers;
pub mod requests;

use std::sync::Arc;

use axum::Router;
use axum::http::Method;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::context::ShardContext;
use crate::domain::TravelStore;

pub use error::{ApiResult, ErrorResponse, JsonBody};
pub use handlers::FAILED_SHARDS_HEADER;

#[derive(Clone)]
pub struct AppState {
    pub store: TravelStore,
}

impl AppState {
    pub fn new(ctx: Arc<ShardContext>) -> Self {
        Self {
            store: TravelStore::new(ctx),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::healthcheck))
        .route("/api/shards/status", get(handlers::shard_status))
        .route("/api/shards/info", get(handlers::shard_info))
        .route(
            "/api/travel-plans",
            get(handlers::list_plans).post(handlers::create_plan),
        )
        .route(
            "/api/travel-plans/{id}",
            get(handlers::get_plan)
                .put(handlers::update_plan)
                .delete(handlers::delete_plan),
        )
        .route(
            "/api/travel-plans/{id}/locations",
            get(handlers::list_locations).post(handlers::create_location),
        )
        .route(
            "/api/locations/{id}",
            get(handlers::get_location)
                .put(handlers::update_location)
                .delete(handlers::delete_location),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .expose_headers([FAILED_SHARDS_HEADER])
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ]),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

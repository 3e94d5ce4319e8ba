use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{error, info};

use crate::core::ShardError;

pub type ApiResult<T> = std::result::Result<T, ShardError>;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_version: Option<i32>,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, code: &'static str) -> Self {
        Self {
            error: error.into(),
            code,
            details: None,
            current_version: None,
        }
    }
}

impl IntoResponse for ShardError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ShardError::Validation(reason) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    details: Some(reason.clone()),
                    ..ErrorResponse::new("Validation error", "validation_error")
                },
            ),
            ShardError::NotFound { entity, .. } => (
                StatusCode::NOT_FOUND,
                ErrorResponse::new(format!("{entity} not found"), "not_found"),
            ),
            ShardError::ParentNotFound(_) => (
                StatusCode::NOT_FOUND,
                ErrorResponse::new("Travel plan not found", "not_found"),
            ),
            ShardError::Conflict {
                entity,
                current_version,
                ..
            } => (
                StatusCode::CONFLICT,
                ErrorResponse {
                    current_version: Some(*current_version),
                    ..ErrorResponse::new(
                        format!("{entity} was modified by another request"),
                        "version_conflict",
                    )
                },
            ),
            ShardError::ConstraintViolation(_) => (
                StatusCode::CONFLICT,
                ErrorResponse::new("Conflicting data", "constraint_violation"),
            ),
            ShardError::ShardNotFound { .. }
            | ShardError::Configuration(_)
            | ShardError::TransientDatabase(_)
            | ShardError::Database(_) => {
                error!(error = %self, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("Internal server error", "internal_error"),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

/// `Json<T>` whose rejections surface as validation errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ShardError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                let reason = rejection_reason(&rejection);
                info!(reason = %reason, "rejected request body");
                Err(ShardError::validation(reason))
            }
        }
    }
}

fn rejection_reason(rejection: &JsonRejection) -> String {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            "expected a request with Content-Type: application/json".to_string()
        }
        other => other.body_text(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Entity;
    use axum::body::to_bytes;
    use serde_json::{Value, json};

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("error body should be readable");
        serde_json::from_slice(&bytes).expect("error body should be JSON")
    }

    #[tokio::test]
    async fn conflict_maps_to_409_with_current_version() {
        let response = ShardError::conflict(Entity::TravelPlan, "p1", 3).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body = body_json(response).await;
        assert_eq!(body["current_version"], 3);
        assert_eq!(body["code"], "version_conflict");
        assert_eq!(body["error"], "Travel plan was modified by another request");
    }

    #[tokio::test]
    async fn internal_errors_expose_only_the_generic_message() {
        let response = ShardError::Configuration("postgres://admin:secret@db_3".into())
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(
            body,
            json!({"error": "Internal server error", "code": "internal_error"})
        );
    }

    #[test]
    fn missing_parent_maps_to_404() {
        let response = ShardError::ParentNotFound("p1".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn database_failures_map_to_500() {
        let response = ShardError::from(sqlx::Error::PoolTimedOut).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = ShardError::ShardNotFound {
            id: "x".into(),
            shard: "db_x".into(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

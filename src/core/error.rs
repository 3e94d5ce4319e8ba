use std::fmt;

use thiserror::Error;

/// Entity kinds that can be missing or conflicting on a shard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    TravelPlan,
    Location,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::TravelPlan => write!(f, "Travel plan"),
            Entity::Location => write!(f, "Location"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ShardError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("No shard '{shard}' configured for id '{id}'")]
    ShardNotFound { id: String, shard: String },

    #[error("{entity} '{id}' not found")]
    NotFound { entity: Entity, id: String },

    #[error("{entity} '{id}' has been modified (current version {current_version})")]
    Conflict {
        entity: Entity,
        id: String,
        current_version: i32,
    },

    #[error("Travel plan '{0}' not found")]
    ParentNotFound(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Transient database error: {0}")]
    TransientDatabase(#[source] sqlx::Error),

    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, ShardError>;

impl ShardError {
    pub fn not_found(entity: Entity, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn conflict(entity: Entity, id: impl Into<String>, current_version: i32) -> Self {
        Self::Conflict {
            entity,
            id: id.into(),
            current_version,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// True when the caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientDatabase(_))
    }
}

impl From<sqlx::Error> for ShardError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::WorkerCrashed => Self::TransientDatabase(err),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|code| code.into_owned());
                match code.as_deref() {
                    Some("23505") | Some("23503") => {
                        Self::ConstraintViolation(db_err.message().to_string())
                    }
                    Some("23514") => Self::Validation(db_err.message().to_string()),
                    Some(code) if code.starts_with("22") => {
                        Self::Validation(db_err.message().to_string())
                    }
                    Some(code) if code.starts_with("08") || code == "57P01" => {
                        Self::TransientDatabase(err)
                    }
                    _ => Self::Database(err),
                }
            }
            _ => Self::Database(err),
        }
    }
}

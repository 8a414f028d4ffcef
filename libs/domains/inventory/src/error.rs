use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Errors raised by the inventory services and repositories.
///
/// The variant decides the HTTP status; the message is returned to the
/// client as-is, except for `Database`.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// A referenced category, product or movement does not exist
    #[error("{0}")]
    NotFound(String),

    /// The operation is not possible in the current state
    #[error("{0}")]
    InvalidState(String),

    #[error("{0}")]
    Validation(String),

    /// Uniqueness or dependency violation
    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),
}

pub type InventoryResult<T> = Result<T, InventoryError>;

impl From<DbErr> for InventoryError {
    fn from(err: DbErr) -> Self {
        // Constraint violations lose the race against the service-level checks
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                tracing::warn!(detail = %detail, "Unique constraint violated");
                InventoryError::Conflict("Registro duplicado".to_string())
            }
            Some(SqlErr::ForeignKeyConstraintViolation(detail)) => {
                tracing::warn!(detail = %detail, "Foreign key constraint violated");
                InventoryError::Conflict("Registro referenciado por outro registro".to_string())
            }
            _ => InventoryError::Database(err.to_string()),
        }
    }
}

/// Missing resources are reported as 400, not 404: the clients of this API
/// treat every rejected business operation the same way.
impl From<InventoryError> for AppError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::NotFound(msg)
            | InventoryError::InvalidState(msg)
            | InventoryError::Validation(msg) => AppError::BadRequest(msg),
            InventoryError::Conflict(msg) => AppError::Conflict(msg),
            InventoryError::Database(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for InventoryError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid filter input for '{field}': {reason}")]
    InvalidFilterInput { field: &'static str, reason: String },

    #[error("Query failed: {0}")]
    QueryFailed(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),


    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid_filter(field: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidFilterInput {
            field,
            reason: reason.into(),
        }
    }

    /// Get a sanitized error message safe for logging
    pub fn log_safe(&self) -> String {
        match self {
            // Store errors might leak schema details or bound values
            Error::QueryFailed(_) => "Database query failed".to_string(),
            Error::Migration(_) => "Database migration failed".to_string(),

            Error::Internal(msg) => {
                let lower = msg.to_lowercase();
                if lower.contains("password") || lower.contains("secret") || lower.contains("token")
                {
                    "Internal error (details redacted)".to_string()
                } else {
                    format!("Internal error: {msg}")
                }
            }

            Error::InvalidFilterInput { field, reason } => {
                format!("Invalid filter input for '{field}': {reason}")
            }
            Error::Io(_) => "File system operation failed".to_string(),
            Error::Config(msg) => format!("Configuration error: {msg}"),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            Error::InvalidFilterInput { .. } => {
                tracing::debug!("Rejected request: {}", self.log_safe());
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            Error::QueryFailed(_) => {
                tracing::error!("Request error: {}", self.log_safe());
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
            _ => {
                tracing::error!("Request error: {}", self.log_safe());
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

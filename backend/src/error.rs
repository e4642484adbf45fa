//! Error handling for the reporting API.
//!
//! Every failure is rendered as `{"error": <message>}`. Database failures are
//! not classified further: a broken connection and a bad statement both come
//! back as a 500 carrying the driver's message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use vogaflex_shared::ErrorBody;

/// Application error type that can be converted to HTTP responses
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A required parameter is missing. The payload is the fixed error code
    /// returned to the caller, e.g. `chat_id_required`.
    #[error("{0}")]
    BadRequest(&'static str),

    /// A query parameter could not be interpreted.
    #[error("invalid value for {name}: {value:?}")]
    InvalidParameter { name: &'static str, value: String },

    #[error("{0}")]
    Database(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::InvalidParameter { .. } | Self::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn invalid_parameter(name: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            value: value.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Result type alias for handlers
pub type ApiResult<T> = Result<T, AppError>;

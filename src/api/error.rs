// Handler-level errors and their HTTP rendering

use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tracing::error;

#[derive(Debug)]
pub enum ApiError {
    /// Malformed request parameters
    BadRequest(String),
    /// Requested resource does not exist
    NotFound(String),
    /// Store, strategy or serialization failure
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            Self::NotFound(msg) => write!(f, "Not found: {}", msg),
            Self::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{:#}", err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Internal details stay in the logs.
        let message = match &self {
            Self::BadRequest(msg) | Self::NotFound(msg) => msg.clone(),
            Self::Internal(msg) => {
                error!(error = %msg, "Request failed");
                "Internal server error".to_string()
            }
        };

        let body = serde_json::json!({
            "status": status.as_u16(),
            "error": message,
        });
        (status, Json(body)).into_response()
    }
}

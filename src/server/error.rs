//! Errors returned by the API, rendered as failure envelopes.

use super::ApiEnvelope;
use crate::error::ClassifyError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Errors returned to API clients.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Too Many Requests")]
    TooManyRequests,

    /// The cause is logged, never sent to the client.
    #[error("Internal Server Error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ClassifyError> for ApiError {
    fn from(err: ClassifyError) -> Self {
        if err.is_validation() {
            return Self::BadRequest(err.to_string());
        }
        tracing::error!("Classification failed: {}", err);
        Self::Internal
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        ApiEnvelope::<()>::failure(self.status(), self.to_string()).into_response()
    }
}

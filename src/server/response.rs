//! The JSON envelope every API response is wrapped in.

use crate::classifier::Classification;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

/// `{ success, status, message, data }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    /// Mirrors the HTTP status code.
    pub status: u16,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    /// A successful response carrying `data`.
    pub fn success(status: StatusCode, data: T) -> Self {
        Self {
            success: true,
            status: status.as_u16(),
            message: "Success".to_string(),
            data: Some(data),
        }
    }

    /// A failed response with no data.
    pub fn failure(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            success: false,
            status: status.as_u16(),
            message: message.into(),
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiEnvelope<T> {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

/// Payload of a successful classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationData {
    pub is_ambulance: bool,
    /// Probability of the predicted class, 0.0 to 1.0.
    pub confidence: f32,
    /// The same probability formatted as "97.31%".
    pub confidence_percent: String,
}

impl From<&Classification> for ClassificationData {
    fn from(result: &Classification) -> Self {
        Self {
            is_ambulance: result.is_ambulance(),
            confidence: result.confidence(),
            confidence_percent: format!("{:.2}%", result.prediction.confidence_percent()),
        }
    }
}

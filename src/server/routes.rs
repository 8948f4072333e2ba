//! Request handlers.

use super::state::{AppState, ClientIp};
use super::{ApiEnvelope, ApiError, ClassificationData};
use crate::classifier::Upload;
use crate::storage::AttemptInfo;
use crate::types::FileSize;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, Request, State};
use axum::http::header::{CONTENT_LENGTH, USER_AGENT};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use axum::Json;
use serde::Serialize;
use std::time::Instant;

/// Name of the multipart field carrying the audio file.
const FILE_FIELD: &str = "file";

pub async fn root(State(state): State<AppState>) -> String {
    format!("API for {}", state.service_name)
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    service: String,
    model: ModelHealth,
}

#[derive(Debug, Serialize)]
struct ModelHealth {
    is_loaded: bool,
    message: &'static str,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let is_loaded = state.classifier.is_model_loaded();

    Json(HealthResponse {
        status: "healthy",
        service: state.service_name.to_string(),
        model: ModelHealth {
            is_loaded,
            message: if is_loaded { "loaded" } else { "not loaded yet" },
        },
    })
}

pub async fn classify(
    State(state): State<AppState>,
    client: ClientIp,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<ApiEnvelope<ClassificationData>, ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let upload = match read_upload(&mut multipart).await {
        Ok(Some(upload)) => upload,
        Ok(None) => return Err(ApiError::BadRequest("No file provided".to_string())),
        Err(FormError::Malformed(message)) => return Err(ApiError::BadRequest(message)),
        Err(FormError::TooLarge(file_name)) => {
            let err = state.classifier.policy().too_large();
            tracing::debug!("[/api/classify] Body limit hit for {:?} from {}", file_name, client);

            // Only the request length is known once the limit cuts the body off
            let request_size = headers
                .get(CONTENT_LENGTH)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.parse().ok())
                .unwrap_or(0);

            let attempt = AttemptInfo {
                audio_format: AttemptInfo::format_of(&file_name),
                file_name,
                file_size: FileSize::new(request_size),
                client_ip: client.to_string(),
                user_agent: user_agent(&headers),
                outcome: Err(err.to_string()),
                processing_time_ms: None,
            };
            record(&state, attempt).await;
            return Err(err.into());
        }
    };

    let file_name = upload.filename.clone();
    let file_size = upload.size();
    tracing::debug!("[/api/classify] Received file: {} ({}) from {}", file_name, file_size, client);

    let started = Instant::now();
    let result = state.classifier.classify(upload).await;

    let (audio_format, outcome, processing_time_ms) = match &result {
        Ok(c) => (
            c.format.to_string(),
            Ok((c.label(), c.confidence())),
            c.processing_time_ms,
        ),
        Err(e) => (
            AttemptInfo::format_of(&file_name),
            Err(e.to_string()),
            started.elapsed().as_secs_f64() * 1000.0,
        ),
    };

    let attempt = AttemptInfo {
        file_name,
        file_size,
        audio_format,
        client_ip: client.to_string(),
        user_agent: user_agent(&headers),
        outcome,
        processing_time_ms: Some(processing_time_ms),
    };
    record(&state, attempt).await;

    let classification = result?;
    tracing::info!(
        "[/api/classify] {} ({:.2}%) in {:.1} ms",
        classification.label(),
        classification.prediction.confidence_percent(),
        classification.processing_time_ms
    );

    Ok(ApiEnvelope::success(
        StatusCode::CREATED,
        ClassificationData::from(&classification),
    ))
}

fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// Append to the history log; a failed write never fails the request.
async fn record(state: &AppState, attempt: AttemptInfo) {
    if let Err(e) = state.history.log_attempt(attempt).await {
        tracing::warn!("Failed to record classification attempt: {}", e);
    }
}

/// Reject clients that have used up their quota.
pub async fn rate_limit(
    State(state): State<AppState>,
    client: ClientIp,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(limiter) = &state.limiter {
        if !limiter.try_acquire(client.key()) {
            tracing::debug!("Rate limit exceeded for {}", client);
            return Err(ApiError::TooManyRequests);
        }
    }
    Ok(next.run(request).await)
}

/// Why a form yielded no upload.
enum FormError {
    /// The body limit was reached. Carries the file name, empty when the
    /// `file` field had not started yet.
    TooLarge(String),
    Malformed(String),
}

impl FormError {
    fn from_multipart(err: MultipartError, file_name: &str) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return Self::TooLarge(file_name.to_string());
        }
        Self::Malformed(err.body_text())
    }
}

/// Pull the audio file out of the form, skipping unrelated fields.
async fn read_upload(multipart: &mut Multipart) -> Result<Option<Upload>, FormError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| FormError::from_multipart(e, ""))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| FormError::from_multipart(e, &filename))?;
        return Ok(Some(Upload::new(filename, bytes.to_vec())));
    }
    Ok(None)
}

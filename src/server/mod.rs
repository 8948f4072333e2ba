//! HTTP API.
//!
//! All routes live under `/api`:
//!
//! - `GET /api/`: service banner
//! - `GET /api/health`: liveness and model status
//! - `POST /api/classify/`: multipart upload with a `file` field
//!
//! Classification responses use the [`ApiEnvelope`] wrapper and every
//! upload is recorded in the history log.

mod error;
mod rate_limiter;
mod response;
mod routes;
mod shutdown;
mod state;

pub use error::ApiError;
pub use rate_limiter::ClientRateLimiter;
pub use response::{ApiEnvelope, ClassificationData};
pub use shutdown::shutdown_signal;
pub use state::{AppState, ClientIp};

use crate::classifier::{AudioClassifier, SpectrogramPipeline};
use crate::config::AppSettings;
use crate::storage::HistoryStore;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::{middleware, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Room for multipart boundaries and headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Build the application router.
pub fn router(state: AppState, settings: &AppSettings) -> Router {
    let classify = Router::new()
        .route("/api/classify", post(routes::classify))
        .route("/api/classify/", post(routes::classify))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            routes::rate_limit,
        ));

    let body_limit = usize::try_from(settings.max_upload_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .route("/api", get(routes::root))
        .route("/api/", get(routes::root))
        .route("/api/health", get(routes::health))
        .merge(classify)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors_layer(&settings.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(AllowHeaders::mirror_request());

    // Credentials cannot be combined with a wildcard origin
    if origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(AllowOrigin::any());
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    layer
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
}

/// Run the server until Ctrl-C or SIGTERM.
pub async fn serve(settings: AppSettings) -> std::io::Result<()> {
    let pipeline = Arc::new(SpectrogramPipeline::from_settings(&settings));
    tracing::info!("Model path: {}", pipeline.models().path().display());

    if settings.preload_model {
        if let Err(e) = pipeline.warm_up().await {
            tracing::warn!("Model preload failed, will retry on first request: {}", e);
        }
    }

    let history = Arc::new(HistoryStore::new(settings.history_path()));
    tracing::info!("History log: {}", history.path().display());

    let limiter = ClientRateLimiter::new(settings.requests_per_minute, settings.burst);
    let housekeeping = limiter
        .as_ref()
        .map(|limiter| limiter.spawn_housekeeping(Duration::from_secs(60)));

    let state = AppState::new(pipeline, history, settings.service_name.as_str())
        .with_limiter(limiter)
        .trust_forwarded_for(settings.trust_forwarded_for);
    let app = router(state, &settings);

    let listener = tokio::net::TcpListener::bind(settings.bind_address()).await?;
    tracing::info!("Listening on http://{}/api", listener.local_addr()?);

    let result = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await;

    if let Some(task) = housekeeping {
        task.abort();
    }
    tracing::info!("Server stopped");
    result
}

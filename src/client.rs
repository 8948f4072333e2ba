//! HTTP client for a running classification server.

use crate::error::{ClientError, ClientResult};
use crate::server::{ApiEnvelope, ClassificationData};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::path::Path;
use std::time::Duration;

/// Default server address, matching the default port.
pub const DEFAULT_URL: &str = "http://localhost:3001";

/// Uploads audio files to `<base>/api/classify/`.
#[derive(Debug, Clone)]
pub struct ClassifyClient {
    client: Client,
    base_url: String,
}

impl ClassifyClient {
    pub fn new(base_url: impl Into<String>) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .user_agent(concat!("sirene/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self::with_client(base_url, client))
    }

    /// Use a preconfigured `reqwest` client.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// The classify endpoint URL.
    pub fn endpoint(&self) -> String {
        format!("{}/api/classify/", self.base_url)
    }

    /// Upload a file and return the server's envelope.
    ///
    /// Error envelopes (400, 429, 500) are returned as `Ok` so callers can
    /// show the server's message; only non-JSON responses are errors.
    pub async fn classify_file(&self, path: &Path) -> ClientResult<ApiEnvelope<ClassificationData>> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| ClientError::ReadFile {
                path: path.to_path_buf(),
                source,
            })?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        self.classify_bytes(filename, bytes).await
    }

    /// Upload in-memory audio under the given file name.
    pub async fn classify_bytes(
        &self,
        filename: String,
        bytes: Vec<u8>,
    ) -> ClientResult<ApiEnvelope<ClassificationData>> {
        tracing::debug!("Uploading {} ({} bytes) to {}", filename, bytes.len(), self.endpoint());

        let form = Form::new().part(
            "file",
            Part::bytes(bytes)
                .file_name(filename)
                .mime_str("application/octet-stream")?,
        );

        let response = self
            .client
            .post(self.endpoint())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        serde_json::from_str(&body).map_err(|_| ClientError::UnexpectedResponse {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::Router;

    /// Serve `app` on an ephemeral port and return a client for it.
    async fn spawn(app: Router) -> ClassifyClient {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = Client::builder().no_proxy().build().unwrap();
        ClassifyClient::with_client(format!("http://{}/", addr), client)
    }

    #[test]
    fn test_endpoint_trims_slash() {
        let client = ClassifyClient::new("http://localhost:3001/").unwrap();
        assert_eq!(client.endpoint(), "http://localhost:3001/api/classify/");
    }

    #[tokio::test]
    async fn test_parses_success_envelope() {
        let app = Router::new().route(
            "/api/classify/",
            post(|| async {
                ApiEnvelope::success(
                    StatusCode::CREATED,
                    ClassificationData {
                        is_ambulance: true,
                        confidence: 0.5,
                        confidence_percent: "50.00%".to_string(),
                    },
                )
            }),
        );
        let client = spawn(app).await;

        let envelope = client
            .classify_bytes("true.wav".to_string(), b"RIFF".to_vec())
            .await
            .unwrap();

        assert!(envelope.success);
        assert_eq!(envelope.status, 201);
        assert_eq!(envelope.data.unwrap().confidence_percent, "50.00%");
    }

    #[tokio::test]
    async fn test_error_envelope_is_ok() {
        let app = Router::new().route(
            "/api/classify/",
            post(|| async {
                ApiEnvelope::<ClassificationData>::failure(StatusCode::BAD_REQUEST, "Empty file")
            }),
        );
        let client = spawn(app).await;

        let envelope = client
            .classify_bytes("empty.wav".to_string(), Vec::new())
            .await
            .unwrap();

        assert!(!envelope.success);
        assert_eq!(envelope.message, "Empty file");
        assert!(envelope.data.is_none());
    }

    #[tokio::test]
    async fn test_non_json_response_is_error() {
        let app = Router::new().route(
            "/api/classify/",
            post(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
        );
        let client = spawn(app).await;

        let err = client
            .classify_bytes("a.wav".to_string(), b"RIFF".to_vec())
            .await
            .unwrap_err();

        match err {
            ClientError::UnexpectedResponse { status, body } => {
                assert_eq!(status, 502);
                assert_eq!(body, "upstream down");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_missing_file() {
        let client = ClassifyClient::new(DEFAULT_URL).unwrap();
        let err = client
            .classify_file(Path::new("/nonexistent/siren.wav"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::ReadFile { .. }));
    }
}

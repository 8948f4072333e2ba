//! Shared handler state and the client address extractor.

use super::rate_limiter::ClientRateLimiter;
use crate::classifier::AudioClassifier;
use crate::storage::HistoryStore;
use async_trait::async_trait;
use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use std::convert::Infallible;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub classifier: Arc<dyn AudioClassifier>,
    pub history: Arc<HistoryStore>,
    /// `None` disables rate limiting.
    pub limiter: Option<ClientRateLimiter>,
    pub service_name: Arc<str>,
    pub trust_forwarded_for: bool,
}

impl AppState {
    pub fn new(
        classifier: Arc<dyn AudioClassifier>,
        history: Arc<HistoryStore>,
        service_name: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            classifier,
            history,
            limiter: None,
            service_name: service_name.into(),
            trust_forwarded_for: false,
        }
    }

    pub fn with_limiter(mut self, limiter: Option<ClientRateLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn trust_forwarded_for(mut self, trust: bool) -> Self {
        self.trust_forwarded_for = trust;
        self
    }
}

/// Address of the client that sent the request, if known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientIp(pub Option<IpAddr>);

impl ClientIp {
    /// Key used for rate limiting; unknown clients share one bucket.
    pub fn key(&self) -> IpAddr {
        self.0.unwrap_or(IpAddr::from([0, 0, 0, 0]))
    }
}

impl fmt::Display for ClientIp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(ip) => write!(f, "{}", ip),
            None => write!(f, "unknown"),
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if state.trust_forwarded_for {
            if let Some(ip) = forwarded_for(&parts.headers) {
                return Ok(Self(Some(ip)));
            }
        }

        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());
        Ok(Self(peer))
    }
}

/// First address of an `X-Forwarded-For` header.
fn forwarded_for(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get("x-forwarded-for")?
        .to_str()
        .ok()?
        .split(',')
        .next()?
        .trim()
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_forwarded_for_takes_first_entry() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        assert_eq!(forwarded_for(&headers), "203.0.113.7".parse().ok());
    }

    #[test]
    fn test_forwarded_for_ignores_garbage() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("not-an-ip"));
        assert_eq!(forwarded_for(&headers), None);
        assert_eq!(forwarded_for(&HeaderMap::new()), None);
    }

    #[test]
    fn test_unknown_client_display() {
        assert_eq!(ClientIp(None).to_string(), "unknown");
        assert_eq!(ClientIp(None).key(), IpAddr::from([0, 0, 0, 0]));
    }
}

//! Error types.
//!
//! Three families, split by where they surface:
//!
//! - [`Error`]: infrastructure failures of the server itself (binding a
//!   port, accepting a connection). Returned from [`Server`](crate::Server).
//! - [`ConfigError`](crate::config::ConfigError): bad or missing startup
//!   configuration. Lives next to [`Config`](crate::Config).
//! - [`GatewayError`]: per-request failures. Never escapes a handler; it is
//!   turned into a `{"error": ...}` response by [`IntoResponse`].

use std::fmt;

use http::StatusCode;

use crate::response::{IntoResponse, Response};
use crate::source_host::UpstreamError;

// ── Error ─────────────────────────────────────────────────────────────────────

/// The error type returned by the server's fallible operations.
#[derive(Debug)]
pub struct Error(std::io::Error);

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "io: {}", self.0)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self(e)
    }
}

// ── GatewayError ──────────────────────────────────────────────────────────────

/// A failure while handling one gateway request.
#[derive(Debug)]
pub enum GatewayError {
    /// The caller sent something unusable. Detected before any upstream call.
    Validation(&'static str),
    /// The upstream API (or the transport to it) failed.
    Upstream(UpstreamError),
    /// Anything else that went wrong while building the reply.
    Unknown(String),
}

impl GatewayError {
    /// The HTTP status this error maps to.
    ///
    /// Upstream failures forward the upstream's own status when it carried
    /// one that is a valid HTTP status; everything unclassified is a 500.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Upstream(e) => e
                .status
                .and_then(|code| StatusCode::from_u16(code).ok())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Self::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(msg) => f.write_str(msg),
            Self::Upstream(e) => write!(f, "{e}"),
            Self::Unknown(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for GatewayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Upstream(e) => Some(e),
            _ => None,
        }
    }
}

impl From<UpstreamError> for GatewayError {
    fn from(e: UpstreamError) -> Self {
        Self::Upstream(e)
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        Response::error(self.status(), &self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_status_is_forwarded() {
        let err = GatewayError::from(UpstreamError::new(Some(404), "Not Found"));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Not Found");
    }

    #[test]
    fn missing_or_bogus_upstream_status_is_500() {
        let none = GatewayError::from(UpstreamError::new(None, "connection refused"));
        assert_eq!(none.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bogus = GatewayError::from(UpstreamError::new(Some(42), "weird"));
        assert_eq!(bogus.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn validation_is_400() {
        let err = GatewayError::Validation("Title and body are required");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let res = err.into_response();
        assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(res.body(), br#"{"error":"Title and body are required"}"#);
    }
}

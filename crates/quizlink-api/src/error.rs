//! Error types for the REST layer.
//!
//! Unlike the socket side, REST calls *do* reject: callers catch the
//! error and translate it into UI state. The taxonomy keeps a timeout
//! distinguishable from a server-reported message and from a generic
//! status fallback.

/// Errors produced by [`ApiClient`](crate::ApiClient) calls.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request exceeded the configured timeout (default 10 s).
    #[error("request timed out")]
    TimedOut,

    /// The server answered with a non-2xx status. `message` is the
    /// body's `detail` field, or the raw body text, or `HTTP {status}`,
    /// in that preference order.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// The request never completed (connection refused, DNS, TLS).
    #[error("request failed: {0}")]
    Request(reqwest::Error),

    /// A 2xx response body did not match the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(serde_json::Error),
}

impl ApiError {
    /// Classifies a `reqwest` error, pulling timeouts out into their
    /// own variant.
    pub(crate) fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            ApiError::TimedOut
        } else {
            ApiError::Request(error)
        }
    }
}

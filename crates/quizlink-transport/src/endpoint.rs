//! WebSocket endpoint resolution.
//!
//! The socket URL for a session is resolved from, in order of
//! preference:
//!
//! 1. an explicit override,
//! 2. the `QUIZLINK_WS_URL` environment variable,
//! 3. the REST base URL with its scheme swapped (`http`→`ws`,
//!    `https`→`wss`),
//! 4. `ws://localhost:8000`.
//!
//! The session path `/ws/{namespace}/{code}` is appended to whichever
//! base wins.

use url::Url;

use crate::TransportError;

/// Path namespace under which the backend mounts game sockets.
pub const WS_NAMESPACE: &str = "quiz";

/// Environment variable consulted when no explicit override is given.
pub const WS_URL_ENV: &str = "QUIZLINK_WS_URL";

const DEFAULT_WS_BASE: &str = "ws://localhost:8000";

/// Resolves the socket URL for a session.
///
/// `override_url` wins outright; otherwise the environment, then a
/// scheme-swapped `api_base`, then the localhost default.
///
/// # Errors
/// [`TransportError::InvalidEndpoint`] when the winning base cannot be
/// parsed as a URL or the session code is empty.
pub fn resolve_ws_endpoint(
    override_url: Option<&str>,
    api_base: Option<&str>,
    session_code: &str,
) -> Result<Url, TransportError> {
    let env_url = std::env::var(WS_URL_ENV).ok();
    resolve_with(override_url, env_url.as_deref(), api_base, session_code)
}

fn resolve_with(
    override_url: Option<&str>,
    env_url: Option<&str>,
    api_base: Option<&str>,
    session_code: &str,
) -> Result<Url, TransportError> {
    if session_code.is_empty() {
        return Err(TransportError::InvalidEndpoint(
            "session code is empty".into(),
        ));
    }

    let base = match (override_url, env_url, api_base) {
        (Some(explicit), _, _) => explicit.to_string(),
        (None, Some(env), _) => env.to_string(),
        (None, None, Some(api)) => swap_scheme(api)?,
        (None, None, None) => DEFAULT_WS_BASE.to_string(),
    };

    let base = base.trim_end_matches('/');
    let full = format!("{base}/ws/{WS_NAMESPACE}/{session_code}");
    Url::parse(&full)
        .map_err(|e| TransportError::InvalidEndpoint(format!("{full}: {e}")))
}

/// Maps an http(s) REST base onto the matching ws(s) scheme.
fn swap_scheme(api_base: &str) -> Result<String, TransportError> {
    let url = Url::parse(api_base).map_err(|e| {
        TransportError::InvalidEndpoint(format!("{api_base}: {e}"))
    })?;
    let scheme = match url.scheme() {
        "https" | "wss" => "wss",
        "http" | "ws" => "ws",
        other => {
            return Err(TransportError::InvalidEndpoint(format!(
                "unsupported scheme: {other}"
            )));
        }
    };
    let host = url.host_str().ok_or_else(|| {
        TransportError::InvalidEndpoint(format!("{api_base}: no host"))
    })?;
    Ok(match url.port() {
        Some(port) => format!("{scheme}://{host}:{port}"),
        None => format!("{scheme}://{host}"),
    })
}

// =========================================================================
// Tests
// =========================================================================

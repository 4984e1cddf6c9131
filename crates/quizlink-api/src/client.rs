//! The REST client.
//!
//! Every call goes through the same pipeline: build the URL under
//! `/api/{namespace}`, attach `Content-Type` and (best-effort) the host
//! bearer token, apply the client-wide timeout, then map the response —
//! 2xx bodies decode into their typed shape, everything else becomes an
//! [`ApiError::Http`] whose message follows the `detail` → body →
//! `HTTP {status}` preference order.

use std::sync::RwLock;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::types::*;
use crate::ApiError;

/// Path namespace under which the backend mounts its REST routes.
pub const API_NAMESPACE: &str = "quiz";

/// Environment variable consulted for the backend base URL.
pub const API_URL_ENV: &str = "QUIZLINK_API_URL";

const DEFAULT_API_BASE: &str = "http://localhost:8000";

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// ApiConfig
// ---------------------------------------------------------------------------

/// Configuration for an [`ApiClient`].
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Backend origin, e.g. `https://quiz.example.com`. The
    /// `/api/{namespace}` prefix is appended per request.
    pub base_url: String,

    /// Applied to every request via the underlying HTTP client. A
    /// request that exceeds it fails with [`ApiError::TimedOut`]
    /// instead of hanging.
    pub request_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl ApiConfig {
    /// Default config with the base URL taken from `QUIZLINK_API_URL`
    /// when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(base) = std::env::var(API_URL_ENV) {
            if !base.is_empty() {
                config.base_url = base;
            }
        }
        config
    }
}

// ---------------------------------------------------------------------------
// ApiClient
// ---------------------------------------------------------------------------

/// Typed client for the quiz backend's REST surface.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    bearer: RwLock<Option<String>>,
}

impl ApiClient {
    /// Builds a client from `QUIZLINK_API_URL` / defaults.
    pub fn new() -> Result<Self, ApiError> {
        Self::with_config(ApiConfig::from_env())
    }

    pub fn with_config(config: ApiConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(ApiError::Request)?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            bearer: RwLock::new(None),
        })
    }

    /// Sets (or clears) the host bearer token. Attached best-effort:
    /// requests without one are sent unauthenticated, not rejected.
    pub fn set_bearer_token(&self, token: Option<String>) {
        if let Ok(mut bearer) = self.bearer.write() {
            *bearer = token;
        }
    }

    // -- Sessions ----------------------------------------------------------

    /// `GET /sessions`. Tolerant of a bare array or a
    /// `{"sessions": [...]}` wrapper; anything else is an empty list.
    pub async fn list_sessions(&self) -> Result<Vec<SessionSummary>, ApiError> {
        let value: Value = self.get("/sessions").await?;
        list_from_value(value, "sessions")
    }

    /// `POST /sessions`.
    pub async fn create_session(
        &self,
        body: &NewSession,
    ) -> Result<SessionCreated, ApiError> {
        self.post("/sessions", body).await
    }

    /// `GET /sessions/{code}`.
    pub async fn get_session(
        &self,
        code: &str,
    ) -> Result<SessionDetail, ApiError> {
        self.get(&format!("/sessions/{code}")).await
    }

    /// `POST /sessions/{code}/start`.
    pub async fn start_session(&self, code: &str) -> Result<(), ApiError> {
        self.post_no_body(&format!("/sessions/{code}/start")).await
    }

    /// `POST /sessions/{code}/end`.
    pub async fn end_session(&self, code: &str) -> Result<(), ApiError> {
        self.post_no_body(&format!("/sessions/{code}/end")).await
    }

    /// `POST /sessions/{code}/join`.
    pub async fn join_session(
        &self,
        code: &str,
        display_name: &str,
    ) -> Result<JoinedSession, ApiError> {
        self.post(
            &format!("/sessions/{code}/join"),
            &serde_json::json!({ "display_name": display_name }),
        )
        .await
    }

    /// `POST /sessions/{code}/reconnect`.
    pub async fn reconnect_session(
        &self,
        code: &str,
        player_token: &str,
    ) -> Result<ReconnectStatus, ApiError> {
        self.post(
            &format!("/sessions/{code}/reconnect"),
            &serde_json::json!({ "player_token": player_token }),
        )
        .await
    }

    // -- Question banks ----------------------------------------------------

    /// `GET /questions/banks`, tolerant like [`Self::list_sessions`].
    pub async fn list_question_banks(
        &self,
    ) -> Result<Vec<QuestionBankSummary>, ApiError> {
        let value: Value = self.get("/questions/banks").await?;
        list_from_value(value, "banks")
    }

    /// `POST /questions/banks`.
    pub async fn create_question_bank(
        &self,
        body: &NewQuestionBank,
    ) -> Result<QuestionBank, ApiError> {
        self.post("/questions/banks", body).await
    }

    /// `GET /questions/banks/{id}`.
    pub async fn get_question_bank(
        &self,
        id: &str,
    ) -> Result<QuestionBank, ApiError> {
        self.get(&format!("/questions/banks/{id}")).await
    }

    /// `POST /questions/banks/{id}/questions`.
    pub async fn add_question(
        &self,
        bank_id: &str,
        body: &NewQuestion,
    ) -> Result<BankQuestion, ApiError> {
        self.post(&format!("/questions/banks/{bank_id}/questions"), body)
            .await
    }

    // -- Request pipeline --------------------------------------------------

    fn url(&self, path: &str) -> String {
        format!("{}/api/{API_NAMESPACE}{path}", self.base_url)
    }

    fn bearer_token(&self) -> Option<String> {
        self.bearer.read().ok().and_then(|bearer| bearer.clone())
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, ApiError> {
        let mut request = self
            .http
            .get(self.url(path))
            .header("Content-Type", "application/json");
        if let Some(token) = self.bearer_token() {
            request = request.bearer_auth(token);
        }
        let response =
            request.send().await.map_err(ApiError::from_reqwest)?;
        decode_response(response).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let mut request = self
            .http
            .post(self.url(path))
            .header("Content-Type", "application/json")
            .json(body);
        if let Some(token) = self.bearer_token() {
            request = request.bearer_auth(token);
        }
        let response =
            request.send().await.map_err(ApiError::from_reqwest)?;
        decode_response(response).await
    }

    async fn post_no_body(&self, path: &str) -> Result<(), ApiError> {
        let mut request = self
            .http
            .post(self.url(path))
            .header("Content-Type", "application/json");
        if let Some(token) = self.bearer_token() {
            request = request.bearer_auth(token);
        }
        let response =
            request.send().await.map_err(ApiError::from_reqwest)?;

        let status = response.status().as_u16();
        if (200..300).contains(&status) {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Http {
            status,
            message: error_message(status, &body),
        })
    }
}

async fn decode_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ApiError> {
    let status = response.status().as_u16();
    let body = response.text().await.map_err(ApiError::from_reqwest)?;

    if !(200..300).contains(&status) {
        tracing::debug!(status, "API call failed");
        return Err(ApiError::Http {
            status,
            message: error_message(status, &body),
        });
    }
    serde_json::from_str(&body).map_err(ApiError::Decode)
}

/// Extracts the user-facing message from an error response body:
/// a JSON `detail` string, else the raw body text, else `HTTP {status}`.
fn error_message(status: u16, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(detail) = value.get("detail").and_then(Value::as_str) {
            return detail.to_string();
        }
    }
    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    format!("HTTP {status}")
}

/// Pulls a typed list out of a bare array or a `{key: [...]}` wrapper;
/// anything else is an empty list, not an error.
fn list_from_value<T: DeserializeOwned>(
    value: Value,
    key: &str,
) -> Result<Vec<T>, ApiError> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove(key) {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };
    serde_json::from_value(Value::Array(items)).map_err(ApiError::Decode)
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! The response-mapping helpers are pure; socket-level behavior is
    //! covered by `tests/http.rs` against a loopback server.

    use super::*;

    // =====================================================================
    // error_message() — preference order
    // =====================================================================

    #[test]
    fn test_error_message_prefers_detail_field() {
        let message =
            error_message(400, r#"{"detail":"Session is full"}"#);
        assert_eq!(message, "Session is full");
    }

    #[test]
    fn test_error_message_falls_back_to_raw_body() {
        assert_eq!(
            error_message(500, "upstream exploded"),
            "upstream exploded"
        );
        // JSON body without a string `detail` is still raw text.
        assert_eq!(
            error_message(500, r#"{"error":"nope"}"#),
            r#"{"error":"nope"}"#
        );
        assert_eq!(error_message(500, r#"{"detail":42}"#), r#"{"detail":42}"#);
    }

    #[test]
    fn test_error_message_falls_back_to_status() {
        assert_eq!(error_message(503, ""), "HTTP 503");
        assert_eq!(error_message(502, "  \n"), "HTTP 502");
    }

    // =====================================================================
    // list_from_value() — wrapper tolerance
    // =====================================================================

    fn session_rows(value: Value) -> Vec<SessionSummary> {
        list_from_value(value, "sessions").expect("should decode")
    }

    #[test]
    fn test_list_decodes_bare_array() {
        let rows = session_rows(serde_json::json!([
            {"code": "ABC123", "name": "quiz"}
        ]));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].code, "ABC123");
    }

    #[test]
    fn test_list_decodes_wrapped_array() {
        let rows = session_rows(serde_json::json!({
            "sessions": [{"code": "ABC123", "name": "quiz"}]
        }));
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_list_empty_object_yields_empty_list() {
        // `{}` has neither shape; that is an empty list, not an error.
        assert!(session_rows(serde_json::json!({})).is_empty());
    }

    #[test]
    fn test_list_wrapper_with_wrong_key_yields_empty_list() {
        let rows = session_rows(serde_json::json!({
            "rooms": [{"code": "ABC123", "name": "quiz"}]
        }));
        assert!(rows.is_empty());
    }

    #[test]
    fn test_list_non_collection_yields_empty_list() {
        assert!(session_rows(serde_json::json!(null)).is_empty());
        assert!(session_rows(serde_json::json!("sessions")).is_empty());
    }

    #[test]
    fn test_list_bad_row_is_a_decode_error() {
        let result: Result<Vec<SessionSummary>, _> = list_from_value(
            serde_json::json!([{"code": 7}]),
            "sessions",
        );
        assert!(matches!(result, Err(ApiError::Decode(_))));
    }

    // =====================================================================
    // URL building
    // =====================================================================

    #[test]
    fn test_url_joins_base_namespace_and_path() {
        let client = ApiClient::with_config(ApiConfig {
            base_url: "http://localhost:8000/".into(),
            ..ApiConfig::default()
        })
        .expect("client");
        assert_eq!(
            client.url("/sessions/ABC123/join"),
            "http://localhost:8000/api/quiz/sessions/ABC123/join"
        );
    }
}

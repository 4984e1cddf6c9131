//! REST client for the quiz backend.
//!
//! Covers the surface the socket does not push: session CRUD and
//! lifecycle, player join/reconnect, and question banks, all under
//! `/api/{namespace}`.
//!
//! Calls reject with [`ApiError`] on failure — the UI layer catches and
//! renders; there is no retry machinery here beyond each request's own
//! timeout. Pair with `quizlink-fetch` for caching and de-duplication.

mod client;
mod error;
mod types;

pub use client::{
    ApiClient, ApiConfig, API_NAMESPACE, API_URL_ENV,
    DEFAULT_REQUEST_TIMEOUT,
};
pub use error::ApiError;
pub use types::{
    BankQuestion, JoinedSession, NewQuestion, NewQuestionBank, NewSession,
    QuestionBank, QuestionBankSummary, ReconnectStatus, SessionCreated,
    SessionDetail, SessionSummary,
};

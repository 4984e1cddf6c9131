//! Unified error type for the quizlink SDK.

use quizlink_api::ApiError;
use quizlink_fetch::FetchError;
use quizlink_protocol::ProtocolError;
use quizlink_session::SessionError;
use quizlink_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `quizlink` meta-crate, you deal with this single
/// error type instead of importing errors from each sub-crate.
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum QuizlinkError {
    /// A transport-level error (connect, send, recv, endpoint).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, typed decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-store error.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A REST error (timeout, HTTP status, decode).
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A fetch-cache error.
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

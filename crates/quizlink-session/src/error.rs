//! Error types for the session layer.

/// Errors that can occur while managing the client-held session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The identity record could not be serialized for persistence.
    #[error("failed to encode session record: {0}")]
    Encode(serde_json::Error),
}

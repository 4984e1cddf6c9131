//! Error types for the fetch layer.

/// Errors surfaced by [`FetchCache::run`](crate::FetchCache::run).
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The operation itself failed; its message captured as a string.
    /// Never cached — the next run retries immediately.
    #[error("{0}")]
    Operation(String),

    /// The cached value under this key was stored as a different type.
    /// Two call sites sharing a key must agree on what it holds.
    #[error("cached value for key {key:?} has a different type")]
    TypeMismatch { key: String },

    /// The in-flight request for this key died without settling.
    #[error("in-flight request for key {0:?} was abandoned")]
    Abandoned(String),
}

//! Snapshot fetching for quizlink: TTL caching, in-flight
//! de-duplication, and polling.
//!
//! Some state — the session list, question banks — is pulled over REST
//! rather than pushed over the socket. This crate wraps those pulls:
//!
//! - [`FetchCache`] — an injectable service holding the TTL result
//!   cache and the in-flight registry, keyed by caller-chosen strings.
//! - [`Fetcher`] — one activated fetch with observable
//!   `{data, loading, error}` state, refetch, and an optional poll
//!   timer that dies with its consumer.
//! - [`FetchError`] — what can go wrong.
//!
//! The cache is explicit state with an explicit lifecycle: results are
//! dropped only by TTL expiry or the `clear` calls, never implicitly.

mod cache;
mod error;
mod fetcher;

pub use cache::FetchCache;
pub use error::FetchError;
pub use fetcher::{FetchState, Fetcher, FetcherBuilder};

//! Client-held player session management for quizlink.
//!
//! This crate remembers who the local player is across reconnects and
//! reloads, with a hard line between two kinds of state:
//!
//! 1. **Identity metadata** ([`PlayerIdentity`]) — id, display name,
//!    session code, team. Persisted through a pluggable
//!    [`SessionStorage`] for rejoin UX.
//! 2. **The bearer token** — kept only in [`SessionStore`] memory with a
//!    4-hour expiry. It never reaches persisted storage.
//!
//! # How it fits in the stack
//!
//! ```text
//! Connection layer (above) ← takes credentials from the live session
//!     ↕
//! Session layer (this crate) ← owns identity + token lifetime
//!     ↕
//! Platform storage (below) ← sees identity metadata only
//! ```

mod error;
mod storage;
mod store;
mod types;

pub use error::SessionError;
pub use storage::{MemoryStorage, SessionStorage};
pub use store::{SessionStore, IDENTITY_STORAGE_KEY};
pub use types::{PlayerIdentity, PlayerSession, SessionConfig};

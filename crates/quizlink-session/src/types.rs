//! Session types: what the client remembers about its own player.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for the client-held session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long a bearer token stays usable after it was saved.
    ///
    /// Default: 4 hours. Set to zero to treat every saved token as
    /// already expired (useful in tests).
    pub token_ttl: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            token_ttl: Duration::from_secs(4 * 60 * 60),
        }
    }
}

// ---------------------------------------------------------------------------
// PlayerIdentity / PlayerSession
// ---------------------------------------------------------------------------

/// The non-sensitive identity record.
///
/// This is the only part of a session that may be persisted — it carries
/// nothing that grants access, just enough to offer a "rejoin as Ada?"
/// flow after a reload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerIdentity {
    pub player_id: String,
    pub display_name: String,
    pub session_code: String,
    #[serde(default)]
    pub team: Option<String>,
}

/// A live session: identity plus the in-memory bearer token.
///
/// Never serialized. The token field exists only between
/// [`SessionStore::save`](crate::SessionStore::save) and expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerSession {
    pub identity: PlayerIdentity,
    pub token: String,
}

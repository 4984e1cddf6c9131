//! The session store: token in memory, identity in storage.
//!
//! Two invariants define this type:
//!
//! 1. The bearer token is held only in the store's own memory, with an
//!    expiry stamp. It is never written through the [`SessionStorage`],
//!    under any key.
//! 2. Reading an expired session clears *everything* — the in-memory
//!    token and the persisted identity record — and reports "no
//!    session".
//!
//! ```text
//! save() ──→ [token in memory, identity persisted]
//!                │                        │
//!            get() before TTL         get() after TTL
//!                │                        │
//!                ▼                        ▼
//!          PlayerSession          None + everything cleared
//! ```

use std::sync::Mutex;
use std::time::Instant;

use crate::{
    PlayerIdentity, PlayerSession, SessionConfig, SessionError,
    SessionStorage,
};

/// Storage key for the persisted identity record.
pub const IDENTITY_STORAGE_KEY: &str = "quizlink.player_session";

struct SecretToken {
    token: String,
    issued_at: Instant,
}

/// Client-held session state for one player.
pub struct SessionStore<S: SessionStorage> {
    storage: S,
    config: SessionConfig,
    secret: Mutex<Option<SecretToken>>,
}

impl<S: SessionStorage> SessionStore<S> {
    /// Creates a store with the default 4-hour token TTL.
    pub fn new(storage: S) -> Self {
        Self::with_config(storage, SessionConfig::default())
    }

    pub fn with_config(storage: S, config: SessionConfig) -> Self {
        Self {
            storage,
            config,
            secret: Mutex::new(None),
        }
    }

    /// Saves a freshly joined session: identity goes to storage, the
    /// token stays in memory with a new expiry stamp.
    ///
    /// # Errors
    /// [`SessionError::Encode`] if the identity record cannot be
    /// serialized; nothing is stored in that case.
    pub fn save(
        &self,
        identity: PlayerIdentity,
        token: String,
    ) -> Result<(), SessionError> {
        let record = serde_json::to_string(&identity)
            .map_err(SessionError::Encode)?;
        self.storage.set(IDENTITY_STORAGE_KEY, &record);

        if let Ok(mut secret) = self.secret.lock() {
            *secret = Some(SecretToken {
                token,
                issued_at: Instant::now(),
            });
        }

        tracing::debug!(
            player_id = %identity.player_id,
            session_code = %identity.session_code,
            "player session saved"
        );
        Ok(())
    }

    /// Returns the live session, or `None` when there is none or the
    /// token has expired. An expired read clears all backing state.
    pub fn get(&self) -> Option<PlayerSession> {
        let token = self.live_token()?;
        let identity = self.peek_identity()?;
        Some(PlayerSession { identity, token })
    }

    /// The in-memory token if it is still within its TTL; an expired
    /// token clears the whole session on the way out.
    fn live_token(&self) -> Option<String> {
        {
            let guard = self.secret.lock().ok()?;
            match guard.as_ref() {
                None => return None,
                Some(s)
                    if s.issued_at.elapsed() < self.config.token_ttl =>
                {
                    return Some(s.token.clone());
                }
                Some(_) => {} // expired — fall through, guard released
            }
        }
        tracing::debug!("player token expired, clearing session");
        self.clear();
        None
    }

    /// The persisted identity record, ignoring token state.
    ///
    /// This is the rejoin-UX surface: after a reload the token memory is
    /// gone, but the identity may still be here so the UI can offer to
    /// reconnect through the REST `reconnect` endpoint.
    pub fn peek_identity(&self) -> Option<PlayerIdentity> {
        let record = self.storage.get(IDENTITY_STORAGE_KEY)?;
        match serde_json::from_str(&record) {
            Ok(identity) => Some(identity),
            Err(e) => {
                // A corrupt record is useless for rejoin; drop it.
                tracing::debug!(error = %e, "discarding unreadable session record");
                self.storage.remove(IDENTITY_STORAGE_KEY);
                None
            }
        }
    }

    /// Drops the token and the persisted record.
    pub fn clear(&self) {
        if let Ok(mut secret) = self.secret.lock() {
            *secret = None;
        }
        self.storage.remove(IDENTITY_STORAGE_KEY);
    }

    /// The underlying storage, for callers that share it with other
    /// state.
    pub fn storage(&self) -> &S {
        &self.storage
    }
}

// =========================================================================
// Tests
// =========================================================================

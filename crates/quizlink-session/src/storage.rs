//! The persisted-storage seam.
//!
//! Platform shells (a browser tab's sessionStorage, a desktop config
//! dir) implement [`SessionStorage`]; the store itself never cares where
//! the bytes land. The contract is a plain string KV store — and by the
//! session layer's rules it only ever receives non-sensitive identity
//! records, never tokens.

use std::collections::HashMap;
use std::sync::Mutex;

/// A string key/value store scoped to one client instance.
pub trait SessionStorage: Send + Sync + 'static {
    /// Reads the value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str);

    /// Removes the value stored under `key`, if any.
    fn remove(&self, key: &str);
}

/// An in-memory [`SessionStorage`].
///
/// The default backing for native clients and tests; lives exactly as
/// long as the process, which matches the tab-session scope the web
/// client gets from its platform storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of everything currently persisted. Diagnostic surface —
    /// the token-never-persisted guarantee is asserted against this.
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .ok()
            .and_then(|entries| entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }
}

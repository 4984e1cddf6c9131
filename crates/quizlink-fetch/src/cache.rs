//! The fetch cache: TTL results plus in-flight de-duplication.
//!
//! A [`FetchCache`] is an explicit, injectable service — construct one
//! per client (or per test) and clone the handle wherever snapshots are
//! fetched. There are no module-level statics; two call sites share
//! state only by sharing a handle and a key.
//!
//! Keys are caller-chosen strings and the contract is cooperative: call
//! sites using the same key are implicitly coupled and must agree on
//! what the key means, including its value type.
//!
//! Per key, the lifecycle is:
//!
//! ```text
//! empty ──run──→ fetching ──ok──→ cached (until TTL lapses)
//!                    │
//!                    └────err──→ errored (next run retries immediately)
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::FetchError;

type CachedValue = Arc<dyn Any + Send + Sync>;
type Settlement = Result<CachedValue, String>;
type SettlementRx = watch::Receiver<Option<Settlement>>;

struct CachedEntry {
    value: CachedValue,
    stored_at: Instant,
}

#[derive(Default)]
struct Inner {
    results: Mutex<HashMap<String, CachedEntry>>,
    in_flight: Mutex<HashMap<String, SettlementRx>>,
}

/// Shared fetch state: a TTL result cache and an in-flight registry.
///
/// Cloning is cheap and clones share state.
#[derive(Clone, Default)]
pub struct FetchCache {
    inner: Arc<Inner>,
}

impl FetchCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `operation` through the cache.
    ///
    /// - With a `key` and a positive `ttl`, a result younger than the
    ///   TTL is served from cache and `operation` is not invoked.
    /// - With a `key`, a request already in flight for that key is
    ///   awaited instead of starting a second one; every waiter observes
    ///   the same settlement.
    /// - Otherwise `operation` runs. Keyed operations run as spawned
    ///   tasks so an abandoned caller cannot cancel a request other
    ///   callers are waiting on; the settlement is cached (on success,
    ///   when `ttl` is positive) and the in-flight slot is released
    ///   regardless of outcome.
    ///
    /// # Errors
    /// - [`FetchError::Operation`] — the operation failed; its message
    ///   is captured as a string. Failures are never cached.
    /// - [`FetchError::TypeMismatch`] — the cached value for this key
    ///   was stored as a different type by another call site.
    /// - [`FetchError::Abandoned`] — the in-flight task died without
    ///   settling (it panicked).
    pub async fn run<T, E, F, Fut>(
        &self,
        key: Option<&str>,
        ttl: Option<Duration>,
        operation: F,
    ) -> Result<Arc<T>, FetchError>
    where
        T: Send + Sync + 'static,
        E: std::fmt::Display,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let Some(key) = key else {
            // No key: nothing to share, nothing to cache.
            let value = operation()
                .await
                .map_err(|e| FetchError::Operation(e.to_string()))?;
            return Ok(Arc::new(value));
        };

        let ttl = ttl.filter(|ttl| !ttl.is_zero());

        if let Some(ttl) = ttl {
            if let Some(value) = self.fresh(key, ttl) {
                return downcast(key, value);
            }
        }

        let rx = {
            let mut in_flight = lock(&self.inner.in_flight);
            if let Some(rx) = in_flight.get(key) {
                tracing::trace!(key, "joining in-flight request");
                rx.clone()
            } else {
                let (tx, rx) = watch::channel(None);
                in_flight.insert(key.to_string(), rx.clone());
                drop(in_flight);
                self.spawn_operation(key.to_string(), ttl, tx, operation());
                rx
            }
        };

        let value = await_settlement(key, rx).await?;
        downcast(key, value)
    }

    /// Drops the cached result for one key. No effect on a request in
    /// flight.
    pub fn clear_key(&self, key: &str) {
        lock(&self.inner.results).remove(key);
    }

    /// Drops every cached result.
    pub fn clear(&self) {
        lock(&self.inner.results).clear();
    }

    fn fresh(&self, key: &str, ttl: Duration) -> Option<CachedValue> {
        let results = lock(&self.inner.results);
        let entry = results.get(key)?;
        (entry.stored_at.elapsed() < ttl).then(|| Arc::clone(&entry.value))
    }

    fn spawn_operation<T, E, Fut>(
        &self,
        key: String,
        ttl: Option<Duration>,
        tx: watch::Sender<Option<Settlement>>,
        fut: Fut,
    ) where
        T: Send + Sync + 'static,
        E: std::fmt::Display,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let settlement: Settlement = fut
                .await
                .map(|value| Arc::new(value) as CachedValue)
                .map_err(|e| e.to_string());

            if let (Some(ttl), Ok(value)) = (ttl, &settlement) {
                lock(&inner.results).insert(
                    key.clone(),
                    CachedEntry {
                        value: Arc::clone(value),
                        stored_at: Instant::now(),
                    },
                );
                tracing::trace!(key = %key, ttl_ms = ttl.as_millis() as u64, "result cached");
            }
            lock(&inner.in_flight).remove(&key);

            // Waiters read the settlement after the maps are consistent.
            let _ = tx.send(Some(settlement));
        });
    }
}

async fn await_settlement(
    key: &str,
    mut rx: SettlementRx,
) -> Result<CachedValue, FetchError> {
    let settled = rx
        .wait_for(|s| s.is_some())
        .await
        .map_err(|_| FetchError::Abandoned(key.to_string()))?
        .clone();
    match settled {
        Some(Ok(value)) => Ok(value),
        Some(Err(message)) => Err(FetchError::Operation(message)),
        None => Err(FetchError::Abandoned(key.to_string())),
    }
}

fn downcast<T: Send + Sync + 'static>(
    key: &str,
    value: CachedValue,
) -> Result<Arc<T>, FetchError> {
    value.downcast::<T>().map_err(|_| FetchError::TypeMismatch {
        key: key.to_string(),
    })
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    // Lock holders never panic while holding the guard; a poisoned lock
    // here would mean a bug in this module, so recover the data.
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// =========================================================================
// Tests
// =========================================================================

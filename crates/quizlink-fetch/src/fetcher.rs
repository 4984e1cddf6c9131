//! The stateful fetch wrapper: loading/error state, refetch, polling.
//!
//! A [`Fetcher`] binds one operation (plus optional cache key and TTL)
//! to an observable [`FetchState`]. UI state holders read or subscribe
//! to the state; the fetcher owns the poll timer and cancels it when it
//! is dropped, so no update is ever applied on behalf of a consumer
//! that no longer exists.

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::{FetchCache, FetchError};

// ---------------------------------------------------------------------------
// FetchState
// ---------------------------------------------------------------------------

/// Observable snapshot state: the latest data, whether a request is
/// running, and the latest error message.
///
/// `data` survives a failed refetch — the previous snapshot keeps
/// rendering while the error is shown.
#[derive(Debug)]
pub struct FetchState<T> {
    pub data: Option<Arc<T>>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> Clone for FetchState<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            loading: self.loading,
            error: self.error.clone(),
        }
    }
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Fetcher
// ---------------------------------------------------------------------------

type Operation<T> =
    Arc<dyn Fn() -> BoxFuture<'static, Result<T, String>> + Send + Sync>;

/// One activated fetch: operation + key + TTL + observable state.
///
/// Built via [`Fetcher::builder`]; always handled through an `Arc` so
/// the poll timer can hold a weak reference back to it.
pub struct Fetcher<T> {
    cache: FetchCache,
    key: Option<String>,
    ttl: Option<Duration>,
    operation: Operation<T>,
    state_tx: watch::Sender<FetchState<T>>,
    poll_task: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Send + Sync + 'static> Fetcher<T> {
    /// Starts configuring a fetcher over `cache`.
    pub fn builder<F, Fut, E>(
        cache: FetchCache,
        operation: F,
    ) -> FetcherBuilder<T>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: std::fmt::Display,
    {
        FetcherBuilder {
            cache,
            key: None,
            ttl: None,
            poll_interval: None,
            immediate: false,
            operation: Arc::new(move || {
                let fut = operation();
                Box::pin(async move {
                    fut.await.map_err(|e| e.to_string())
                }) as BoxFuture<'static, Result<T, String>>
            }),
        }
    }

    /// The current state snapshot.
    pub fn state(&self) -> FetchState<T> {
        self.state_tx.borrow().clone()
    }

    /// A receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<FetchState<T>> {
        self.state_tx.subscribe()
    }

    /// Runs the operation through the cache and folds the outcome into
    /// the observable state.
    ///
    /// A success replaces `data` and clears `error`; a failure sets
    /// `error` and leaves `data` at its previous value. The cache layer
    /// decides whether the operation actually runs (TTL hit, in-flight
    /// join) — state moves through `loading` either way.
    pub async fn refetch(&self) {
        self.state_tx.send_modify(|state| {
            state.loading = true;
        });

        let operation = Arc::clone(&self.operation);
        let result = self
            .cache
            .run(self.key.as_deref(), self.ttl, move || operation())
            .await;

        self.state_tx.send_modify(|state| {
            state.loading = false;
            match result {
                Ok(value) => {
                    state.data = Some(value);
                    state.error = None;
                }
                Err(FetchError::Operation(message)) => {
                    state.error = Some(message);
                }
                Err(other) => {
                    state.error = Some(other.to_string());
                }
            }
        });
    }

    /// Stops the poll timer, if one is running.
    pub fn stop_polling(&self) {
        if let Ok(mut task) = self.poll_task.lock() {
            if let Some(handle) = task.take() {
                handle.abort();
            }
        }
    }
}

impl<T> Drop for Fetcher<T> {
    fn drop(&mut self) {
        // The timer must not outlive its consumer. The in-flight
        // operation itself is the cache's concern and keeps running.
        if let Ok(mut task) = self.poll_task.lock() {
            if let Some(handle) = task.take() {
                handle.abort();
            }
        }
    }
}

// ---------------------------------------------------------------------------
// FetcherBuilder
// ---------------------------------------------------------------------------

/// Configuration for a [`Fetcher`].
pub struct FetcherBuilder<T> {
    cache: FetchCache,
    key: Option<String>,
    ttl: Option<Duration>,
    poll_interval: Option<Duration>,
    immediate: bool,
    operation: Operation<T>,
}

impl<T: Send + Sync + 'static> FetcherBuilder<T> {
    /// Cache key shared with other call sites fetching the same thing.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// How long a result stays fresh.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Refetches on a repeating timer for the fetcher's lifetime.
    pub fn poll_every(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// Triggers one refetch as soon as the fetcher is built.
    pub fn immediate(mut self, immediate: bool) -> Self {
        self.immediate = immediate;
        self
    }

    /// Builds the fetcher and starts its timers.
    pub fn build(self) -> Arc<Fetcher<T>> {
        let (state_tx, _) = watch::channel(FetchState::default());
        let fetcher = Arc::new(Fetcher {
            cache: self.cache,
            key: self.key,
            ttl: self.ttl,
            operation: self.operation,
            state_tx,
            poll_task: Mutex::new(None),
        });

        if self.immediate {
            let strong = Arc::clone(&fetcher);
            tokio::spawn(async move {
                strong.refetch().await;
            });
        }

        if let Some(interval) = self.poll_interval {
            let weak: Weak<Fetcher<T>> = Arc::downgrade(&fetcher);
            let handle = tokio::spawn(async move {
                let mut ticker = tokio::time::interval(interval);
                ticker.set_missed_tick_behavior(
                    tokio::time::MissedTickBehavior::Skip,
                );
                // interval fires immediately; the first tick is the
                // activation itself, covered by `immediate`.
                ticker.tick().await;
                loop {
                    ticker.tick().await;
                    // Weak upgrade: a dropped fetcher ends the loop
                    // instead of being resurrected by its own timer.
                    let Some(fetcher) = weak.upgrade() else { break };
                    fetcher.refetch().await;
                }
            });
            if let Ok(mut task) = fetcher.poll_task.lock() {
                *task = Some(handle);
            }
        }

        fetcher
    }
}

// =========================================================================
// Tests
// =========================================================================

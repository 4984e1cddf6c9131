//! Reconnection schedule.

use std::time::Duration;

/// Exponential backoff parameters for automatic reconnection.
///
/// The delay before retry `n` (zero-based) is
/// `min(initial_delay × 2ⁿ, max_delay)`; after `max_attempts`
/// consecutive failures the connection goes terminally disconnected.
/// The attempt counter resets to zero on every successful open, so a
/// connection that recovers gets the full schedule back.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    /// Delay before the first retry. Default: 1 s.
    pub initial_delay: Duration,

    /// Ceiling for the doubled delay. Default: 15 s.
    pub max_delay: Duration,

    /// Consecutive failures tolerated before giving up. Default: 10.
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(15_000),
            max_attempts: 10,
        }
    }
}

impl ReconnectPolicy {
    /// The delay scheduled before retry `attempt` (zero-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let initial = self.initial_delay.as_millis() as u64;
        let cap = self.max_delay.as_millis() as u64;
        let doubled =
            initial.saturating_mul(2_u64.saturating_pow(attempt));
        Duration::from_millis(doubled.min(cap))
    }
}

// =========================================================================
// Tests
// =========================================================================

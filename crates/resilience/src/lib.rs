//! # skein-resilience
//!
//! Backoff policy for the workflow engine's attempt loop.
//!
//! The spec (§6, §9) declares `retryDelayMs`/`retryDelayMultiplier` on the
//! workflow configuration but leaves their consumption as an open question
//! ("no code path consumes them"). This crate resolves that question by
//! wiring them into an exponential-backoff [`BackoffPolicy`], in the same
//! shape the reference workspace's retry strategy uses: a base delay, a
//! growth multiplier, a cap, and a deterministic-but-varying jitter so
//! concurrently retrying siblings don't all wake up at the same instant.

use std::time::Duration;

/// Exponential backoff policy between retry attempts.
#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    /// Delay before the first retry (`retryDelayMs`).
    pub base_delay: Duration,
    /// Multiplier applied to the delay on each subsequent attempt
    /// (`retryDelayMultiplier`).
    pub multiplier: f64,
    /// Upper bound on the computed delay, regardless of attempt number.
    pub max_delay: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(0),
            multiplier: 1.0,
            max_delay: Duration::from_secs(60),
        }
    }
}

impl BackoffPolicy {
    /// Build a policy from the workflow configuration's `retryDelayMs` and
    /// `retryDelayMultiplier`.
    #[must_use]
    pub fn new(retry_delay_ms: u64, retry_delay_multiplier: f64) -> Self {
        Self {
            base_delay: Duration::from_millis(retry_delay_ms),
            multiplier: retry_delay_multiplier.max(1.0),
            max_delay: Duration::from_secs(60),
        }
    }

    /// Cap the computed delay at `max_delay`.
    #[must_use]
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Compute the delay before attempt number `attempt` (0-indexed; the
    /// first attempt, `attempt == 0`, never waits).
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 || self.base_delay.is_zero() {
            return Duration::ZERO;
        }
        let factor = self.multiplier.powi(attempt as i32 - 1);
        let millis = (self.base_delay.as_millis() as f64 * factor).min(self.max_delay.as_millis() as f64);
        Duration::from_millis(millis as u64)
    }

    /// Like [`Self::delay_for_attempt`] but with up to 10% jitter added,
    /// so concurrently retrying tasks don't retry in lockstep.
    #[must_use]
    pub fn delay_for_attempt_jittered(&self, attempt: u32) -> Duration {
        let base = self.delay_for_attempt(attempt);
        if base.is_zero() {
            return base;
        }
        let jitter_fraction: f64 = rand::Rng::gen_range(&mut rand::thread_rng(), 0.0..0.1);
        let jitter_millis = (base.as_millis() as f64 * jitter_fraction) as u64;
        base + Duration::from_millis(jitter_millis)
    }
}

//! In-memory admission control for chat messages.
//!
//! DESIGN
//! ======
//! Sliding-window counters backed by `HashMap<String, IdentityWindows>`,
//! keyed by user identity. Two rolling windows are enforced per identity:
//! - Per-minute: 10 messages/60s (burst ceiling)
//! - Per-day: 200 messages/24h (sustained ceiling)
//!
//! Both sequences are pruned on every check, so active identities keep
//! their own state tidy. A rejected attempt is never recorded — rejection
//! must not consume quota. The check and the record happen under a single
//! lock acquisition so concurrent admits for one identity cannot both see
//! the same pre-mutation counts.
//!
//! TRADE-OFFS
//! ==========
//! One mutex guards the whole map. Admission is a few deque operations, so
//! contention at chat-traffic scale is negligible and per-identity lock
//! sharding is not worth the complexity. Identities that go quiet keep an
//! entry until [`RateLimiter::sweep_stale`] drops it (run from the
//! maintenance task).

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

const DEFAULT_PER_MINUTE_LIMIT: usize = 10;
const DEFAULT_MINUTE_WINDOW_SECS: u64 = 60;

const DEFAULT_PER_DAY_LIMIT: usize = 200;
const DEFAULT_DAY_WINDOW_SECS: u64 = 86_400;

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub per_minute_limit: usize,
    pub minute_window: Duration,
    pub per_day_limit: usize,
    pub day_window: Duration,
}

impl RateLimitConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let minute_window_secs =
            env_parse("RATE_LIMIT_MINUTE_WINDOW_SECS", DEFAULT_MINUTE_WINDOW_SECS);
        let day_window_secs = env_parse("RATE_LIMIT_DAY_WINDOW_SECS", DEFAULT_DAY_WINDOW_SECS);

        Self {
            per_minute_limit: env_parse("RATE_LIMIT_PER_MINUTE", DEFAULT_PER_MINUTE_LIMIT),
            minute_window: Duration::from_secs(minute_window_secs),
            per_day_limit: env_parse("RATE_LIMIT_PER_DAY", DEFAULT_PER_DAY_LIMIT),
            day_window: Duration::from_secs(day_window_secs),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            per_minute_limit: DEFAULT_PER_MINUTE_LIMIT,
            minute_window: Duration::from_secs(DEFAULT_MINUTE_WINDOW_SECS),
            per_day_limit: DEFAULT_PER_DAY_LIMIT,
            day_window: Duration::from_secs(DEFAULT_DAY_WINDOW_SECS),
        }
    }
}

fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

// =============================================================================
// ERROR TYPE
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("per-minute message limit exceeded (max {limit} messages/{window_secs}s)")]
    MinuteExceeded { limit: usize, window_secs: u64 },
    #[error("daily message limit exceeded (max {limit} messages/{window_secs}s)")]
    DayExceeded { limit: usize, window_secs: u64 },
}

// =============================================================================
// RATE LIMITER
// =============================================================================

#[derive(Clone)]
pub struct RateLimiter {
    inner: std::sync::Arc<Mutex<HashMap<String, IdentityWindows>>>,
    config: RateLimitConfig,
}

#[derive(Default)]
struct IdentityWindows {
    /// Admission timestamps within the minute window.
    minute: VecDeque<Instant>,
    /// Admission timestamps within the day window.
    day: VecDeque<Instant>,
}

impl RateLimiter {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RateLimitConfig::from_env())
    }

    #[must_use]
    pub fn with_config(config: RateLimitConfig) -> Self {
        Self { inner: std::sync::Arc::new(Mutex::new(HashMap::new())), config }
    }

    /// Check both rolling windows for the identity, then record the message.
    ///
    /// # Errors
    ///
    /// Returns the tripped ceiling when the identity is over either window.
    /// Rejection is an expected outcome, not a fault — nothing is recorded
    /// for a rejected attempt.
    pub fn admit(&self, identity: &str) -> Result<(), RateLimitError> {
        self.admit_at(identity, Instant::now())
    }

    /// Internal: check + record with explicit timestamp (for testing).
    fn admit_at(&self, identity: &str, now: Instant) -> Result<(), RateLimitError> {
        let mut inner = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let cfg = self.config;

        let windows = inner.entry(identity.to_owned()).or_default();
        prune_window(&mut windows.minute, now, cfg.minute_window);
        prune_window(&mut windows.day, now, cfg.day_window);

        if windows.minute.len() >= cfg.per_minute_limit {
            return Err(RateLimitError::MinuteExceeded {
                limit: cfg.per_minute_limit,
                window_secs: cfg.minute_window.as_secs(),
            });
        }
        if windows.day.len() >= cfg.per_day_limit {
            return Err(RateLimitError::DayExceeded {
                limit: cfg.per_day_limit,
                window_secs: cfg.day_window.as_secs(),
            });
        }

        // Record in both windows — every admitted message counts once in each.
        windows.minute.push_back(now);
        windows.day.push_back(now);

        Ok(())
    }

    /// Drop identities whose newest admission predates the day window.
    ///
    /// Pruning happens on read, so an entry older than the day window holds
    /// no admission information and evicting it cannot change any `admit`
    /// outcome. Returns the number of identities removed.
    pub fn sweep_stale(&self) -> usize {
        self.sweep_stale_at(Instant::now())
    }

    fn sweep_stale_at(&self, now: Instant) -> usize {
        let mut inner = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let horizon = self.config.day_window;
        let before = inner.len();
        // The day deque always holds the newest admission: every admit pushes
        // to both windows and the day window prunes last.
        inner.retain(|_, windows| {
            windows
                .day
                .back()
                .is_some_and(|&newest| now.duration_since(newest) <= horizon)
        });
        before - inner.len()
    }

    /// Number of identities currently tracked.
    #[must_use]
    pub fn tracked_identities(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn prune_window(deque: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(&front) = deque.front() {
        if now.duration_since(front) > window {
            deque.pop_front();
        } else {
            break;
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[path = "rate_limit_test.rs"]
mod tests;

use super::*;

use crate::rate_limit::{RateLimitConfig, RateLimiter};
use crate::sessions::{SessionConfig, SessionRegistry, SweepPolicy};
use crate::state::test_helpers::{test_app_state, test_pool};

#[tokio::test]
async fn sweep_on_quiet_state_reports_zero() {
    let state = test_app_state();
    let report = run_sweep_once(&state);
    assert_eq!(report, SweepReport { sessions_evicted: 0, identities_dropped: 0 });
}

#[tokio::test]
async fn sweep_reclaims_idle_sessions_and_stale_identities() {
    // Zero-width windows: anything older than "right now" is reclaimable.
    let state = crate::state::AppState::with_components(
        test_pool(),
        None,
        RateLimiter::with_config(RateLimitConfig {
            day_window: Duration::ZERO,
            ..RateLimitConfig::default()
        }),
        SessionRegistry::with_config(SessionConfig {
            idle_timeout: Duration::ZERO,
            sweep_policy: SweepPolicy::Connected,
            ..SessionConfig::default()
        }),
    );

    let (tx, mut rx) = tokio::sync::mpsc::channel(8);
    state.sessions.connect("alice", tx);
    assert!(state.rate_limiter.admit("alice").is_ok());

    tokio::time::sleep(Duration::from_millis(10)).await;

    let report = run_sweep_once(&state);
    assert_eq!(report, SweepReport { sessions_evicted: 1, identities_dropped: 1 });
    assert!(!state.sessions.is_connected("alice"));
    assert_eq!(state.rate_limiter.tracked_identities(), 0);

    // Eviction closed the session's channel.
    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn fresh_state_survives_the_sweep() {
    let state = test_app_state();
    let (tx, _rx) = tokio::sync::mpsc::channel(8);
    state.sessions.connect("alice", tx);
    assert!(state.rate_limiter.admit("alice").is_ok());

    let report = run_sweep_once(&state);
    assert_eq!(report, SweepReport { sessions_evicted: 0, identities_dropped: 0 });
    assert!(state.sessions.is_connected("alice"));
    assert_eq!(state.rate_limiter.tracked_identities(), 1);
}

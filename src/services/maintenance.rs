//! Background maintenance — idle-session and stale-identity sweeps.
//!
//! DESIGN
//! ======
//! One task owns both in-memory stores' housekeeping: the session registry
//! sheds idle connections and the rate limiter forgets identities whose
//! admissions have all aged out. Connected sockets past the idle timeout
//! are closed even when the TCP link is healthy; clients reconnect on
//! demand. The sweep interval trades eviction latency against wakeups — an
//! hour matches the default idle timeout.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::info;

use crate::state::AppState;

const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 3_600;

fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// Counts from one maintenance pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub sessions_evicted: usize,
    pub identities_dropped: usize,
}

/// Run one sweep over both in-memory stores.
pub fn run_sweep_once(state: &AppState) -> SweepReport {
    let report = SweepReport {
        sessions_evicted: state.sessions.sweep_idle(),
        identities_dropped: state.rate_limiter.sweep_stale(),
    };
    if report.sessions_evicted > 0 || report.identities_dropped > 0 {
        info!(
            sessions = report.sessions_evicted,
            identities = report.identities_dropped,
            "maintenance sweep evicted state"
        );
    }
    report
}

/// Spawn the periodic maintenance task.
pub fn spawn_maintenance_task(state: AppState) -> JoinHandle<()> {
    let sweep_interval_secs = env_parse("SESSION_SWEEP_INTERVAL_SECS", DEFAULT_SWEEP_INTERVAL_SECS);
    info!(sweep_interval_secs, "maintenance sweep configured");
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(sweep_interval_secs)).await;
            run_sweep_once(&state);
        }
    })
}

#[cfg(test)]
#[path = "maintenance_test.rs"]
mod tests;

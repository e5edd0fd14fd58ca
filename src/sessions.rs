//! Live websocket session registry.
//!
//! DESIGN
//! ======
//! One identity owns at most one live session. The registry maps identity to
//! a `Connection` holding the outbound event sender plus bookkeeping times.
//! Connecting under an identity that already has a session replaces it: the
//! old sender is dropped, which closes the old session's event channel and
//! unwinds its socket task. Each connection carries a generation token so a
//! stale socket's cleanup (or a failed delivery) can never tear down a newer
//! connection that reused the identity.
//!
//! TRADE-OFFS
//! ==========
//! A std `Mutex` guards the map; every critical section is a handful of map
//! operations and never awaits. Delivery awaits the channel send *outside*
//! the lock on a snapshot of the sender, and the idle sweep collects victims
//! under the lock but drops their senders after releasing it, so a slow
//! client can never stall connects or other deliveries.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::events::ChatEvent;

const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 3_600;
const DEFAULT_SEND_TIMEOUT_MS: u64 = 5_000;

// =============================================================================
// CONFIG
// =============================================================================

/// Which age the idle sweep measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepPolicy {
    /// Age since the session connected. Long-lived quiet sessions get
    /// reclaimed even while the socket is healthy.
    Connected,
    /// Age since the last inbound message. Active sessions live forever.
    Activity,
}

impl SweepPolicy {
    fn from_env() -> Self {
        match std::env::var("SESSION_SWEEP_POLICY").ok().as_deref() {
            Some("activity") => Self::Activity,
            Some("connected") | None => Self::Connected,
            Some(other) => {
                warn!(policy = %other, "unknown SESSION_SWEEP_POLICY, using connected");
                Self::Connected
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// Sessions idle past this age are evicted by the sweep.
    pub idle_timeout: Duration,
    pub sweep_policy: SweepPolicy,
    /// Ceiling on how long one delivery may block on a full channel.
    pub send_timeout: Duration,
}

impl SessionConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            idle_timeout: Duration::from_secs(env_parse(
                "SESSION_IDLE_TIMEOUT_SECS",
                DEFAULT_IDLE_TIMEOUT_SECS,
            )),
            sweep_policy: SweepPolicy::from_env(),
            send_timeout: Duration::from_millis(env_parse(
                "SESSION_SEND_TIMEOUT_MS",
                DEFAULT_SEND_TIMEOUT_MS,
            )),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS),
            sweep_policy: SweepPolicy::Connected,
            send_timeout: Duration::from_millis(DEFAULT_SEND_TIMEOUT_MS),
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
// TYPES
// =============================================================================

struct Connection {
    tx: mpsc::Sender<ChatEvent>,
    /// Generation token. Eviction paths compare against it so they only
    /// remove the connection they were started for.
    token: Uuid,
    connected_at: Instant,
    last_activity: Instant,
}

impl Connection {
    fn age_basis(&self, policy: SweepPolicy) -> Instant {
        match policy {
            SweepPolicy::Connected => self.connected_at,
            SweepPolicy::Activity => self.last_activity,
        }
    }
}

/// Proof of a registration, handed to the socket task that owns it.
/// Disconnecting through the handle is a no-op once the identity has been
/// taken over by a newer connection.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    identity: String,
    token: Uuid,
}

// =============================================================================
// REGISTRY
// =============================================================================

#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<Mutex<HashMap<String, Connection>>>,
    config: SessionConfig,
}

impl SessionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(SessionConfig::from_env())
    }

    #[must_use]
    pub fn with_config(config: SessionConfig) -> Self {
        Self { sessions: Arc::new(Mutex::new(HashMap::new())), config }
    }

    /// Register a live session, replacing any existing one for the identity.
    ///
    /// The replaced connection's sender is dropped outside the lock; its
    /// socket task observes the closed channel and shuts down.
    pub fn connect(&self, identity: &str, tx: mpsc::Sender<ChatEvent>) -> SessionHandle {
        let token = Uuid::new_v4();
        let now = Instant::now();
        let replaced = {
            let mut sessions = self.lock();
            sessions.insert(
                identity.to_owned(),
                Connection { tx, token, connected_at: now, last_activity: now },
            )
        };
        if replaced.is_some() {
            info!(%identity, "replaced existing session");
        } else {
            debug!(%identity, "session connected");
        }
        SessionHandle { identity: identity.to_owned(), token }
    }

    /// Remove the session the handle was issued for. Idempotent: the handle
    /// may be stale (already disconnected, evicted, or replaced) and the
    /// call is then a no-op.
    pub fn disconnect(&self, handle: &SessionHandle) {
        let removed = {
            let mut sessions = self.lock();
            match sessions.get(&handle.identity) {
                Some(conn) if conn.token == handle.token => sessions.remove(&handle.identity),
                _ => None,
            }
        };
        if removed.is_some() {
            debug!(identity = %handle.identity, "session disconnected");
        }
    }

    /// Deliver an event to the identity's live session.
    ///
    /// Returns `false` when no session exists or delivery fails. A failed or
    /// timed-out delivery evicts the connection it was attempted against —
    /// the channel is gone or the client has stopped draining it — so later
    /// sends fail fast instead of re-blocking.
    pub async fn send(&self, identity: &str, event: ChatEvent) -> bool {
        let snapshot = {
            let sessions = self.lock();
            sessions
                .get(identity)
                .map(|conn| (conn.tx.clone(), conn.token))
        };
        let Some((tx, token)) = snapshot else {
            return false;
        };

        let delivered = match tokio::time::timeout(self.config.send_timeout, tx.send(event)).await {
            Ok(Ok(())) => true,
            Ok(Err(_)) => {
                debug!(%identity, "session channel closed during delivery");
                false
            }
            Err(_) => {
                warn!(
                    %identity,
                    timeout_ms = self.config.send_timeout.as_millis(),
                    "session delivery timed out"
                );
                false
            }
        };

        if !delivered {
            self.evict_if_current(identity, token);
        }
        delivered
    }

    /// Record inbound activity for the identity, if it has a live session.
    pub fn touch(&self, identity: &str) {
        let mut sessions = self.lock();
        if let Some(conn) = sessions.get_mut(identity) {
            conn.last_activity = Instant::now();
        }
    }

    /// Evict sessions idle past the configured timeout. Returns the number
    /// evicted.
    pub fn sweep_idle(&self) -> usize {
        self.sweep_idle_at(Instant::now())
    }

    fn sweep_idle_at(&self, now: Instant) -> usize {
        let timeout = self.config.idle_timeout;
        let policy = self.config.sweep_policy;

        // PHASE 1: collect victims under the lock.
        let victims: Vec<(String, Connection)> = {
            let mut sessions = self.lock();
            let stale: Vec<String> = sessions
                .iter()
                .filter(|(_, conn)| now.duration_since(conn.age_basis(policy)) > timeout)
                .map(|(identity, _)| identity.clone())
                .collect();
            stale
                .into_iter()
                .filter_map(|identity| {
                    sessions.remove(&identity).map(|conn| (identity, conn))
                })
                .collect()
        };

        // PHASE 2: drop senders outside the lock. Each drop closes that
        // session's event channel, which unwinds its socket task.
        let evicted = victims.len();
        for (identity, _conn) in victims {
            info!(%identity, "swept idle session");
        }
        evicted
    }

    /// Number of live sessions.
    #[must_use]
    pub fn connected_count(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_connected(&self, identity: &str) -> bool {
        self.lock().contains_key(identity)
    }

    fn evict_if_current(&self, identity: &str, token: Uuid) {
        let evicted = {
            let mut sessions = self.lock();
            match sessions.get(identity) {
                Some(conn) if conn.token == token => sessions.remove(identity),
                _ => None,
            }
        };
        if evicted.is_some() {
            warn!(%identity, "evicted session after failed delivery");
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Connection>> {
        self.sessions
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[path = "sessions_test.rs"]
mod tests;

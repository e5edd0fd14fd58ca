use super::*;

use tokio::time::timeout;

use crate::events::ChatEvent;

fn test_registry() -> SessionRegistry {
    SessionRegistry::with_config(SessionConfig {
        idle_timeout: Duration::from_secs(3_600),
        sweep_policy: SweepPolicy::Connected,
        send_timeout: Duration::from_millis(500),
    })
}

#[tokio::test]
async fn connect_then_send_delivers() {
    let registry = test_registry();
    let (tx, mut rx) = mpsc::channel(8);
    registry.connect("alice", tx);

    assert!(registry.send("alice", ChatEvent::error("ping")).await);

    let event = timeout(Duration::from_millis(500), rx.recv())
        .await
        .expect("should receive within timeout")
        .expect("channel should be open");
    assert_eq!(event, ChatEvent::error("ping"));
}

#[tokio::test]
async fn send_without_session_returns_false() {
    let registry = test_registry();
    assert!(!registry.send("nobody", ChatEvent::error("ping")).await);
}

#[tokio::test]
async fn reconnect_replaces_and_closes_the_old_channel() {
    let registry = test_registry();
    let (tx1, mut rx1) = mpsc::channel(8);
    let (tx2, mut rx2) = mpsc::channel(8);

    registry.connect("alice", tx1);
    registry.connect("alice", tx2);
    assert_eq!(registry.connected_count(), 1);

    // The first connection's sender was dropped on replacement.
    assert!(
        timeout(Duration::from_millis(500), rx1.recv())
            .await
            .expect("closed channel should resolve immediately")
            .is_none()
    );

    // Delivery goes to the replacement.
    assert!(registry.send("alice", ChatEvent::error("ping")).await);
    let event = timeout(Duration::from_millis(500), rx2.recv())
        .await
        .expect("should receive within timeout")
        .expect("channel should be open");
    assert_eq!(event, ChatEvent::error("ping"));
}

#[tokio::test]
async fn disconnect_is_idempotent() {
    let registry = test_registry();
    let (tx, _rx) = mpsc::channel(8);
    let handle = registry.connect("alice", tx);

    registry.disconnect(&handle);
    assert!(!registry.is_connected("alice"));

    // Second disconnect through the same handle is a no-op.
    registry.disconnect(&handle);
    assert!(!registry.is_connected("alice"));
    assert_eq!(registry.connected_count(), 0);
}

#[tokio::test]
async fn stale_handle_cannot_disconnect_a_newer_session() {
    let registry = test_registry();
    let (tx1, _rx1) = mpsc::channel(8);
    let (tx2, _rx2) = mpsc::channel(8);

    let old_handle = registry.connect("alice", tx1);
    let _new_handle = registry.connect("alice", tx2);

    // The old socket's cleanup races the reconnect; its handle must not
    // tear down the takeover.
    registry.disconnect(&old_handle);
    assert!(registry.is_connected("alice"));
}

#[tokio::test]
async fn failed_delivery_evicts_the_session() {
    let registry = test_registry();
    let (tx, rx) = mpsc::channel(8);
    registry.connect("alice", tx);
    drop(rx);

    assert!(!registry.send("alice", ChatEvent::error("ping")).await);
    assert!(!registry.is_connected("alice"));
    // The entry is gone, so later sends fail fast.
    assert!(!registry.send("alice", ChatEvent::error("again")).await);
}

#[tokio::test]
async fn timed_out_delivery_evicts_the_session() {
    let registry = SessionRegistry::with_config(SessionConfig {
        send_timeout: Duration::from_millis(50),
        ..SessionConfig::default()
    });
    // Capacity-one channel that nobody drains: the first send fills it, the
    // second blocks until the timeout trips.
    let (tx, _rx) = mpsc::channel(1);
    registry.connect("alice", tx);

    assert!(registry.send("alice", ChatEvent::error("one")).await);
    assert!(!registry.send("alice", ChatEvent::error("two")).await);
    assert!(!registry.is_connected("alice"));
}

#[tokio::test]
async fn sweep_evicts_past_the_idle_timeout_but_not_before() {
    let registry = test_registry();
    let (tx, mut rx) = mpsc::channel(8);
    let start = Instant::now();
    registry.connect("alice", tx);

    // One second shy of the timeout: survives.
    assert_eq!(registry.sweep_idle_at(start + Duration::from_secs(3_599)), 0);
    assert!(registry.is_connected("alice"));

    // One second past: evicted, and the channel closes.
    assert_eq!(registry.sweep_idle_at(start + Duration::from_secs(3_601)), 1);
    assert!(!registry.is_connected("alice"));
    assert!(
        timeout(Duration::from_millis(500), rx.recv())
            .await
            .expect("closed channel should resolve immediately")
            .is_none()
    );
}

#[tokio::test]
async fn connected_policy_ignores_activity() {
    let registry = SessionRegistry::with_config(SessionConfig {
        idle_timeout: Duration::from_secs(60),
        sweep_policy: SweepPolicy::Connected,
        ..SessionConfig::default()
    });
    let (tx, _rx) = mpsc::channel(8);
    let start = Instant::now();
    registry.connect("alice", tx);
    registry.touch("alice");

    // Recent activity does not matter: the session's total age governs.
    assert_eq!(registry.sweep_idle_at(start + Duration::from_secs(61)), 1);
    assert!(!registry.is_connected("alice"));
}

#[tokio::test]
async fn activity_policy_measures_the_last_inbound_message() {
    let registry = SessionRegistry::with_config(SessionConfig {
        idle_timeout: Duration::from_secs(60),
        sweep_policy: SweepPolicy::Activity,
        ..SessionConfig::default()
    });
    let (tx, _rx) = mpsc::channel(8);
    let start = Instant::now();
    registry.connect("alice", tx);

    // Simulate activity two minutes in.
    {
        let mut sessions = registry.sessions.lock().unwrap();
        sessions.get_mut("alice").unwrap().last_activity = start + Duration::from_secs(120);
    }

    // Thirty seconds after that activity: survives despite being 150s old.
    assert_eq!(registry.sweep_idle_at(start + Duration::from_secs(150)), 0);
    assert!(registry.is_connected("alice"));

    // Sixty-one seconds after the activity: evicted.
    assert_eq!(registry.sweep_idle_at(start + Duration::from_secs(181)), 1);
    assert!(!registry.is_connected("alice"));
}

#[tokio::test]
async fn sweep_is_a_noop_on_fresh_sessions() {
    let registry = test_registry();
    let (tx, _rx) = mpsc::channel(8);
    registry.connect("alice", tx);

    assert_eq!(registry.sweep_idle(), 0);
    assert!(registry.is_connected("alice"));
}

#[tokio::test]
async fn touch_on_unknown_identity_is_a_noop() {
    let registry = test_registry();
    registry.touch("nobody");
    assert_eq!(registry.connected_count(), 0);
}

#[tokio::test]
async fn concurrent_reconnects_leave_exactly_one_session() {
    let registry = test_registry();

    let mut handles = Vec::new();
    for _ in 0..16 {
        let registry = registry.clone();
        handles.push(tokio::spawn(async move {
            let (tx, _rx) = mpsc::channel(8);
            registry.connect("alice", tx);
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(registry.connected_count(), 1);
}

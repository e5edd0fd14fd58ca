//! WebSocket handler — per-user coaching stream.
//!
//! DESIGN
//! ======
//! The path segment names the identity; connecting registers a
//! per-connection channel in the session registry (replacing any previous
//! connection for that identity) and enters a `select!` loop:
//! - Inbound text frames → parse `{"message": ...}`, run the coach,
//!   persist fire-and-forget, queue the reply.
//! - Queued events → serialize + write to the socket.
//!
//! Every outbound event travels through the registry's send path, so a
//! stalled or dead client evicts its session the same way on every route.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → `connect` (kicks any prior connection for the identity)
//! 2. Client text frame → `touch` → admission → coach → reply event
//! 3. Close, socket error, or closed event channel (the registry dropped
//!    this connection's sender on replacement, idle sweep, or failed
//!    delivery) → `disconnect`; the handle's token keeps a replacement
//!    connection safe from the old socket's cleanup

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::Response;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::events::{ChatEvent, InboundMessage};
use crate::services::coach::{self, CoachError};
use crate::services::history;
use crate::state::AppState;

/// Outbound events buffered per connection. Replies queue here while the
/// socket writes; a client that stops draining hits the registry's send
/// timeout and is evicted.
const EVENT_BUFFER: usize = 32;

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state, user_id))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState, user_id: String) {
    let (client_tx, mut client_rx) = mpsc::channel::<ChatEvent>(EVENT_BUFFER);
    let handle = state.sessions.connect(&user_id, client_tx);

    info!(%user_id, "ws: client connected");

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(msg) = msg else { break };
                let Ok(msg) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        process_inbound_text(&state, &user_id, &text).await;
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            event = client_rx.recv() => {
                // `None` means the registry dropped this connection's sender:
                // replaced, swept idle, or evicted after a failed delivery.
                // The session is gone, so close the transport with it.
                let Some(event) = event else { break };
                if send_event(&mut socket, &user_id, &event).await.is_err() {
                    break;
                }
            }
        }
    }

    state.sessions.disconnect(&handle);
    info!(%user_id, "ws: client disconnected");
}

// =============================================================================
// INBOUND MESSAGES
// =============================================================================

/// Handle one inbound text frame.
///
/// Replies are delivered through the session registry rather than written
/// to the socket directly, so tests and the socket loop share one delivery
/// path and eviction-on-failure applies everywhere.
async fn process_inbound_text(state: &AppState, user_id: &str, text: &str) {
    state.sessions.touch(user_id);

    let inbound: InboundMessage = match serde_json::from_str(text) {
        Ok(m) => m,
        Err(e) => {
            warn!(%user_id, error = %e, "ws: invalid inbound frame");
            state
                .sessions
                .send(user_id, ChatEvent::error(format!("invalid message: {e}")))
                .await;
            return;
        }
    };

    let reply = match coach::generate_reply(state, user_id, &inbound.message).await {
        Ok(reply) => reply,
        Err(CoachError::RateLimited(e)) => {
            info!(%user_id, "ws: message rate limited");
            state
                .sessions
                .send(user_id, ChatEvent::rate_limited(e.to_string()))
                .await;
            return;
        }
    };

    persist_fire_and_forget(&state.pool, user_id, &inbound.message, &reply);

    if !state
        .sessions
        .send(user_id, ChatEvent::ai_response(reply))
        .await
    {
        warn!(%user_id, "ws: reply dropped, session gone");
    }
}

// =============================================================================
// HELPERS
// =============================================================================

async fn send_event(socket: &mut WebSocket, user_id: &str, event: &ChatEvent) -> Result<(), ()> {
    let json = match serde_json::to_string(event) {
        Ok(j) => j,
        Err(e) => {
            warn!(%user_id, error = %e, "ws: failed to serialize event");
            return Err(());
        }
    };
    socket
        .send(Message::Text(json.into()))
        .await
        .map_err(|_| ())
}

/// Spawn a fire-and-forget task to persist a completed exchange.
fn persist_fire_and_forget(pool: &sqlx::PgPool, user_id: &str, message: &str, response: &str) {
    let pool = pool.clone();
    let user_id = user_id.to_string();
    let message = message.to_string();
    let response = response.to_string();
    tokio::spawn(async move {
        if let Err(e) = history::record_exchange(&pool, &user_id, &message, &response).await {
            warn!(%user_id, error = %e, "exchange persist failed");
        }
    });
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;

//! Wire types for the chat websocket.
//!
//! DESIGN
//! ======
//! Clients send `{"message": "..."}` text frames. The server replies with
//! tagged JSON events, discriminated by a `type` field so clients dispatch
//! without sniffing payload shapes. `ChatEvent` is the single outbound type:
//! everything a live session can receive flows through its registry channel,
//! so delivery and eviction logic never inspect the payload.
//!
//! Timestamps are carried as RFC 3339 strings on the wire and as epoch
//! milliseconds in storage; the conversion helpers live here next to the
//! types that use them.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// =============================================================================
// TYPES
// =============================================================================

/// Inbound client frame.
#[derive(Debug, Deserialize)]
pub struct InboundMessage {
    pub message: String,
}

/// Outbound server event, tagged for client-side dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    /// Coach reply to one inbound message.
    AiResponse { message: String, timestamp: String },
    /// Message refused by the rate limiter; the connection stays open.
    RateLimited { detail: String },
    /// In-band failure surfaced to the client (bad frame, upstream error).
    Error { detail: String },
}

impl ChatEvent {
    /// Build a reply event stamped with the current time.
    #[must_use]
    pub fn ai_response(message: impl Into<String>) -> Self {
        Self::AiResponse { message: message.into(), timestamp: now_rfc3339() }
    }

    #[must_use]
    pub fn rate_limited(detail: impl Into<String>) -> Self {
        Self::RateLimited { detail: detail.into() }
    }

    #[must_use]
    pub fn error(detail: impl Into<String>) -> Self {
        Self::Error { detail: detail.into() }
    }
}

// =============================================================================
// TIMESTAMPS
// =============================================================================

/// Current time as milliseconds since Unix epoch.
#[must_use]
pub fn now_ms() -> i64 {
    let Ok(dur) = std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}

/// Render stored epoch milliseconds as an RFC 3339 string.
#[must_use]
pub fn ms_to_rfc3339(ms: i64) -> String {
    let ts = OffsetDateTime::from_unix_timestamp_nanos(i128::from(ms) * 1_000_000)
        .unwrap_or(OffsetDateTime::UNIX_EPOCH);
    ts.format(&Rfc3339).unwrap_or_default()
}

/// Current UTC time as an RFC 3339 string.
#[must_use]
pub fn now_rfc3339() -> String {
    ms_to_rfc3339(now_ms())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[path = "events_test.rs"]
mod tests;

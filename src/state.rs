//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! owns every piece of live state — the pool, the rate limiter, the session
//! registry, and the optional LLM client. Construction wires them in
//! explicitly; nothing hides in globals, so tests and embedders run as many
//! independent instances as they like.

use std::sync::Arc;

use sqlx::PgPool;

use crate::llm::LlmChat;
use crate::rate_limit::RateLimiter;
use crate::sessions::SessionRegistry;

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum — all inner fields are Arc-wrapped or Clone.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    /// Optional LLM client. `None` if LLM env vars are not configured; the
    /// coach then falls back to canned replies.
    pub llm: Option<Arc<dyn LlmChat>>,
    /// In-memory admission control for chat messages.
    pub rate_limiter: RateLimiter,
    /// Live websocket sessions, one per identity.
    pub sessions: SessionRegistry,
}

impl AppState {
    /// Build state with components configured from the environment.
    #[must_use]
    pub fn new(pool: PgPool, llm: Option<Arc<dyn LlmChat>>) -> Self {
        Self::with_components(pool, llm, RateLimiter::new(), SessionRegistry::new())
    }

    /// Build state from explicitly constructed components.
    #[must_use]
    pub fn with_components(
        pool: PgPool,
        llm: Option<Arc<dyn LlmChat>>,
        rate_limiter: RateLimiter,
        sessions: SessionRegistry,
    ) -> Self {
        Self { pool, llm, rate_limiter, sessions }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
#[path = "state_helpers_test.rs"]
pub mod test_helpers;

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;

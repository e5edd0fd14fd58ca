//! Chat routes — banner, one-shot messages, history reads.
//!
//! Error responses carry a JSON `{"detail": ...}` body so the frontend can
//! show the reason; the rate limiter's message rides through verbatim.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::events::ms_to_rfc3339;
use crate::services::coach::{self, CoachError};
use crate::services::history::{self, ChatExchange, HistoryError};
use crate::state::AppState;

const DEFAULT_HISTORY_LIMIT: i64 = 50;

/// Error reply: status plus a `{"detail": ...}` body.
type ErrorResponse = (StatusCode, Json<serde_json::Value>);

fn error_response(status: StatusCode, detail: impl Into<String>) -> ErrorResponse {
    (status, Json(json!({ "detail": detail.into() })))
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Deserialize)]
pub struct SendMessageBody {
    pub user_id: String,
    pub message: String,
}

/// Stored exchange as the API serializes it.
#[derive(Debug, Serialize)]
pub struct ChatMessageResponse {
    pub id: Uuid,
    pub user_id: String,
    pub message: String,
    pub response: String,
    pub timestamp: String,
    pub message_type: String,
}

fn to_response(exchange: ChatExchange) -> ChatMessageResponse {
    ChatMessageResponse {
        id: exchange.id,
        user_id: exchange.user_id,
        message: exchange.message,
        response: exchange.response,
        timestamp: ms_to_rfc3339(exchange.ts),
        message_type: exchange.message_type,
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `GET /api/` — service banner.
pub async fn banner() -> Json<serde_json::Value> {
    Json(json!({ "message": "Fitness AI Coach API - Powered by Gemini" }))
}

/// `POST /api/chat` — generate a reply and persist the exchange.
pub async fn send_message(
    State(state): State<AppState>,
    Json(body): Json<SendMessageBody>,
) -> Result<Json<ChatMessageResponse>, ErrorResponse> {
    let reply = coach::generate_reply(&state, &body.user_id, &body.message)
        .await
        .map_err(coach_error_to_response)?;

    let exchange = history::record_exchange(&state.pool, &body.user_id, &body.message, &reply)
        .await
        .map_err(|e| {
            error!(user_id = %body.user_id, error = %e, "chat: exchange persist failed");
            history_error_to_response(&e)
        })?;

    Ok(Json(to_response(exchange)))
}

#[derive(Deserialize)]
pub struct HistoryParams {
    pub limit: Option<i64>,
}

/// `GET /api/chat/{user_id}` — recent exchanges, newest first.
pub async fn chat_history(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<ChatMessageResponse>>, ErrorResponse> {
    let rows = history::recent_exchanges(&state.pool, &user_id, effective_limit(params.limit))
        .await
        .map_err(|e| {
            error!(%user_id, error = %e, "chat: history read failed");
            history_error_to_response(&e)
        })?;

    Ok(Json(rows.into_iter().map(to_response).collect()))
}

// =============================================================================
// HELPERS
// =============================================================================

/// Clamp the client-supplied history limit; absent means 50.
fn effective_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_HISTORY_LIMIT).max(0)
}

fn coach_error_to_response(err: CoachError) -> ErrorResponse {
    match err {
        CoachError::RateLimited(e) => error_response(StatusCode::TOO_MANY_REQUESTS, e.to_string()),
    }
}

fn history_error_to_response(err: &HistoryError) -> ErrorResponse {
    match err {
        HistoryError::Database(_) => {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
        }
    }
}

#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;

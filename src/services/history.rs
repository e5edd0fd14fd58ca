//! Chat history — persistence and retrieval of coaching exchanges.
//!
//! DESIGN
//! ======
//! One row per exchange: the user's message and the coach's reply are
//! written together after the reply is generated, so history never holds a
//! question without its answer. Reads are per-user, newest first, capped by
//! the caller.

use sqlx::PgPool;
use uuid::Uuid;

use crate::events::now_ms;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Row returned from chat history queries.
#[derive(Debug, Clone)]
pub struct ChatExchange {
    pub id: Uuid,
    pub user_id: String,
    pub message: String,
    pub response: String,
    pub message_type: String,
    /// Milliseconds since Unix epoch.
    pub ts: i64,
}

// =============================================================================
// OPERATIONS
// =============================================================================

/// Persist one completed exchange.
///
/// # Errors
///
/// Returns a database error if the insert fails.
pub async fn record_exchange(
    pool: &PgPool,
    user_id: &str,
    message: &str,
    response: &str,
) -> Result<ChatExchange, HistoryError> {
    let exchange = ChatExchange {
        id: Uuid::new_v4(),
        user_id: user_id.to_string(),
        message: message.to_string(),
        response: response.to_string(),
        message_type: "user".to_string(),
        ts: now_ms(),
    };

    sqlx::query(
        "INSERT INTO chat_messages (id, user_id, message, response, message_type, ts)
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(exchange.id)
    .bind(&exchange.user_id)
    .bind(&exchange.message)
    .bind(&exchange.response)
    .bind(&exchange.message_type)
    .bind(exchange.ts)
    .execute(pool)
    .await?;

    Ok(exchange)
}

/// Fetch the user's most recent exchanges, newest first.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn recent_exchanges(
    pool: &PgPool,
    user_id: &str,
    limit: i64,
) -> Result<Vec<ChatExchange>, HistoryError> {
    let rows = sqlx::query_as::<_, (Uuid, String, String, String, String, i64)>(
        "SELECT id, user_id, message, response, message_type, ts
         FROM chat_messages
         WHERE user_id = $1
         ORDER BY ts DESC, id
         LIMIT $2",
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, user_id, message, response, message_type, ts)| ChatExchange {
            id,
            user_id,
            message,
            response,
            message_type,
            ts,
        })
        .collect())
}

#[cfg(test)]
#[path = "history_test.rs"]
mod tests;

use super::*;

use crate::rate_limit::RateLimitError;
use crate::state::test_helpers::test_app_state;

#[tokio::test]
async fn banner_names_the_service() {
    let Json(value) = banner().await;
    let message = value["message"].as_str().unwrap_or_default();
    assert!(message.contains("Fitness"));
}

#[test]
fn effective_limit_defaults_to_fifty() {
    assert_eq!(effective_limit(None), 50);
}

#[test]
fn effective_limit_passes_explicit_values() {
    assert_eq!(effective_limit(Some(7)), 7);
}

#[test]
fn effective_limit_clamps_negative_values() {
    assert_eq!(effective_limit(Some(-3)), 0);
}

#[test]
fn exchange_timestamp_renders_as_rfc3339() {
    let exchange = ChatExchange {
        id: uuid::Uuid::new_v4(),
        user_id: "alice".into(),
        message: "q".into(),
        response: "a".into(),
        message_type: "user".into(),
        ts: 1_700_000_000_000,
    };
    let body = to_response(exchange);

    assert_eq!(body.timestamp, "2023-11-14T22:13:20Z");
    assert_eq!(body.user_id, "alice");
    assert_eq!(body.message_type, "user");
}

#[test]
fn rate_limit_rejection_maps_to_429_with_detail() {
    let err =
        CoachError::RateLimited(RateLimitError::MinuteExceeded { limit: 10, window_secs: 60 });
    let (status, Json(body)) = coach_error_to_response(err);

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    let detail = body["detail"].as_str().unwrap_or_default();
    assert!(detail.contains("limit"));
}

#[tokio::test]
async fn throttled_send_message_returns_429_before_touching_storage() {
    let state = test_app_state();
    // Exhaust the per-minute budget up front.
    for _ in 0..10 {
        state.rate_limiter.admit("alice").expect("within budget");
    }

    let result = send_message(
        State(state),
        Json(SendMessageBody { user_id: "alice".into(), message: "one more".into() }),
    )
    .await;

    let (status, Json(body)) = result.expect_err("expected rejection");
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert!(body["detail"].as_str().unwrap_or_default().contains("limit"));
}

#[tokio::test]
async fn send_message_persist_failure_maps_to_500() {
    // The test pool points at a dead port, so the reply generates fine (no
    // LLM, rule-based responder) and only the insert fails.
    let state = test_app_state();

    let result = send_message(
        State(state),
        Json(SendMessageBody { user_id: "alice".into(), message: "hello".into() }),
    )
    .await;

    let (status, Json(body)) = result.expect_err("expected persist failure");
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["detail"], "internal error");
}

#[tokio::test]
async fn chat_history_read_failure_maps_to_500() {
    let state = test_app_state();

    let result = chat_history(
        State(state),
        Path("alice".into()),
        Query(HistoryParams { limit: None }),
    )
    .await;

    let (status, _) = result.expect_err("expected read failure");
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

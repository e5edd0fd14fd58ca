//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! This module binds the REST endpoints and the per-user websocket under a
//! single Axum router. Everything client-facing lives under `/api`; the
//! liveness probe sits at the root for load balancers.

pub mod chat;
pub mod profiles;
pub mod ws;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// REST + websocket routes used by the chat frontend.
pub fn api_routes(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/", get(chat::banner))
        .route("/api/chat", post(chat::send_message))
        .route("/api/chat/{user_id}", get(chat::chat_history))
        .route(
            "/api/profile/{user_id}",
            get(profiles::get_profile).put(profiles::update_profile),
        )
        .route("/api/profile", post(profiles::create_profile))
        .route("/api/ws/{user_id}", get(ws::handle_ws))
        .route("/healthz", get(healthz))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

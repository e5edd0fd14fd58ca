mod db;
mod events;
mod llm;
mod rate_limit;
mod routes;
mod services;
mod sessions;
mod state;

use std::sync::Arc;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "8000".into())
        .parse()
        .expect("invalid PORT");

    let pool = db::init_pool(&database_url)
        .await
        .expect("database init failed");

    // Initialize LLM client (non-fatal: the coach falls back to the
    // rule-based responder when config is missing).
    let llm: Option<Arc<dyn llm::LlmChat>> = match llm::LlmClient::from_env() {
        Ok(client) => {
            tracing::info!(model = client.model(), "LLM client initialized");
            Some(Arc::new(client))
        }
        Err(e) => {
            tracing::warn!(error = %e, "LLM client not configured, using rule-based replies");
            None
        }
    };

    let state = state::AppState::new(pool, llm);

    // Spawn the periodic limiter/session sweep.
    let _maintenance = services::maintenance::spawn_maintenance_task(state.clone());

    let app = routes::api_routes(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "fitcoach listening");
    axum::serve(listener, app).await.expect("server failed");
}

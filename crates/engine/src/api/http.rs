//! HTTP routes.

use axum::{extract::State, routing::get, Json, Router};
use std::sync::Arc;

use crate::app::App;
use crate::use_cases::LobbyStats;

/// Create all HTTP routes.
pub fn routes() -> Router<Arc<App>> {
    Router::new()
        .route("/", get(health))
        .route("/api/health", get(health))
        .route("/api/stats", get(stats))
}

async fn health() -> &'static str {
    "OK"
}

async fn stats(State(app): State<Arc<App>>) -> Json<LobbyStats> {
    Json(app.lobby.lock().await.stats())
}

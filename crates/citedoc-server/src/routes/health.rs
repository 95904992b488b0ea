//! Liveness route.

use std::sync::Arc;

use axum::routing::get;
use axum::{Json, Router};

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/", get(health))
}

/// GET / — service banner.
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "PDF Q&A Claude Backend with Citations",
        "status": "OK",
    }))
}

//! HTTP route handlers.

pub mod ask;
pub mod documents;
pub mod health;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::{Json, Router};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{error, warn, Level};

use citedoc_core::{CorsPolicy, Error, Result};

use crate::state::AppState;

/// Build the main Axum router with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        .merge(health::routes())
        .nest("/api", api_routes())
        .layer(DefaultBodyLimit::max(state.config.body_limit_bytes()))
        .layer(cors_layer(&state.config.cors));

    // Per-request logging outside production only
    if !state.config.is_production() {
        router = router.layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );
    }

    router.with_state(state)
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(documents::routes())
        .merge(ask::routes())
}

fn cors_layer(policy: &CorsPolicy) -> CorsLayer {
    match policy {
        CorsPolicy::MirrorOrigin => CorsLayer::very_permissive(),
        CorsPolicy::AllowList(origins) => {
            let origins: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|origin| match HeaderValue::from_str(origin) {
                    Ok(value) => Some(value),
                    Err(_) => {
                        warn!("Ignoring invalid CORS origin: {}", origin);
                        None
                    }
                })
                .collect();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([header::CONTENT_TYPE])
                .allow_credentials(true)
        }
    }
}

/// Map a handler outcome to a JSON response, logging server-side failures.
fn respond(
    context: &str,
    result: Result<serde_json::Value>,
) -> (StatusCode, Json<serde_json::Value>) {
    match result {
        Ok(body) => (StatusCode::OK, Json(body)),
        Err(e) => {
            if e.is_client_error() {
                warn!("{}: {}", context, e);
            } else {
                error!("{}: {}", context, e);
            }
            error_response(&e)
        }
    }
}

fn error_response(err: &Error) -> (StatusCode, Json<serde_json::Value>) {
    let status = if err.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(serde_json::json!({ "error": err.detail() })))
}

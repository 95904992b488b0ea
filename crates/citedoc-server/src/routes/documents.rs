//! Document upload route.

use std::sync::Arc;

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use tracing::debug;

use citedoc_core::{Error, Result};

use super::respond;
use crate::state::AppState;
use crate::upload;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/upload-pdf", post(upload_pdf))
}

/// POST /api/upload-pdf — send a PDF to the provider and relay its confirmation.
async fn upload_pdf(
    State(state): State<Arc<AppState>>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> (StatusCode, Json<serde_json::Value>) {
    respond("Error processing PDF", confirm_upload(&state, multipart).await)
}

async fn confirm_upload(
    state: &AppState,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<serde_json::Value> {
    let form = upload::accept(multipart, &state.upload_policy).await?;
    let file = form
        .file
        .ok_or_else(|| Error::Validation("No PDF file uploaded".into()))?;

    debug!(
        "Received {} ({} bytes, {}) at {}",
        file.original_name,
        file.size_bytes,
        file.mime_type,
        file.temporary_path().display()
    );

    let document_id = file.original_name.clone();
    let bytes = file.take_bytes().await?;

    let content = state.provider.submit_document_for_confirmation(&bytes).await?;

    Ok(serde_json::json!({
        "message": "PDF processed successfully with citations enabled",
        "documentId": document_id,
        "content": content,
    }))
}

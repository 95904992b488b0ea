//! Question routes — with an uploaded document, or plain text.

use std::sync::Arc;

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Form, FromRequest, Multipart, Request, State};
use axum::http::{header, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;

use citedoc_core::{Error, Result};
use citedoc_provider::DocumentQuery;

use super::respond;
use crate::state::AppState;
use crate::upload;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ask-with-citations", post(ask_with_citations))
        .route("/ask-simple", post(ask_simple))
}

#[derive(Debug, Deserialize)]
pub struct AskSimpleRequest {
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
}

// ---------------------------------------------------------------
// With citations
// ---------------------------------------------------------------

/// POST /api/ask-with-citations — multipart `pdf` + `question`.
async fn ask_with_citations(
    State(state): State<Arc<AppState>>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> (StatusCode, Json<serde_json::Value>) {
    respond("Error with Claude citations", cited_answer(&state, multipart).await)
}

async fn cited_answer(
    state: &AppState,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<serde_json::Value> {
    let form = upload::accept(multipart, &state.upload_policy).await?;

    let query = DocumentQuery::from_question(form.text("question"))?;
    let file = form
        .file
        .ok_or_else(|| Error::Validation("PDF file is required".into()))?;
    let query = query.with_document(file.take_bytes().await?);

    let answer = state
        .provider
        .answer_with_citations(query.document(), &query.question)
        .await?;

    Ok(serde_json::json!({
        "answer": answer.answer_text,
        "citations": answer.citations,
        "textBlocks": answer.text_blocks,
        "usage": answer.usage,
    }))
}

// ---------------------------------------------------------------
// Simple
// ---------------------------------------------------------------

/// POST /api/ask-simple — JSON or urlencoded `{question, context?}`.
async fn ask_simple(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> (StatusCode, Json<serde_json::Value>) {
    respond("Error with simple ask", simple_answer(&state, request).await)
}

async fn simple_answer(state: &AppState, request: Request) -> Result<serde_json::Value> {
    let req = read_simple_request(request).await?;
    let query = DocumentQuery::from_question(req.question.as_deref())?;

    let answer = state
        .provider
        .answer_simple(&query.question, req.context.as_deref())
        .await?;

    Ok(serde_json::json!({
        "answer": answer.answer_text,
        "usage": answer.usage,
    }))
}

/// Decode the body as a urlencoded form when it says so, JSON otherwise.
async fn read_simple_request(request: Request) -> Result<AskSimpleRequest> {
    let is_form = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false);

    if is_form {
        let Form(req) = Form::<AskSimpleRequest>::from_request(request, &())
            .await
            .map_err(|e| Error::Validation(e.body_text()))?;
        Ok(req)
    } else {
        let Json(req) = Json::<AskSimpleRequest>::from_request(request, &())
            .await
            .map_err(|e| Error::Validation(e.body_text()))?;
        Ok(req)
    }
}

//! The seam between HTTP handlers and the LLM provider.

use async_trait::async_trait;
use citedoc_core::Result;

use crate::types::{AnswerResult, SimpleAnswer};

/// Question answering over PDF documents.
///
/// Every call is a single request/response against the provider. Failures
/// surface as [`citedoc_core::Error::Provider`] and are never retried.
#[async_trait]
pub trait DocumentProvider: Send + Sync {
    /// Send a document with a fixed confirmation instruction and return the
    /// provider's acknowledgement text.
    async fn submit_document_for_confirmation(&self, document: &[u8]) -> Result<String>;

    /// Answer `question` from `document`, keeping the citations attached to
    /// the first content block.
    async fn answer_with_citations(&self, document: &[u8], question: &str)
        -> Result<AnswerResult>;

    /// Answer a plain-text question with optional free-form context.
    async fn answer_simple(&self, question: &str, context: Option<&str>) -> Result<SimpleAnswer>;
}

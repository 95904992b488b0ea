//! Anthropic Messages API client.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, error};

use citedoc_core::{Config, Error, Result};

use crate::prompts::{citation_prompt, simple_prompt, CONFIRMATION_INSTRUCTION};
use crate::provider::DocumentProvider;
use crate::types::{
    AnswerResult, ErrorEnvelope, Message, MessagesRequest, MessagesResponse, SimpleAnswer,
};

pub const ANTHROPIC_VERSION: &str = "2023-06-01";

pub const CONFIRMATION_MAX_TOKENS: u32 = 1000;
pub const CITATION_MAX_TOKENS: u32 = 1500;
pub const SIMPLE_MAX_TOKENS: u32 = 1000;

/// Talks to `POST {base_url}/v1/messages` with a fixed model.
#[derive(Clone)]
pub struct AnthropicClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl AnthropicClient {
    pub fn new(base_url: &str, api_key: &str, model: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.base_url, &config.api_key, &config.model)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn create_message(&self, message: Message, max_tokens: u32) -> Result<MessagesResponse> {
        let request = MessagesRequest::single(&self.model, max_tokens, message);
        let url = format!("{}/v1/messages", self.base_url);

        debug!("Sending message to {} with model {} (max_tokens {})", url, self.model, max_tokens);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Provider(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Provider(e.to_string()))?;

        if !status.is_success() {
            let message = provider_error_message(status, &body);
            error!("Provider returned {}: {}", status, message);
            return Err(Error::Provider(message));
        }

        serde_json::from_str(&body)
            .map_err(|e| Error::Provider(format!("Malformed provider response: {}", e)))
    }
}

#[async_trait]
impl DocumentProvider for AnthropicClient {
    async fn submit_document_for_confirmation(&self, document: &[u8]) -> Result<String> {
        let message = Message::user_with_document(document, CONFIRMATION_INSTRUCTION.to_string());
        self.create_message(message, CONFIRMATION_MAX_TOKENS)
            .await?
            .into_text()
    }

    async fn answer_with_citations(
        &self,
        document: &[u8],
        question: &str,
    ) -> Result<AnswerResult> {
        let message = Message::user_with_document(document, citation_prompt(question));
        let answer = self
            .create_message(message, CITATION_MAX_TOKENS)
            .await?
            .into_answer()?;
        debug!("Answer carries {} citations", answer.citations.len());
        Ok(answer)
    }

    async fn answer_simple(&self, question: &str, context: Option<&str>) -> Result<SimpleAnswer> {
        let message = Message::user_text(simple_prompt(question, context));
        self.create_message(message, SIMPLE_MAX_TOKENS)
            .await?
            .into_simple_answer()
    }
}

/// `"<status> <message>"`, preferring the message from Anthropic's error envelope.
fn provider_error_message(status: StatusCode, body: &str) -> String {
    let detail = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => envelope.error.message,
        Err(_) if body.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string(),
        Err(_) => body.trim().to_string(),
    };
    format!("{} {}", status.as_u16(), detail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_from_envelope() {
        let body = r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#;
        assert_eq!(
            provider_error_message(StatusCode::from_u16(529).unwrap(), body),
            "529 Overloaded"
        );
    }

    #[test]
    fn test_error_message_from_raw_body() {
        assert_eq!(
            provider_error_message(StatusCode::BAD_GATEWAY, "upstream timed out\n"),
            "502 upstream timed out"
        );
        assert_eq!(
            provider_error_message(StatusCode::UNAUTHORIZED, ""),
            "401 Unauthorized"
        );
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = AnthropicClient::new("http://localhost:9000/", "sk-test", "claude-test");
        assert_eq!(client.base_url, "http://localhost:9000");
        assert_eq!(client.model(), "claude-test");
    }
}

//! Messages API wire types and the reshaped answers handed to routes.

use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use citedoc_core::{Error, Result};

/// The only document media type the gateway forwards.
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

// ---------------------------------------------------------------
// Request
// ---------------------------------------------------------------

/// Body of `POST /v1/messages`.
#[derive(Debug, Clone, Serialize)]
pub struct MessagesRequest {
    pub model: String,
    pub max_tokens: u32,
    pub messages: Vec<Message>,
}

impl MessagesRequest {
    pub fn single(model: &str, max_tokens: u32, message: Message) -> Self {
        Self {
            model: model.to_string(),
            max_tokens,
            messages: vec![message],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: MessageContent,
}

impl Message {
    /// A user turn carrying only text.
    pub fn user_text(text: String) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(text),
        }
    }

    /// A user turn carrying a PDF (citations enabled) followed by an instruction.
    pub fn user_with_document(document: &[u8], instruction: String) -> Self {
        let data = base64::engine::general_purpose::STANDARD.encode(document);
        Self {
            role: Role::User,
            content: MessageContent::Blocks(vec![
                RequestBlock::Document {
                    source: DocumentSource::Base64 {
                        media_type: PDF_MEDIA_TYPE.to_string(),
                        data,
                    },
                    citations: CitationsFlag { enabled: true },
                },
                RequestBlock::Text { text: instruction },
            ]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<RequestBlock>),
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RequestBlock {
    Document {
        source: DocumentSource,
        citations: CitationsFlag,
    },
    Text {
        text: String,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DocumentSource {
    Base64 { media_type: String, data: String },
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CitationsFlag {
    pub enabled: bool,
}

// ---------------------------------------------------------------
// Response
// ---------------------------------------------------------------

/// The parts of a Messages API response the gateway relays.
#[derive(Debug, Clone, Deserialize)]
pub struct MessagesResponse {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    /// Token accounting, passed through untouched.
    #[serde(default)]
    pub usage: Value,
}

/// A response content block. Only text blocks carry anything we use.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum ContentBlock {
    #[serde(rename = "text")]
    Text {
        text: String,
        #[serde(default)]
        citations: Option<Vec<CitationSpan>>,
    },
    #[serde(other)]
    Other,
}

impl ContentBlock {
    /// Block text, empty for non-text blocks.
    pub fn text(&self) -> &str {
        match self {
            Self::Text { text, .. } => text,
            Self::Other => "",
        }
    }
}

/// A provider-identified excerpt supporting an answer.
///
/// `location` holds every other field of the provider's citation object
/// (`type`, `document_index`, page or character bounds) so callers receive
/// the citation in its original shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitationSpan {
    #[serde(rename = "cited_text", default, skip_serializing_if = "String::is_empty")]
    pub source_text: String,
    #[serde(flatten)]
    pub location: Map<String, Value>,
}

/// Envelope of a non-2xx Messages API response.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: String,
}

impl MessagesResponse {
    /// Take the first content block; later blocks are ignored.
    fn into_first_block(self) -> Result<(ContentBlock, Value)> {
        let usage = self.usage;
        match self.content.into_iter().next() {
            Some(block) => Ok((block, usage)),
            None => Err(Error::Provider(
                "Provider response contained no content blocks".into(),
            )),
        }
    }

    /// Text of the first content block.
    pub fn into_text(self) -> Result<String> {
        let (block, _) = self.into_first_block()?;
        Ok(block.text().to_string())
    }

    pub fn into_simple_answer(self) -> Result<SimpleAnswer> {
        let (block, usage) = self.into_first_block()?;
        Ok(SimpleAnswer {
            answer_text: block.text().to_string(),
            usage,
        })
    }

    pub fn into_answer(self) -> Result<AnswerResult> {
        let (block, usage) = self.into_first_block()?;
        let answer = match block {
            ContentBlock::Text { text, citations } => {
                let citations = citations.unwrap_or_default();
                AnswerResult {
                    answer_text: text.clone(),
                    text_blocks: vec![TextBlock {
                        text,
                        citations: citations.clone(),
                    }],
                    citations,
                    usage,
                }
            }
            ContentBlock::Other => AnswerResult {
                answer_text: String::new(),
                citations: Vec::new(),
                text_blocks: Vec::new(),
                usage,
            },
        };
        Ok(answer)
    }
}

// ---------------------------------------------------------------
// Reshaped results
// ---------------------------------------------------------------

/// A question, optionally about an uploaded document.
#[derive(Debug, Clone)]
pub struct DocumentQuery {
    pub question: String,
    pub document: Option<Vec<u8>>,
}

impl DocumentQuery {
    /// Fails with a validation error unless a non-empty question is given.
    pub fn from_question(question: Option<&str>) -> Result<Self> {
        match question.filter(|q| !q.trim().is_empty()) {
            Some(q) => Ok(Self {
                question: q.to_string(),
                document: None,
            }),
            None => Err(Error::Validation("Question is required".into())),
        }
    }

    pub fn with_document(mut self, document: Vec<u8>) -> Self {
        self.document = Some(document);
        self
    }

    /// Attached document bytes, empty when there is none.
    pub fn document(&self) -> &[u8] {
        self.document.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TextBlock {
    pub text: String,
    pub citations: Vec<CitationSpan>,
}

#[derive(Debug, Clone)]
pub struct AnswerResult {
    pub answer_text: String,
    /// In the order the provider returned them.
    pub citations: Vec<CitationSpan>,
    pub text_blocks: Vec<TextBlock>,
    pub usage: Value,
}

#[derive(Debug, Clone)]
pub struct SimpleAnswer {
    pub answer_text: String,
    pub usage: Value,
}

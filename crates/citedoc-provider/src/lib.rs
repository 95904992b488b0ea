//! Provider client for document question answering with citations.
//!
//! Documents are never parsed locally: PDF bytes are sent inline as base64
//! with citation extraction enabled and the provider's answer is reshaped
//! into [`AnswerResult`].

pub mod anthropic;
pub mod prompts;
pub mod provider;
pub mod types;

pub use anthropic::AnthropicClient;
pub use provider::DocumentProvider;
pub use types::*;

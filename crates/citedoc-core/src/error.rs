//! Error types for citedoc.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid caller input. Maps to HTTP 400.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Any failure talking to the LLM provider, including transport errors
    /// and undecodable responses. Maps to HTTP 500.
    #[error("Provider error: {0}")]
    Provider(String),

    /// Startup configuration problem. Fatal before the server binds.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The message shown to HTTP callers, without the variant prefix.
    pub fn detail(&self) -> String {
        match self {
            Self::Validation(msg) | Self::Provider(msg) | Self::Config(msg) => msg.clone(),
            Self::Io(e) => e.to_string(),
        }
    }

    /// Whether this error was caused by the caller's input.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

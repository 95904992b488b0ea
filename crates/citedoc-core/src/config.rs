//! Environment-sourced configuration.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};

pub const DEFAULT_PORT: u16 = 5002;
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";
pub const DEFAULT_PRODUCTION_ORIGINS: &[&str] = &["https://your-domain.com", "http://localhost"];

/// Largest accepted upload (50 MiB).
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;
/// Slack on top of the upload cap for multipart framing and text fields.
pub const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Deployment mode, selected by `APP_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Development,
    Production,
}

impl RunMode {
    fn parse(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("production") => Self::Production,
            _ => Self::Development,
        }
    }
}

/// Which origins may call the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsPolicy {
    /// Reflect whatever origin the browser sends.
    MirrorOrigin,
    /// Only the listed origins.
    AllowList(Vec<String>),
}

/// Top-level citedoc configuration.
#[derive(Clone)]
pub struct Config {
    /// HTTP server port.
    pub port: u16,
    pub mode: RunMode,
    pub cors: CorsPolicy,
    /// Transient storage for uploads in flight.
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

// Hand-written so the API key never reaches the logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("mode", &self.mode)
            .field("cors", &self.cors)
            .field("upload_dir", &self.upload_dir)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl Config {
    /// Create configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = var("ANTHROPIC_API_KEY").ok_or_else(|| {
            Error::Config("ANTHROPIC_API_KEY environment variable is required".into())
        })?;

        let port = match var("PORT") {
            Some(p) => p
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("Invalid PORT: {}", p)))?,
            None => DEFAULT_PORT,
        };

        let mode = RunMode::parse(var("APP_ENV").as_deref());
        let cors = match mode {
            RunMode::Development => CorsPolicy::MirrorOrigin,
            RunMode::Production => {
                let origins = match var("CORS_ORIGINS") {
                    Some(list) => list
                        .split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect(),
                    None => DEFAULT_PRODUCTION_ORIGINS
                        .iter()
                        .map(|o| o.to_string())
                        .collect(),
                };
                CorsPolicy::AllowList(origins)
            }
        };

        let config = Self {
            port,
            mode,
            cors,
            upload_dir: var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOAD_DIR)),
            max_upload_bytes: MAX_UPLOAD_BYTES,
            api_key,
            base_url: var("ANTHROPIC_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.into()),
            model: var("ANTHROPIC_MODEL").unwrap_or_else(|| DEFAULT_MODEL.into()),
        };
        debug!(?config, "Loaded configuration");
        Ok(config)
    }

    /// Create the upload directory if it does not exist yet.
    pub fn ensure_upload_dir(&self) -> Result<&Path> {
        std::fs::create_dir_all(&self.upload_dir)?;
        Ok(&self.upload_dir)
    }

    /// HTTP body cap: one maximal upload plus multipart framing.
    pub fn body_limit_bytes(&self) -> usize {
        self.max_upload_bytes + MULTIPART_OVERHEAD_BYTES
    }

    pub fn is_production(&self) -> bool {
        self.mode == RunMode::Production
    }
}

//! Shared application state.

use std::sync::Arc;

use citedoc_core::Config;
use citedoc_provider::DocumentProvider;

use crate::upload::UploadPolicy;

/// Shared application state accessible from all route handlers.
///
/// Built once at startup and read-only afterwards.
pub struct AppState {
    pub config: Config,
    pub provider: Arc<dyn DocumentProvider>,
    pub upload_policy: UploadPolicy,
}

impl AppState {
    pub fn new(config: Config, provider: Arc<dyn DocumentProvider>) -> Self {
        let upload_policy = UploadPolicy::from_config(&config);
        Self {
            config,
            provider,
            upload_policy,
        }
    }
}

//! citedoc — HTTP gateway for question answering over PDFs with citations.

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod routes;
mod state;
mod upload;

use citedoc_core::Config;
use citedoc_provider::AnthropicClient;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().map_err(|e| {
        error!("{}", e);
        e
    })?;

    let upload_dir = config.ensure_upload_dir()?.to_path_buf();
    let swept = upload::sweep_stale(&upload_dir);
    if swept > 0 {
        info!("Removed {} stale uploads", swept);
    }
    info!("Upload directory: {}", upload_dir.display());

    let provider = Arc::new(AnthropicClient::from_config(&config));
    info!("Using model {}", provider.model());

    let port = config.port;
    let state = Arc::new(AppState::new(config, provider));

    // Build router
    let app = routes::build_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("citedoc listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

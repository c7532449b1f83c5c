use std::sync::Arc;

use medassist_lib::api::start_http_server;
use medassist_lib::config::{self, AppConfig};
use medassist_lib::core_state::CoreState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    medassist_lib::init_tracing();
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = AppConfig::from_env();
    tracing::info!(data_dir = %config.data_dir.display(), "Configuration resolved");

    // Bootstrap may train the model; keep it off the async workers.
    let init_config = config.clone();
    let core = Arc::new(
        tokio::task::spawn_blocking(move || CoreState::initialize(&init_config)).await??,
    );

    let server = start_http_server(core.clone(), config.http_addr).await?;
    tracing::info!(addr = %server.session.server_addr, "Serving HTTP API");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown requested");

    server.stop().await;
    core.shutdown()?;
    Ok(())
}

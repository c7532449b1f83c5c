use std::sync::Arc;

use medassist_lib::config::{self, AppConfig};
use medassist_lib::core_state::CoreState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // stdout carries the protocol.
    medassist_lib::init_tracing_stderr();
    tracing::info!("{} tool server starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = AppConfig::from_env();
    let core = Arc::new(
        tokio::task::spawn_blocking(move || CoreState::initialize(&config)).await??,
    );

    medassist_lib::tools::serve_stdio(core.clone()).await?;
    core.shutdown()?;
    Ok(())
}

pub mod api;
pub mod config;
pub mod core_state;
pub mod document;
pub mod models;
pub mod persist;
pub mod pipeline;
pub mod records;
pub mod tools;

use tracing_subscriber::EnvFilter;

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter()))
}

/// Initialize tracing on stdout. Safe to call more than once.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_env_filter(env_filter()).try_init();
}

/// Initialize tracing on stderr, for front ends that own stdout.
pub fn init_tracing_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}

//! Shared pieces of the trunkline binaries: configuration loading, the
//! log-download HTTP surface, and the console agent worker.

pub mod config;
pub mod http;
pub mod worker;

use tracing_subscriber::EnvFilter;

/// Initializes the global tracing subscriber from the logging config.
pub fn init_tracing(logging: &config::LoggingConfig) {
    let filter = EnvFilter::try_new(&logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

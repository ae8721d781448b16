pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod store;
pub mod workspace;

pub use config::Config;
pub use error::AppError;
pub use models::*;
pub use services::*;
pub use workspace::{Response, Workspace};

/// One-time tracing setup for embedding shells; `RUST_LOG` wins over the
/// configured level.
pub fn init_tracing(config: &config::LoggingConfig) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.level)),
        )
        .with_ansi(config.style != "never")
        .try_init();
}

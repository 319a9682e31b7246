pub mod commands;
pub mod config;
pub mod error;
pub mod excel;
pub mod models;
pub mod render;
pub mod server;
pub mod services;
pub mod types;

pub use config::AppConfig;
pub use error::{Result, SummaryError};
pub use models::{OfficeOrder, SummaryOptions};
pub use services::summarizer::summarize;
pub use types::{Category, RawSheet, SummaryRow, SummaryTable};

/// Install the global tracing subscriber. `LOG_LEVEL` sets the default
/// level; `RUST_LOG` directives are honoured on top of it.
pub fn init_tracing() {
    use tracing::Level;
    use tracing_subscriber::{fmt, EnvFilter};

    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let _ = fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(log_level.parse().unwrap_or(Level::INFO.into())),
        )
        .try_init();
}

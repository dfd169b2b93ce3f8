//! Rigscene App Crate
//!
//! Configuration, logging setup and the end-to-end [`RecordingParser`]
//! behind the `rigscene` binary.

pub mod config;
pub mod pipeline;

pub use config::{ConfigError, LoggingConfig, ParserConfig};
pub use pipeline::{PipelineError, RecordingParser};

/// Install the global fmt subscriber. `RUST_LOG` wins over `config.level`.
pub fn init_logging(config: &LoggingConfig) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.level)),
        )
        .with_target(false)
        .init();
}

//! Structured logging setup on top of `tracing-subscriber`.

pub mod config;
pub mod logger;

pub use config::{LogFormat, LogLevel, LoggingConfig};
pub use logger::{init_logging, init_logging_from_env};

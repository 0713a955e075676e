use super::config::{LogFormat, LoggingConfig};
use crate::error::Result;
use lazy_static::lazy_static;
use parking_lot::Mutex;
use tracing::Level;
use tracing_subscriber::fmt::time::SystemTime;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Registry};

lazy_static! {
    static ref LOGGER_INITIALIZED: Mutex<bool> = Mutex::new(false);
}

/// Install the process-wide subscriber. `RUST_LOG` wins over the configured
/// level. Later calls, and calls made after another subscriber was installed,
/// leave the existing one in place.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let mut initialized = LOGGER_INITIALIZED.lock();
    if *initialized {
        return Ok(());
    }

    let level: Level = config.level.into();
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("lightning_route={},warn", level)));
    let registry = Registry::default().with(env_filter);

    let installed = match config.format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_timer(SystemTime)
                    .with_target(config.with_target)
                    .with_thread_ids(config.with_thread_ids)
                    .with_thread_names(true),
            )
            .try_init(),
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .compact()
                    .with_target(config.with_target)
                    .with_thread_ids(config.with_thread_ids),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .pretty()
                    .with_target(config.with_target)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init(),
        LogFormat::Full => registry
            .with(
                fmt::layer()
                    .with_timer(SystemTime)
                    .with_target(config.with_target)
                    .with_file(true)
                    .with_line_number(true)
                    .with_thread_ids(config.with_thread_ids)
                    .with_thread_names(true),
            )
            .try_init(),
    };

    if let Err(err) = installed {
        tracing::debug!(error = %err, "Subscriber already installed, keeping it");
    }
    *initialized = true;
    Ok(())
}

/// `init_logging` with configuration taken from the environment.
pub fn init_logging_from_env() -> Result<()> {
    init_logging(&LoggingConfig::from_env()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        let config = LoggingConfig::default();
        assert!(init_logging(&config).is_ok());
        assert!(init_logging(&LoggingConfig::production()).is_ok());
        assert!(*LOGGER_INITIALIZED.lock());
    }
}

//! Tracing setup for the `quizclips` binary.
//!
//! The CLI prints its progress lines and summary to stdout. Every tracing
//! event goes to stderr instead, so `quizclips run > run.log` captures the
//! human-readable report without interleaved log records.

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `config.level`. A second call is a
/// no-op, which lets every test in a binary call it.
pub fn init_logging(config: &LoggingConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let builder = fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    let installed = if config.json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.with_target(true).finish())
    };
    if installed.is_err() {
        tracing::trace!("Tracing subscriber already installed");
    }
}

/// [`init_logging`] with the default `info` level.
pub fn init_default_logging() {
    init_logging(&LoggingConfig::default());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_init_is_harmless() {
        init_default_logging();
        init_logging(&LoggingConfig {
            level: "debug".to_string(),
            json: true,
        });
        tracing::info!("still logging");
    }
}

//! Logging setup.
//!
//! Events go to stderr, filtered by `logging.filter` and rendered according
//! to `logging.format`. Colour is only used when stderr is a terminal.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::config::{LogFormat, LoggingConfig};

static INSTALLED: OnceCell<()> = OnceCell::new();

type FormatLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Logging setup failures.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// `logging.filter` is not a valid directive string.
    #[error("invalid logging.filter '{directives}': {message}")]
    Filter {
        /// The rejected directives.
        directives: String,
        /// Parser message.
        message: String,
    },

    /// Another global subscriber was installed first.
    #[error("could not install the log subscriber: {0}")]
    Install(#[from] TryInitError),
}

/// Install the process-wide subscriber described by `config`.
///
/// Only the first successful call has an effect; later calls return `Ok`
/// without re-reading `config`.
///
/// # Errors
///
/// Returns `TelemetryError::Filter` for a malformed `logging.filter` and
/// `TelemetryError::Install` if some other subscriber is already global.
pub fn initialise(config: &LoggingConfig) -> Result<(), TelemetryError> {
    INSTALLED.get_or_try_init(|| {
        let filter = filter_for(config)?;
        Registry::default()
            .with(format_layer(config.format))
            .with(filter)
            .try_init()
            .map_err(TelemetryError::from)
    })?;
    Ok(())
}

fn filter_for(config: &LoggingConfig) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(&config.filter).map_err(|e| TelemetryError::Filter {
        directives: config.filter.clone(),
        message: e.to_string(),
    })
}

fn format_layer(format: LogFormat) -> FormatLayer {
    let stderr = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_timer(UtcTime::rfc_3339())
        .with_target(true);
    match format {
        LogFormat::Json => stderr.json().flatten_event(true).boxed(),
        LogFormat::Compact => stderr.compact().boxed(),
    }
}

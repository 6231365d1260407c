//! Logging setup using `tracing` and `tracing-subscriber`.
//!
//! The library only emits `tracing` events (see [`crate::pipeline::TracingObserver`]); the
//! binary installs a subscriber with [`init_logging`].
//!
//! - `error`: the run failed
//! - `warn`: cells that could not be parsed (row kept)
//! - `info`: per-stage row counts
//! - `debug`: skipped stages and per-rule reconciliation details

use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable multi-line format.
    #[default]
    Pretty,
    /// Single-line format.
    Compact,
    /// JSON lines for machine parsing.
    Json,
}

/// Configuration for logging behavior.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level_filter: LevelFilter,
    /// Honour `RUST_LOG` instead of `level_filter` when it is set.
    pub use_env_filter: bool,
    pub format: LogFormat,
    pub with_ansi: bool,
    /// Write to this file (appending) instead of stderr.
    pub log_file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level_filter: LevelFilter::INFO,
            use_env_filter: true,
            format: LogFormat::default(),
            with_ansi: true,
            log_file: None,
        }
    }
}

impl LogConfig {
    /// Map a `-v` count to a level: 0 → warn, 1 → info, 2 → debug, 3+ → trace.
    #[must_use]
    pub fn from_verbosity(verbosity: u8) -> Self {
        let level_filter = match verbosity {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        };
        Self {
            level_filter,
            ..Default::default()
        }
    }

    fn env_filter(&self) -> EnvFilter {
        let fallback = || EnvFilter::default().add_directive(self.level_filter.into());
        if self.use_env_filter {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback())
        } else {
            fallback()
        }
    }
}

/// Install the global subscriber. Call once at startup.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened or a subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> io::Result<()> {
    let filter = config.env_filter();
    let writer = match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            fmt::writer::BoxMakeWriter::new(Mutex::new(file))
        }
        None => fmt::writer::BoxMakeWriter::new(io::stderr),
    };
    let with_ansi = config.with_ansi && config.log_file.is_none();

    let registry = tracing_subscriber::registry().with(filter);
    let result = match config.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(writer))
            .try_init(),
        LogFormat::Compact => registry
            .with(fmt::layer().compact().with_ansi(with_ansi).with_writer(writer))
            .try_init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().pretty().with_ansi(with_ansi).with_writer(writer))
            .try_init(),
    };
    result.map_err(|e| io::Error::other(e.to_string()))
}

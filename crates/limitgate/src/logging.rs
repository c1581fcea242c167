//! # Logging Infrastructure
//!
//! Structured logging with `tracing`.
//!
//! Events go to stderr so command output on stdout stays machine-readable.
//! An optional log file receives the same events through a daily rolling,
//! non-blocking appender.
//!
//! ## Quick Start
//!
//! ```no_run
//! use limitgate::logging::{init_logging, LogConfig};
//!
//! let _guard = init_logging(&LogConfig::default()).expect("Failed to initialize logging");
//! tracing::info!("Application started");
//! ```
//!
//! ## Configuration Options
//!
//! ```no_run
//! use std::path::PathBuf;
//! use limitgate::logging::{LogConfig, LogFormat, LogLevel};
//!
//! let config = LogConfig {
//!     level: LogLevel::Debug,
//!     format: LogFormat::Json,
//!     file_path: Some(PathBuf::from("/var/log/limitgate/limitgate.log")),
//! };
//! ```

use std::io;
use std::path::{Path, PathBuf};

use tracing::Level;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

/// Error type for logging initialization failures.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// Failed to create the log file or its directory.
    #[error("Failed to create log file: {0}")]
    FileCreation(String),

    /// Failed to install the subscriber.
    #[error("Failed to initialize logging: {0}")]
    SubscriberInit(String),

    /// Invalid configuration.
    #[error("Invalid log configuration: {0}")]
    InvalidConfig(String),
}

/// Minimum severity of logged events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// Everything.
    Trace,
    /// Per-rule evaluation detail.
    Debug,
    /// Admitted transfers and lifecycle events.
    #[default]
    Info,
    /// Rejections and collaborator failures.
    Warn,
    /// Errors only.
    Error,
}

impl LogLevel {
    /// Converts to a `tracing` level.
    #[must_use]
    pub const fn as_tracing_level(self) -> Level {
        match self {
            Self::Trace => Level::TRACE,
            Self::Debug => Level::DEBUG,
            Self::Info => Level::INFO,
            Self::Warn => Level::WARN,
            Self::Error => Level::ERROR,
        }
    }

    /// Returns the filter directive for this level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Multi-line human-readable output.
    #[default]
    Pretty,
    /// One JSON object per event, for log aggregation.
    Json,
    /// Single-line human-readable output.
    Compact,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pretty => write!(f, "pretty"),
            Self::Json => write!(f, "json"),
            Self::Compact => write!(f, "compact"),
        }
    }
}

/// Configuration for the logging system.
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    /// Minimum level. `RUST_LOG` overrides it when set.
    pub level: LogLevel,

    /// Output format, shared by stderr and the log file.
    pub format: LogFormat,

    /// Optional log file, rotated daily. Its directory is created if missing.
    pub file_path: Option<PathBuf>,
}

/// Guard that flushes the file appender on drop.
///
/// Keep it alive for the lifetime of the program.
pub struct LogGuard {
    guard: Option<WorkerGuard>,
}

impl LogGuard {
    const fn new(guard: Option<WorkerGuard>) -> Self {
        Self { guard }
    }
}

impl std::fmt::Debug for LogGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogGuard")
            .field("has_file_guard", &self.guard.is_some())
            .finish()
    }
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Installs the global subscriber.
///
/// # Errors
///
/// Returns [`LogError`] if:
/// - The log file directory cannot be created
/// - The subscriber is already installed
pub fn init_logging(config: &LogConfig) -> Result<LogGuard, LogError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.level.as_str()))
        .map_err(|e| LogError::InvalidConfig(e.to_string()))?;

    let mut layers: Vec<BoxedLayer> = vec![stderr_layer(config.format)];

    let guard = match config.file_path {
        Some(ref path) => {
            let (writer, guard) = file_writer(path)?;
            layers.push(file_layer(config.format, writer));
            Some(guard)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .map_err(|e| LogError::SubscriberInit(e.to_string()))?;

    Ok(LogGuard::new(guard))
}

fn stderr_layer(format: LogFormat) -> BoxedLayer {
    let layer = fmt::layer().with_writer(io::stderr).with_target(true);
    match format {
        LogFormat::Pretty => layer.pretty().boxed(),
        LogFormat::Json => layer.json().with_current_span(true).boxed(),
        LogFormat::Compact => layer.compact().boxed(),
    }
}

fn file_layer(format: LogFormat, writer: NonBlocking) -> BoxedLayer {
    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true);
    match format {
        LogFormat::Json => layer.json().boxed(),
        LogFormat::Compact => layer.compact().boxed(),
        LogFormat::Pretty => layer.boxed(),
    }
}

fn file_writer(path: &Path) -> Result<(NonBlocking, WorkerGuard), LogError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)
        .map_err(|e| LogError::FileCreation(format!("{}: {e}", dir.display())))?;

    let filename = path
        .file_name()
        .and_then(|s| s.to_str())
        .ok_or_else(|| LogError::InvalidConfig("Invalid log file name".to_string()))?;

    let appender = tracing_appender::rolling::daily(dir, filename);
    Ok(tracing_appender::non_blocking(appender))
}

/// Maps `-v` occurrences to a level: none is warn, then info, debug, trace.
#[must_use]
pub const fn verbosity_to_level(verbosity: u8) -> LogLevel {
    match verbosity {
        0 => LogLevel::Warn,
        1 => LogLevel::Info,
        2 => LogLevel::Debug,
        _ => LogLevel::Trace,
    }
}

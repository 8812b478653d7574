//! Process-wide logger bootstrap.
//!
//! Logging goes to `<dir>/<name>.log` (appended across runs) or, in debug
//! mode, to `<dir>/<name>-debug.log` which is recreated on every run. When
//! the file cannot be opened the logger falls back to the console and records
//! that choice instead of failing startup.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use once_cell::sync::OnceCell;
use tracing::subscriber::SetGlobalDefaultError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::{self as subscriber_fmt, time::UtcTime};

use inputor_config::{LogLevel, ProcessPaths};

use crate::process::PROCESS_TARGET;

static TELEMETRY: OnceCell<TelemetryHandle> = OnceCell::new();

/// Where log records are actually written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogDestination {
    /// Standard output.
    Console,
    /// A log file next to the executable.
    File {
        /// Path of the open log file.
        path: PathBuf,
    },
}

impl fmt::Display for LogDestination {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Console => formatter.write_str("console"),
            Self::File { path } => write!(formatter, "file:{}", path.display()),
        }
    }
}

/// Proof that the process-wide logger is installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryHandle {
    destination: LogDestination,
    level: LogLevel,
}

impl TelemetryHandle {
    /// Destination selected when the logger was installed.
    #[must_use]
    pub const fn destination(&self) -> &LogDestination {
        &self.destination
    }

    /// Verbosity selected when the logger was installed.
    #[must_use]
    pub const fn level(&self) -> LogLevel {
        self.level
    }

    /// Handle for code paths that log through an already installed
    /// subscriber, such as tests.
    #[cfg(test)]
    pub(crate) const fn detached(destination: LogDestination, level: LogLevel) -> Self {
        Self { destination, level }
    }
}

/// Errors encountered while configuring the logger.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Failed to build the level filter.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// Failed to install the tracing subscriber.
    #[error("failed to install logging subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Opened log output plus the reason a file could not be used, if any.
pub struct LogSink {
    destination: LogDestination,
    file: Option<File>,
    fallback: Option<io::Error>,
}

impl LogSink {
    /// Destination this sink writes to.
    #[must_use]
    pub const fn destination(&self) -> &LogDestination {
        &self.destination
    }

    /// Why the log file was unavailable, when the console was chosen.
    #[must_use]
    pub const fn fallback_reason(&self) -> Option<&io::Error> {
        self.fallback.as_ref()
    }
}

/// Opens the log file at `path`, falling back to the console.
///
/// Debug runs remove the previous file first so each run starts clean; when
/// it cannot be removed it is truncated instead. Info runs append.
#[must_use]
pub fn open_log_destination(path: &Path, level: LogLevel) -> LogSink {
    let removal = if level == LogLevel::Debug {
        fs::remove_file(path)
    } else {
        Ok(())
    };
    sink_after_removal(path, &removal)
}

fn sink_after_removal(path: &Path, removal: &io::Result<()>) -> LogSink {
    let mut options = OpenOptions::new();
    options.create(true);
    match removal {
        Err(error) if error.kind() != io::ErrorKind::NotFound => {
            options.write(true).truncate(true);
        }
        _ => {
            options.append(true);
        }
    }
    match options.open(path) {
        Ok(file) => LogSink {
            destination: LogDestination::File {
                path: path.to_path_buf(),
            },
            file: Some(file),
            fallback: None,
        },
        Err(error) => LogSink {
            destination: LogDestination::Console,
            file: None,
            fallback: Some(error),
        },
    }
}

/// Installs the global logger for the executable described by `paths`.
///
/// Only the first call installs anything; later calls return the handle
/// produced by the first one.
pub fn initialise(paths: &ProcessPaths, level: LogLevel) -> Result<TelemetryHandle, TelemetryError> {
    TELEMETRY
        .get_or_try_init(|| install_subscriber(&paths.log_path(level), level))
        .cloned()
}

fn install_subscriber(path: &Path, level: LogLevel) -> Result<TelemetryHandle, TelemetryError> {
    let filter = EnvFilter::try_new(level.filter_directive())
        .map_err(|error| TelemetryError::Filter(error.to_string()))?;
    let LogSink {
        destination,
        file,
        fallback,
    } = open_log_destination(path, level);
    let (writer, ansi) = match file {
        Some(file) => (BoxMakeWriter::new(Mutex::new(file)), false),
        None => (BoxMakeWriter::new(io::stdout), io::stdout().is_terminal()),
    };

    let subscriber = subscriber_fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_thread_names(true)
        .with_ansi(ansi)
        .with_timer(UtcTime::rfc_3339())
        .with_writer(writer)
        .finish();
    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)?;

    if let Some(error) = fallback {
        warn!(
            target: PROCESS_TARGET,
            path = %path.display(),
            error = %error,
            "log file unavailable; logging to console"
        );
    }
    if level != LogLevel::Info {
        info!(target: PROCESS_TARGET, %level, "logging level set");
    }
    Ok(TelemetryHandle { destination, level })
}

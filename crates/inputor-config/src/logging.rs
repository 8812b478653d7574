use strum::{Display, EnumString};

/// Verbosity of the process-wide logger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, EnumString, Display)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogLevel {
    /// Diagnostic output, written to a log file that is reset on every run.
    Debug,
    /// Operational output appended across runs.
    #[default]
    Info,
}

impl LogLevel {
    /// Filter directive understood by `tracing_subscriber::EnvFilter`.
    #[must_use]
    pub const fn filter_directive(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
        }
    }

    /// Suffix appended to the process name when deriving the log file name.
    #[must_use]
    pub const fn file_suffix(self) -> &'static str {
        match self {
            Self::Debug => "-debug",
            Self::Info => "",
        }
    }
}

/// Errors encountered while parsing a [`LogLevel`] from text.
pub type LogLevelParseError = strum::ParseError;

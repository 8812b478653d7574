//! Command-line inputs consumed by the daemon bootstrap.

use std::ffi::OsString;
use std::time::Duration;

use camino::Utf8PathBuf;
use clap::Parser;

use crate::defaults::{DEFAULT_CPU_COUNT, DEFAULT_INTERVAL_MS, DEFAULT_WATCH_DIR};
use crate::logging::LogLevel;

/// Already-parsed operating parameters handed to the engine.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "inputord", disable_version_flag = true)]
pub struct BootstrapConfig {
    /// Prints the product name and version, then exits.
    #[arg(short = 'v', long = "version")]
    pub version: bool,
    /// Enables debug logging and starts a fresh debug log file.
    #[arg(long)]
    pub debug: bool,
    /// Number of worker threads granted to the ingestion runtime.
    #[arg(
        long,
        default_value_t = DEFAULT_CPU_COUNT,
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    pub cpu: u16,
    /// Runs interactive provisioning of the configuration store, then exits.
    #[arg(long = "config")]
    pub configure: bool,
    /// Additional setting keys prompted for during provisioning.
    #[arg(long = "extra-keys", value_delimiter = ',')]
    pub extra_keys: Vec<String>,
    /// Polling interval handed to the ingestion worker, in milliseconds.
    #[arg(
        short = 'i',
        long = "interval",
        default_value_t = DEFAULT_INTERVAL_MS
    )]
    pub interval_ms: u64,
    /// Directory watched by the ingestion worker.
    #[arg(long = "dir", default_value = DEFAULT_WATCH_DIR)]
    pub watch_dir: Utf8PathBuf,
    /// File holding the configuration store passphrase.
    #[arg(long = "key-file")]
    pub key_file: Option<Utf8PathBuf>,
}

impl BootstrapConfig {
    /// Parses the configuration from an argument list whose first item is the
    /// program name.
    pub fn load_from_iter<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::try_parse_from(args)
    }

    /// Log verbosity selected by the debug flag.
    #[must_use]
    pub const fn log_level(&self) -> LogLevel {
        if self.debug {
            LogLevel::Debug
        } else {
            LogLevel::Info
        }
    }

    /// Polling interval handed to the ingestion worker.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Worker thread count for the ingestion runtime.
    #[must_use]
    pub fn worker_threads(&self) -> usize {
        usize::from(self.cpu)
    }

    /// Extra provisioning keys with blanks removed.
    #[must_use]
    pub fn extra_keys(&self) -> Vec<String> {
        self.extra_keys
            .iter()
            .map(|key| key.trim())
            .filter(|key| !key.is_empty())
            .map(str::to_owned)
            .collect()
    }
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            version: false,
            debug: false,
            cpu: DEFAULT_CPU_COUNT,
            configure: false,
            extra_keys: Vec::new(),
            interval_ms: DEFAULT_INTERVAL_MS,
            watch_dir: Utf8PathBuf::from(DEFAULT_WATCH_DIR),
            key_file: None,
        }
    }
}

//! Default values shared by the flag parser and the daemon.

/// Product name printed by the version flag.
pub const PRODUCT_NAME: &str = "SIEM Data Inputor";

/// Product version printed by the version flag.
pub const PRODUCT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Number of worker threads granted to the ingestion runtime.
pub const DEFAULT_CPU_COUNT: u16 = 1;

/// Polling interval handed to the ingestion worker, in milliseconds.
pub const DEFAULT_INTERVAL_MS: u64 = 10_000;

/// Directory watched by the ingestion worker.
pub const DEFAULT_WATCH_DIR: &str = "/var/lib/inputor/relation/";

/// Environment variable holding the configuration store passphrase.
pub const KEY_ENV_VAR: &str = "INPUTOR_CONFIG_KEY";

/// Extension of the encrypted configuration store.
pub const STORE_EXTENSION: &str = "enc";

/// Extension of the log files.
pub const LOG_EXTENSION: &str = "log";

//! Test harness utilities for the engine and launch suites.

mod config_source;
mod registrar;
mod reporter;
mod world;

use inputor_config::{BootstrapConfig, LogLevel};

use crate::settings::{
    Configuration, DB_DATABASE, DB_HOSTNAME, DB_PASSWORD, DB_PORT, DB_USERNAME,
};
use crate::telemetry::{LogDestination, TelemetryHandle};

pub use config_source::{SourceOutcome, TestConfigSource};
pub use registrar::{MockRegistrar, RecordingRegistrar, connect_failure};
pub use reporter::{HealthEvent, RecordingHealthReporter};
pub use world::{EngineWorld, world};

/// Configuration carrying every required key.
#[must_use]
pub fn complete_configuration() -> Configuration {
    [
        (DB_HOSTNAME, "db.internal"),
        (DB_PORT, "3306"),
        (DB_USERNAME, "inputor"),
        (DB_PASSWORD, "s3cret"),
        (DB_DATABASE, "siem"),
    ]
    .into_iter()
    .collect()
}

/// Bootstrap parameters as parsed from `inputord` plus `args`.
#[must_use]
pub fn bootstrap_with_args(args: &[&str]) -> BootstrapConfig {
    BootstrapConfig::load_from_iter(std::iter::once("inputord").chain(args.iter().copied()))
        .expect("test arguments should parse")
}

/// Logger handle for tests that never install a global subscriber.
#[must_use]
pub fn console_telemetry() -> TelemetryHandle {
    TelemetryHandle::detached(LogDestination::Console, LogLevel::Info)
}

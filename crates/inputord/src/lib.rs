//! Bootstrap core of the SIEM data inputor daemon.
//!
//! The daemon reads its operational secrets from an encrypted configuration
//! store next to the executable, installs logging, registers the MySQL
//! connection pool and then hands a worker runtime to the ingestion pipeline.
//! It stays up until SIGINT or SIGTERM arrives.
//!
//! Startup is driven by [`Engine`], a checked state machine: each phase in
//! [`EnginePhase`] can only be entered from the one before it, and any
//! failure stops the sequence and is reported through a [`HealthReporter`].
//! Running with `--config` skips the engine and provisions the store
//! interactively instead, keeping existing values for empty answers.

mod database;
mod drain;
mod engine;
mod health;
mod process;
mod provision;
mod settings;
mod store;
mod telemetry;
mod worker;

pub use database::{
    ConnectionDescriptor, DatabaseRegistrar, DescriptorError, MySqlRegistrar, RegistrarError,
};
pub use drain::{DrainHandle, ErrorDrain, ErrorReporter, ReportedError};
pub use engine::{Engine, EngineDeps, EngineError, EnginePhase, EngineSummary};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use process::{LaunchError, ShutdownError, ShutdownSignal, SystemShutdownSignal, run};
pub use provision::Provisioner;
pub use settings::{
    Configuration, DB_DATABASE, DB_HOSTNAME, DB_PASSWORD, DB_PORT, DB_USERNAME, REQUIRED_KEYS,
};
pub use store::{
    ConfigSource, ConfigStore, DecryptFailure, EnvKeySource, KeyError, KeyFileSource, KeySource,
    PassphraseKeySource, SecretKey, StoreError,
};
pub use telemetry::{
    LogDestination, LogSink, TelemetryError, TelemetryHandle, initialise, open_log_destination,
};
pub use worker::{IngestWorker, PlaceholderWorker, WorkerContext, WorkerError};

#[cfg(test)]
mod tests;

//! Defines the unified error surface for daemon launch and supervision.

use std::io;

use thiserror::Error;

use inputor_config::PathsError;

use crate::database::RegistrarError;
use crate::engine::EngineError;
use crate::store::{KeyError, StoreError};
use crate::telemetry::TelemetryError;
use crate::worker::WorkerError;

use super::shutdown::ShutdownError;

/// Errors surfaced while launching or supervising the daemon process.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// The executable location could not be resolved.
    #[error("failed to resolve process paths: {source}")]
    Paths {
        /// Underlying path error.
        #[source]
        source: PathsError,
    },
    /// Installing the logger failed.
    #[error("failed to initialise logging: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// The store key could not be obtained.
    #[error("failed to obtain configuration key: {source}")]
    Key {
        /// Underlying key error.
        #[source]
        source: KeyError,
    },
    /// Reading or writing the configuration store failed.
    #[error(transparent)]
    Store {
        /// Underlying store error.
        #[from]
        source: StoreError,
    },
    /// The database registrar could not be created.
    #[error("failed to prepare database registrar: {source}")]
    Registrar {
        /// Underlying registrar error.
        #[source]
        source: RegistrarError,
    },
    /// Engine startup or shutdown failed.
    #[error(transparent)]
    Engine {
        /// Underlying engine error.
        #[from]
        source: EngineError,
    },
    /// The engine reached `Running` without a worker runtime.
    #[error("worker runtime unavailable after startup")]
    MissingWorkerRuntime,
    /// The error drain thread could not be spawned.
    #[error("failed to start error drain: {source}")]
    Drain {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The ingestion worker refused to start.
    #[error(transparent)]
    Worker {
        /// Underlying worker error.
        #[from]
        source: WorkerError,
    },
    /// Waiting for shutdown failed.
    #[error("failed to await shutdown signal: {source}")]
    Shutdown {
        /// Underlying shutdown error.
        #[source]
        source: ShutdownError,
    },
}

impl From<PathsError> for LaunchError {
    fn from(source: PathsError) -> Self {
        Self::Paths { source }
    }
}

impl From<TelemetryError> for LaunchError {
    fn from(source: TelemetryError) -> Self {
        Self::Telemetry { source }
    }
}

impl From<KeyError> for LaunchError {
    fn from(source: KeyError) -> Self {
        Self::Key { source }
    }
}

impl From<RegistrarError> for LaunchError {
    fn from(source: RegistrarError) -> Self {
        Self::Registrar { source }
    }
}

impl From<ShutdownError> for LaunchError {
    fn from(source: ShutdownError) -> Self {
        Self::Shutdown { source }
    }
}

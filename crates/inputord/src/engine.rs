//! Engine startup orchestration.
//!
//! [`Engine::start`] walks the phases in [`EnginePhase`] order and stops at the
//! first failure. Every transition is checked against the current phase, so a
//! step can never run before the one it depends on. Logging readiness is
//! proven up front by the [`TelemetryHandle`] required at construction.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use strum::Display;
use thiserror::Error;
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, info};

use inputor_config::BootstrapConfig;

use crate::database::{ConnectionDescriptor, DatabaseRegistrar, RegistrarError};
use crate::health::HealthReporter;
use crate::process::PROCESS_TARGET;
use crate::settings::{Configuration, DB_HOSTNAME};
use crate::store::{ConfigSource, DecryptFailure, StoreError};
use crate::telemetry::{LogDestination, TelemetryHandle};

const WORKER_THREAD_NAME: &str = "inputor-worker";

/// Lifecycle phases, in the only order the engine moves through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum EnginePhase {
    /// Constructed, nothing loaded.
    Created,
    /// The configuration store was read and decrypted.
    ConfigLoaded,
    /// The configuration passed validation.
    Validated,
    /// Logging is confirmed ready.
    LoggerReady,
    /// The database pool is registered.
    DatabaseReady,
    /// The worker runtime is up; ingestion may begin.
    Running,
    /// A shutdown signal was received.
    Terminating,
}

impl EnginePhase {
    /// Phase that legally follows this one.
    #[must_use]
    pub const fn successor(self) -> Option<Self> {
        match self {
            Self::Created => Some(Self::ConfigLoaded),
            Self::ConfigLoaded => Some(Self::Validated),
            Self::Validated => Some(Self::LoggerReady),
            Self::LoggerReady => Some(Self::DatabaseReady),
            Self::DatabaseReady => Some(Self::Running),
            Self::Running => Some(Self::Terminating),
            Self::Terminating => None,
        }
    }
}

/// Errors surfaced while starting or stopping the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No configuration store exists yet.
    #[error("configuration not found at '{path}'; run with --config to provision it")]
    ConfigNotFound {
        /// Expected store path.
        path: PathBuf,
    },
    /// The store could not be decrypted; its contents are not trusted.
    #[error("configuration at '{path}' could not be decrypted; run with --config to provision it again")]
    ConfigDecryptFailed {
        /// Store path.
        path: PathBuf,
        /// Failure classification.
        #[source]
        failure: DecryptFailure,
    },
    /// The store could not be read for another reason.
    #[error("failed to read configuration: {source}")]
    ConfigRead {
        /// Underlying store error.
        #[source]
        source: StoreError,
    },
    /// The configuration lacks required settings.
    #[error("invalid configuration: missing {}", missing.join(", "))]
    ConfigInvalid {
        /// Every required key that is absent or empty.
        missing: Vec<&'static str>,
    },
    /// The database could not be registered.
    #[error("database connection failed: {source}")]
    DatabaseConnectionFailed {
        /// Underlying registrar error.
        #[source]
        source: RegistrarError,
    },
    /// The worker runtime could not be built.
    #[error("failed to build worker runtime: {source}")]
    Runtime {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// `start` was called on an engine that already left `Created`.
    #[error("engine already started (phase {phase})")]
    AlreadyStarted {
        /// Phase the engine was in.
        phase: EnginePhase,
    },
    /// A transition was attempted out of order.
    #[error("cannot move from {from} to {to}")]
    PhaseOrder {
        /// Current phase.
        from: EnginePhase,
        /// Requested phase.
        to: EnginePhase,
    },
}

impl From<StoreError> for EngineError {
    fn from(source: StoreError) -> Self {
        match source {
            StoreError::NotFound { path } => Self::ConfigNotFound { path },
            StoreError::Decrypt { path, failure } => Self::ConfigDecryptFailed { path, failure },
            other => Self::ConfigRead { source: other },
        }
    }
}

/// Collaborators the engine drives during startup.
#[derive(Clone)]
pub struct EngineDeps {
    /// Source of the decrypted configuration.
    pub config: Arc<dyn ConfigSource>,
    /// Opens the database pool.
    pub registrar: Arc<dyn DatabaseRegistrar>,
    /// Receives lifecycle events.
    pub reporter: Arc<dyn HealthReporter>,
}

/// Snapshot handed to the reporter once the engine is running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSummary {
    /// Number of stored settings.
    pub configured_keys: usize,
    /// Worker threads in the ingestion runtime.
    pub worker_threads: usize,
    /// Where logs are written.
    pub log_destination: LogDestination,
}

/// Startup state machine for the daemon.
pub struct Engine {
    bootstrap: BootstrapConfig,
    telemetry: TelemetryHandle,
    deps: EngineDeps,
    phase: EnginePhase,
    configuration: Option<Configuration>,
    runtime: Option<Runtime>,
}

impl Engine {
    /// Creates an engine in the `Created` phase.
    #[must_use]
    pub fn new(bootstrap: BootstrapConfig, telemetry: TelemetryHandle, deps: EngineDeps) -> Self {
        Self {
            bootstrap,
            telemetry,
            deps,
            phase: EnginePhase::Created,
            configuration: None,
            runtime: None,
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> EnginePhase {
        self.phase
    }

    /// Parameters the engine was built with.
    #[must_use]
    pub const fn bootstrap(&self) -> &BootstrapConfig {
        &self.bootstrap
    }

    /// Loaded configuration, once the engine passed `ConfigLoaded`.
    #[must_use]
    pub const fn configuration(&self) -> Option<&Configuration> {
        self.configuration.as_ref()
    }

    /// Runtime reserved for the ingestion worker, once `Running`.
    #[must_use]
    pub const fn worker_runtime(&self) -> Option<&Runtime> {
        self.runtime.as_ref()
    }

    /// Runs the startup sequence through to `Running`.
    pub fn start(&mut self) -> Result<(), EngineError> {
        if self.phase != EnginePhase::Created {
            return Err(EngineError::AlreadyStarted { phase: self.phase });
        }
        self.deps.reporter.bootstrap_starting();
        match self.run_startup() {
            Ok(summary) => {
                self.deps.reporter.bootstrap_succeeded(&summary);
                Ok(())
            }
            Err(error) => {
                self.deps.reporter.bootstrap_failed(&error);
                Err(error)
            }
        }
    }

    /// Records that the shutdown signal arrived.
    pub fn begin_shutdown(&mut self) -> Result<(), EngineError> {
        self.advance(EnginePhase::Terminating)
    }

    /// Hands the worker runtime over for shutdown once `Terminating`.
    pub fn take_worker_runtime(&mut self) -> Option<Runtime> {
        if self.phase == EnginePhase::Terminating {
            self.runtime.take()
        } else {
            None
        }
    }

    fn run_startup(&mut self) -> Result<EngineSummary, EngineError> {
        let loaded = self.deps.config.load()?;
        debug!(target: PROCESS_TARGET, configuration = ?loaded, "configuration loaded");
        self.configuration = Some(loaded);
        self.advance(EnginePhase::ConfigLoaded)?;

        self.validate()?;
        self.advance(EnginePhase::Validated)?;

        info!(
            target: PROCESS_TARGET,
            destination = %self.telemetry.destination(),
            level = %self.telemetry.level(),
            "logging ready"
        );
        self.advance(EnginePhase::LoggerReady)?;

        let configuration = self.loaded(EnginePhase::DatabaseReady)?;
        let configured_keys = configuration.len();
        let descriptor = ConnectionDescriptor::from_configuration(configuration).map_err(
            |source| EngineError::DatabaseConnectionFailed {
                source: source.into(),
            },
        )?;
        self.deps
            .registrar
            .register(&descriptor)
            .map_err(|source| EngineError::DatabaseConnectionFailed { source })?;
        self.advance(EnginePhase::DatabaseReady)?;

        let runtime = Builder::new_multi_thread()
            .worker_threads(self.bootstrap.worker_threads())
            .thread_name(WORKER_THREAD_NAME)
            .enable_all()
            .build()
            .map_err(|source| EngineError::Runtime { source })?;
        let worker_threads = runtime.metrics().num_workers();
        info!(target: PROCESS_TARGET, workers = worker_threads, "worker runtime ready");
        self.runtime = Some(runtime);
        self.advance(EnginePhase::Running)?;

        Ok(EngineSummary {
            configured_keys,
            worker_threads,
            log_destination: self.telemetry.destination().clone(),
        })
    }

    fn validate(&self) -> Result<(), EngineError> {
        let configuration = self.loaded(EnginePhase::Validated)?;
        if configuration.get(DB_HOSTNAME).is_none_or(str::is_empty) {
            return Err(EngineError::ConfigInvalid {
                missing: configuration.missing_required(),
            });
        }
        Ok(())
    }

    fn loaded(&self, to: EnginePhase) -> Result<&Configuration, EngineError> {
        self.configuration
            .as_ref()
            .ok_or(EngineError::PhaseOrder {
                from: self.phase,
                to,
            })
    }

    fn advance(&mut self, to: EnginePhase) -> Result<(), EngineError> {
        if self.phase.successor() != Some(to) {
            return Err(EngineError::PhaseOrder {
                from: self.phase,
                to,
            });
        }
        self.phase = to;
        self.deps.reporter.phase_entered(to);
        Ok(())
    }
}

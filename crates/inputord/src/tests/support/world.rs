//! BDD test world: holds the configuration source, registrar, reporter and
//! engine state shared by step functions.

use std::cell::RefCell;
use std::sync::Arc;

use crate::engine::{Engine, EngineDeps, EngineError, EnginePhase};
use crate::settings::Configuration;

use super::config_source::{SourceOutcome, TestConfigSource};
use super::registrar::RecordingRegistrar;
use super::reporter::RecordingHealthReporter;
use super::{bootstrap_with_args, complete_configuration, console_telemetry};

/// Scenario world shared across BDD steps.
pub struct EngineWorld {
    outcome: SourceOutcome,
    cpu: u16,
    pub registrar: Arc<RecordingRegistrar>,
    pub reporter: Arc<RecordingHealthReporter>,
    engine: Option<Engine>,
    start_result: Option<Result<(), EngineError>>,
}

impl EngineWorld {
    /// Builds a world whose store holds a complete configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            outcome: SourceOutcome::Present(complete_configuration()),
            cpu: 1,
            registrar: Arc::new(RecordingRegistrar::default()),
            reporter: Arc::new(RecordingHealthReporter::default()),
            engine: None,
            start_result: None,
        }
    }

    /// Replaces what the configuration source returns.
    pub fn use_outcome(&mut self, outcome: SourceOutcome) {
        self.outcome = outcome;
    }

    /// Removes `key` from the stored configuration.
    pub fn remove_key(&mut self, key: &str) {
        if let SourceOutcome::Present(configuration) = &self.outcome {
            let trimmed: Configuration = configuration
                .keys()
                .filter(|candidate| *candidate != key)
                .filter_map(|candidate| {
                    configuration
                        .get(candidate)
                        .map(|value| (candidate.to_owned(), value.to_owned()))
                })
                .collect();
            self.outcome = SourceOutcome::Present(trimmed);
        }
    }

    /// Grants the worker runtime `cpu` threads.
    pub const fn use_cpu(&mut self, cpu: u16) {
        self.cpu = cpu;
    }

    /// Builds the engine and runs `start` once.
    pub fn start(&mut self) {
        let cpu = self.cpu.to_string();
        let deps = EngineDeps {
            config: Arc::new(TestConfigSource::new(self.outcome.clone())),
            registrar: self.registrar.clone(),
            reporter: self.reporter.clone(),
        };
        let mut engine = Engine::new(
            bootstrap_with_args(&["--cpu", &cpu]),
            console_telemetry(),
            deps,
        );
        self.start_result = Some(engine.start());
        self.engine = Some(engine);
    }

    /// Delivers the shutdown notification to the engine.
    pub fn begin_shutdown(&mut self) -> Result<(), String> {
        let engine = self
            .engine
            .as_mut()
            .ok_or_else(|| "engine was never built".to_owned())?;
        engine.begin_shutdown().map_err(|error| error.to_string())
    }

    /// Result of the last `start` call.
    #[must_use]
    pub const fn start_result(&self) -> Option<&Result<(), EngineError>> {
        self.start_result.as_ref()
    }

    /// Current engine phase, if an engine exists.
    #[must_use]
    pub fn phase(&self) -> Option<EnginePhase> {
        self.engine.as_ref().map(Engine::phase)
    }

    /// Worker threads in the engine runtime, once running.
    #[must_use]
    pub fn worker_threads(&self) -> Option<usize> {
        self.engine
            .as_ref()
            .and_then(Engine::worker_runtime)
            .map(|runtime| runtime.metrics().num_workers())
    }
}

impl Default for EngineWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Default test world fixture.
#[must_use]
pub fn world() -> RefCell<EngineWorld> {
    RefCell::new(EngineWorld::new())
}

//! Structured health reporting for engine lifecycle events.

use std::sync::Arc;

use crate::engine::{EngineError, EnginePhase, EngineSummary};

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked every time the engine enters a new phase.
    fn phase_entered(&self, phase: EnginePhase);

    /// Invoked after the engine reaches `Running`.
    fn bootstrap_succeeded(&self, summary: &EngineSummary);

    /// Invoked when startup fails.
    fn bootstrap_failed(&self, error: &EngineError);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn phase_entered(&self, phase: EnginePhase) {
        (**self).phase_entered(phase);
    }

    fn bootstrap_succeeded(&self, summary: &EngineSummary) {
        (**self).bootstrap_succeeded(summary);
    }

    fn bootstrap_failed(&self, error: &EngineError) {
        (**self).bootstrap_failed(error);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting engine"
        );
    }

    fn phase_entered(&self, phase: EnginePhase) {
        tracing::debug!(
            target: HEALTH_TARGET,
            event = "phase_entered",
            %phase,
            "engine phase changed"
        );
    }

    fn bootstrap_succeeded(&self, summary: &EngineSummary) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            keys = summary.configured_keys,
            workers = summary.worker_threads,
            log = %summary.log_destination,
            "engine running"
        );
    }

    fn bootstrap_failed(&self, error: &EngineError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "engine startup failed"
        );
    }
}

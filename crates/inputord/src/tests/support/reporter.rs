//! Test double for [`HealthReporter`] that records structured events for assertions.

use std::sync::Mutex;

use crate::engine::{EngineError, EnginePhase, EngineSummary};
use crate::health::HealthReporter;

/// Structured health events tracked during scenarios.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HealthEvent {
    /// Startup began.
    BootstrapStarting,
    /// The engine entered a phase.
    PhaseEntered(EnginePhase),
    /// Startup reached `Running`.
    BootstrapSucceeded,
    /// Startup failed with an error description.
    BootstrapFailed(String),
}

/// Records health events for assertions.
#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Captures a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    /// Phases entered, in order.
    #[must_use]
    pub fn phases(&self) -> Vec<EnginePhase> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                HealthEvent::PhaseEntered(phase) => Some(phase),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn phase_entered(&self, phase: EnginePhase) {
        self.record(HealthEvent::PhaseEntered(phase));
    }

    fn bootstrap_succeeded(&self, _summary: &EngineSummary) {
        self.record(HealthEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &EngineError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }
}

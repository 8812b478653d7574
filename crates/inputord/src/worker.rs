//! Contract between the daemon and the ingestion pipeline it hosts.

use std::fmt;
use std::time::Duration;

use camino::Utf8PathBuf;
use thiserror::Error;
use tokio::runtime::Handle;

use crate::drain::ErrorReporter;

const WORKER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::worker");

/// Everything an ingestion worker receives when it starts.
#[derive(Clone)]
pub struct WorkerContext {
    /// Runtime the worker schedules its tasks on.
    pub runtime: Handle,
    /// Polling interval for the watched directory.
    pub interval: Duration,
    /// Directory the worker watches.
    pub watch_dir: Utf8PathBuf,
    /// Sink for errors that must not stop the worker.
    pub reporter: ErrorReporter,
}

impl fmt::Debug for WorkerContext {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("WorkerContext")
            .field("interval", &self.interval)
            .field("watch_dir", &self.watch_dir)
            .finish_non_exhaustive()
    }
}

/// Failure to start an ingestion worker.
#[derive(Debug, Error)]
#[error("ingestion worker failed to start: {message}")]
pub struct WorkerError {
    message: String,
}

impl WorkerError {
    /// Builds an error with a human readable reason.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// An ingestion pipeline hosted by the daemon.
///
/// `start` is called once the database is registered and must return
/// promptly, running its work on the supplied runtime. `shutdown` is called
/// after the shutdown signal arrives.
pub trait IngestWorker {
    /// Starts ingesting.
    fn start(&mut self, context: WorkerContext) -> Result<(), WorkerError>;

    /// Stops ingesting and releases the context.
    fn shutdown(&mut self);
}

/// Worker used when no ingestion pipeline is linked into the binary.
#[derive(Debug, Default)]
pub struct PlaceholderWorker {
    context: Option<WorkerContext>,
}

impl PlaceholderWorker {
    /// Whether the worker currently holds a context.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.context.is_some()
    }
}

impl IngestWorker for PlaceholderWorker {
    fn start(&mut self, context: WorkerContext) -> Result<(), WorkerError> {
        tracing::warn!(
            target: WORKER_TARGET,
            interval_ms = context.interval.as_millis(),
            watch_dir = %context.watch_dir,
            "no ingestion pipeline linked; idling"
        );
        self.context = Some(context);
        Ok(())
    }

    fn shutdown(&mut self) {
        if self.context.take().is_some() {
            tracing::info!(target: WORKER_TARGET, "ingestion worker stopped");
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use tokio::runtime::Builder;

    use super::*;
    use crate::drain::ErrorDrain;

    #[rstest]
    fn placeholder_holds_its_context_until_shutdown() {
        let runtime = Builder::new_current_thread().build().expect("runtime");
        let (reporter, _drain) = ErrorDrain::channel(4);
        let mut worker = PlaceholderWorker::default();
        worker
            .start(WorkerContext {
                runtime: runtime.handle().clone(),
                interval: Duration::from_millis(10),
                watch_dir: Utf8PathBuf::from("/tmp/relation"),
                reporter,
            })
            .expect("placeholder start");
        assert!(worker.is_running());

        worker.shutdown();
        assert!(!worker.is_running());
    }
}

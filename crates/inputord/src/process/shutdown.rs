use std::io;
use std::sync::Mutex;

use signal_hook::consts::signal::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use thiserror::Error;
use tracing::info;

use super::PROCESS_TARGET;

/// Abstraction over shutdown notification mechanisms.
pub trait ShutdownSignal: Send + Sync {
    /// Blocks until shutdown should proceed.
    fn wait(&self) -> Result<(), ShutdownError>;
}

/// Errors reported by shutdown signal listeners.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Installing signal handlers failed.
    #[error("failed to install signal handlers: {source}")]
    Install {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Shutdown listener for SIGINT and SIGTERM.
///
/// Handlers are registered by [`SystemShutdownSignal::install`], so a signal
/// delivered before [`ShutdownSignal::wait`] is still observed.
pub struct SystemShutdownSignal {
    signals: Mutex<Signals>,
}

impl SystemShutdownSignal {
    /// Registers the signal handlers.
    pub fn install() -> Result<Self, ShutdownError> {
        let signals =
            Signals::new([SIGINT, SIGTERM]).map_err(|source| ShutdownError::Install { source })?;
        Ok(Self {
            signals: Mutex::new(signals),
        })
    }
}

impl ShutdownSignal for SystemShutdownSignal {
    fn wait(&self) -> Result<(), ShutdownError> {
        let mut signals = self
            .signals
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(signal) = signals.forever().next() {
            info!(target: PROCESS_TARGET, signal, "shutdown signal received");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    use signal_hook::low_level::raise;

    use super::*;

    #[test]
    fn wait_returns_after_termination_signal() {
        let listener = SystemShutdownSignal::install().expect("install handlers");
        let (done_tx, done_rx) = mpsc::channel();
        let waiter = thread::spawn(move || {
            let result = listener.wait();
            done_tx.send(()).ok();
            result
        });

        assert!(
            done_rx.recv_timeout(Duration::from_millis(200)).is_err(),
            "waiter returned before any signal"
        );
        raise(SIGTERM).expect("raise SIGTERM");
        done_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("waiter should return promptly after the signal");
        waiter
            .join()
            .expect("waiter thread")
            .expect("wait should succeed");
    }
}

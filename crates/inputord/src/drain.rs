//! Background drain for errors reported asynchronously by the ingestion worker.
//!
//! Producers never block: when the queue is full the oldest queued error is
//! evicted and counted so the newest failure is always kept. The drain ends
//! when every reporter is gone or when [`DrainHandle::stop`] is called,
//! whichever comes first.

use std::error::Error as StdError;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded, select};
use tracing::{error, warn};

/// Queue capacity used by the daemon.
pub const DEFAULT_CAPACITY: usize = 256;

const DRAIN_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::drain");
const DRAIN_THREAD_NAME: &str = "inputor-drain";

/// Error value carried through the drain.
pub type ReportedError = Box<dyn StdError + Send + Sync + 'static>;

/// Producer side of the drain. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ErrorReporter {
    sender: Sender<ReportedError>,
    evictor: Receiver<ReportedError>,
    dropped: Arc<AtomicU64>,
}

impl ErrorReporter {
    /// Queues `error` for logging without blocking.
    pub fn report(&self, error: impl Into<ReportedError>) {
        let mut pending = error.into();
        loop {
            match self.sender.try_send(pending) {
                Ok(()) => return,
                Err(TrySendError::Full(rejected)) => {
                    if self.evictor.try_recv().is_ok() {
                        self.dropped.fetch_add(1, Ordering::Relaxed);
                    }
                    pending = rejected;
                }
                Err(TrySendError::Disconnected(_)) => {
                    self.dropped.fetch_add(1, Ordering::Relaxed);
                    return;
                }
            }
        }
    }

    /// Number of errors discarded because the queue was full.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Consumer side of the drain before its thread is started.
#[derive(Debug)]
pub struct ErrorDrain {
    receiver: Receiver<ReportedError>,
    dropped: Arc<AtomicU64>,
}

impl ErrorDrain {
    /// Creates a queue holding at most `capacity` errors.
    #[must_use]
    pub fn channel(capacity: usize) -> (ErrorReporter, Self) {
        let (sender, receiver) = bounded(capacity.max(1));
        let dropped = Arc::new(AtomicU64::new(0));
        let reporter = ErrorReporter {
            sender,
            evictor: receiver.clone(),
            dropped: Arc::clone(&dropped),
        };
        (reporter, Self { receiver, dropped })
    }

    /// Starts the drain thread, logging each error at error level.
    pub fn spawn(self) -> io::Result<DrainHandle> {
        self.spawn_with(|reported| {
            error!(target: DRAIN_TARGET, error = %reported, "ingestion error");
        })
    }

    /// Starts the drain thread, handing each error to `sink`.
    pub fn spawn_with<F>(self, mut sink: F) -> io::Result<DrainHandle>
    where
        F: FnMut(ReportedError) + Send + 'static,
    {
        let Self { receiver, dropped } = self;
        let (stop, stopped) = bounded::<()>(1);
        let thread = thread::Builder::new()
            .name(DRAIN_THREAD_NAME.to_owned())
            .spawn(move || {
                loop {
                    select! {
                        recv(receiver) -> reported => match reported {
                            Ok(reported) => sink(reported),
                            Err(_) => break,
                        },
                        recv(stopped) -> _ => break,
                    }
                }
                let total = dropped.load(Ordering::Relaxed);
                if total > 0 {
                    warn!(target: DRAIN_TARGET, dropped = total, "errors discarded while the drain was full");
                }
                receiver.len()
            })?;
        Ok(DrainHandle { thread, stop })
    }
}

/// Running drain thread.
#[derive(Debug)]
pub struct DrainHandle {
    thread: JoinHandle<usize>,
    stop: Sender<()>,
}

impl DrainHandle {
    /// Waits for the drain to finish on its own, which happens once every
    /// [`ErrorReporter`] has been dropped.
    pub fn join(self) {
        let Self { thread, stop } = self;
        Self::finish(thread);
        drop(stop);
    }

    /// Stops the drain without waiting for reporters and returns how many
    /// queued errors were left unlogged.
    #[must_use]
    pub fn stop(self) -> usize {
        let Self { thread, stop } = self;
        drop(stop);
        Self::finish(thread)
    }

    fn finish(thread: JoinHandle<usize>) -> usize {
        thread.join().unwrap_or_else(|_| {
            warn!(target: DRAIN_TARGET, "error drain panicked");
            0
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use rstest::rstest;

    use super::*;

    fn collecting_drain(drain: ErrorDrain) -> (DrainHandle, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handle = drain
            .spawn_with(move |reported| {
                sink.lock().expect("sink lock").push(reported.to_string());
            })
            .expect("spawn drain");
        (handle, seen)
    }

    #[rstest]
    fn full_queue_evicts_the_oldest_error() {
        let (reporter, drain) = ErrorDrain::channel(2);
        reporter.report("first");
        reporter.report("second");
        reporter.report("third");
        assert_eq!(reporter.dropped(), 1);

        let (handle, seen) = collecting_drain(drain);
        drop(reporter);
        handle.join();

        let recorded = seen.lock().expect("sink lock").clone();
        assert_eq!(recorded, vec!["second".to_owned(), "third".to_owned()]);
    }

    #[rstest]
    fn drain_delivers_every_error_from_every_reporter() {
        let (reporter, drain) = ErrorDrain::channel(DEFAULT_CAPACITY);
        let (handle, seen) = collecting_drain(drain);
        let clone = reporter.clone();
        reporter.report("from worker");
        clone.report(io::Error::other("from clone"));
        drop(reporter);
        drop(clone);
        handle.join();

        let recorded = seen.lock().expect("sink lock").clone();
        assert_eq!(recorded, vec!["from worker".to_owned(), "from clone".to_owned()]);
    }

    #[rstest]
    fn zero_capacity_still_queues_one_error() {
        let (reporter, drain) = ErrorDrain::channel(0);
        reporter.report("only");
        reporter.report("latest");
        assert_eq!(reporter.dropped(), 1);
        let (handle, seen) = collecting_drain(drain);
        drop(reporter);
        handle.join();
        assert_eq!(*seen.lock().expect("sink lock"), vec!["latest".to_owned()]);
    }

    #[rstest]
    fn stop_returns_while_a_reporter_is_still_alive() {
        let (reporter, drain) = ErrorDrain::channel(DEFAULT_CAPACITY);
        let (handle, seen) = collecting_drain(drain);
        reporter.report("before stop");

        let (done_tx, done_rx) = std::sync::mpsc::channel();
        let stopper = thread::spawn(move || {
            let pending = handle.stop();
            done_tx.send(()).ok();
            pending
        });
        done_rx
            .recv_timeout(std::time::Duration::from_secs(5))
            .expect("stop should not wait for live reporters");
        let pending = stopper.join().expect("stopper thread");

        let delivered = seen.lock().expect("sink lock").len();
        assert_eq!(delivered + pending, 1);
        reporter.report("after stop");
        assert_eq!(reporter.dropped(), 0);
    }
}

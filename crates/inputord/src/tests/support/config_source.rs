//! Configuration sources standing in for the encrypted store.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::settings::Configuration;
use crate::store::{ConfigSource, DecryptFailure, StoreError};

/// What the source returns on every load.
#[derive(Debug, Clone)]
pub enum SourceOutcome {
    /// A decrypted configuration.
    Present(Configuration),
    /// No store file.
    Missing,
    /// A store that fails authentication.
    Tampered,
}

/// Source with a fixed outcome that counts loads.
#[derive(Debug)]
pub struct TestConfigSource {
    outcome: SourceOutcome,
    loads: AtomicUsize,
}

impl TestConfigSource {
    #[must_use]
    pub const fn new(outcome: SourceOutcome) -> Self {
        Self {
            outcome,
            loads: AtomicUsize::new(0),
        }
    }

    /// Number of times the engine asked for the configuration.
    #[must_use]
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    fn store_path() -> PathBuf {
        PathBuf::from("/opt/inputor/inputord.enc")
    }
}

impl ConfigSource for TestConfigSource {
    fn load(&self) -> Result<Configuration, StoreError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        match &self.outcome {
            SourceOutcome::Present(configuration) => Ok(configuration.clone()),
            SourceOutcome::Missing => Err(StoreError::NotFound {
                path: Self::store_path(),
            }),
            SourceOutcome::Tampered => Err(StoreError::Decrypt {
                path: Self::store_path(),
                failure: DecryptFailure::Authentication,
            }),
        }
    }
}

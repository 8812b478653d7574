//! Encrypted-at-rest key/value store for operational secrets.
//!
//! The store is a single sealed file next to the executable. A missing file
//! means provisioning has not run yet; a file that fails to decrypt or decode
//! is rejected whole and never trusted partially.

mod envelope;
mod errors;
mod files;
mod key;

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::settings::Configuration;

pub use errors::{DecryptFailure, StoreError};
pub use key::{EnvKeySource, KeyError, KeyFileSource, KeySource, PassphraseKeySource, SecretKey};

pub(crate) const STORE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::store");

/// Supplies the configuration the engine starts from.
pub trait ConfigSource: Send + Sync {
    /// Loads the persisted configuration.
    fn load(&self) -> Result<Configuration, StoreError>;
}

/// Configuration store sealed under a key derived once at construction.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    key: SecretKey,
}

impl ConfigStore {
    /// Opens the store at `path`, deriving the key from `keys`.
    pub fn new(path: impl Into<PathBuf>, keys: &dyn KeySource) -> Result<Self, KeyError> {
        Ok(Self {
            path: path.into(),
            key: keys.secret_key()?,
        })
    }

    /// Location of the sealed file.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// Reads and decrypts the stored configuration.
    pub fn load(&self) -> Result<Configuration, StoreError> {
        let sealed = fs::read(&self.path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                StoreError::NotFound {
                    path: self.path.clone(),
                }
            } else {
                StoreError::Read {
                    path: self.path.clone(),
                    source,
                }
            }
        })?;
        let plaintext = envelope::open(&self.key, &sealed).map_err(|failure| self.decrypt(failure))?;
        let values: BTreeMap<String, String> = serde_json::from_slice(&plaintext)
            .map_err(|_| self.decrypt(DecryptFailure::Payload))?;
        debug!(
            target: STORE_TARGET,
            path = %self.path.display(),
            settings = values.len(),
            "configuration store loaded"
        );
        Ok(Configuration::from(values))
    }

    /// Encrypts `config` under a fresh nonce and replaces the stored file.
    pub fn save(&self, config: &Configuration) -> Result<(), StoreError> {
        let plaintext = serde_json::to_vec(config.as_map()).map_err(|error| StoreError::Encode {
            path: self.path.clone(),
            reason: error.to_string(),
        })?;
        let sealed = envelope::seal(&self.key, &plaintext).map_err(|error| StoreError::Encode {
            path: self.path.clone(),
            reason: error.to_string(),
        })?;
        files::replace_file(&self.path, &sealed).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })?;
        debug!(
            target: STORE_TARGET,
            path = %self.path.display(),
            settings = config.len(),
            "configuration store saved"
        );
        Ok(())
    }

    /// Loads the stored configuration as the starting point for provisioning.
    ///
    /// An absent store yields an empty configuration. An undecryptable store
    /// is reported and also yields an empty configuration, so provisioning
    /// rewrites it from scratch rather than reusing any of its contents.
    pub fn load_or_default(&self) -> Result<Configuration, StoreError> {
        match self.load() {
            Ok(config) => Ok(config),
            Err(StoreError::NotFound { .. }) => Ok(Configuration::new()),
            Err(StoreError::Decrypt { path, failure }) => {
                warn!(
                    target: STORE_TARGET,
                    path = %path.display(),
                    error = %failure,
                    "ignoring unreadable configuration store"
                );
                Ok(Configuration::new())
            }
            Err(other) => Err(other),
        }
    }

    fn decrypt(&self, failure: DecryptFailure) -> StoreError {
        StoreError::Decrypt {
            path: self.path.clone(),
            failure,
        }
    }
}

impl ConfigSource for ConfigStore {
    fn load(&self) -> Result<Configuration, StoreError> {
        Self::load(self)
    }
}

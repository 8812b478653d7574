use std::io;
use std::path::PathBuf;

use thiserror::Error;

use super::key::KeyError;

/// Why a store file could not be turned back into a configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecryptFailure {
    /// The file is not an envelope this daemon understands.
    #[error("malformed store file: {reason}")]
    Malformed {
        /// Short description of the structural defect.
        reason: &'static str,
    },
    /// Authentication failed: the file was altered or sealed with another key.
    #[error("store file failed authentication (tampered or sealed with a different key)")]
    Authentication,
    /// The authentic plaintext was not a string map.
    #[error("store payload is not a string map")]
    Payload,
}

/// Errors surfaced by the configuration store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No store file exists yet; provisioning must run first.
    #[error("configuration file '{path}' not found (run with --config to create it)")]
    NotFound {
        /// Expected store path.
        path: PathBuf,
    },
    /// The store exists but could not be decrypted or decoded.
    #[error("configuration file '{path}' could not be decrypted: {failure}")]
    Decrypt {
        /// Store path.
        path: PathBuf,
        /// Failure classification.
        #[source]
        failure: DecryptFailure,
    },
    /// Reading the store failed for a reason other than absence.
    #[error("failed to read configuration file '{path}': {source}")]
    Read {
        /// Store path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Writing the store failed.
    #[error("failed to write configuration file '{path}': {source}")]
    Write {
        /// Store path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Serialising or sealing the configuration failed.
    #[error("failed to encode configuration for '{path}': {reason}")]
    Encode {
        /// Store path.
        path: PathBuf,
        /// Description of the encoding failure.
        reason: String,
    },
    /// The store key could not be obtained.
    #[error("failed to obtain the configuration key: {source}")]
    Key {
        /// Underlying key source error.
        #[from]
        source: KeyError,
    },
}

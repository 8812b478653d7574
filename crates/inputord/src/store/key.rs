//! Sources of the symmetric key protecting the configuration store.
//!
//! The key is never compiled into the binary. Operators supply a passphrase
//! through the environment or a key file and the daemon stretches it into a
//! 256-bit key with a domain-separated SHA-256 digest.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Domain separation tag mixed into every derived key.
const KEY_DOMAIN: &[u8] = b"inputord-config-store-v1";

/// 256-bit symmetric key used to seal the configuration store.
///
/// The bytes are wiped when the key is dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey([u8; 32]);

impl SecretKey {
    /// Byte length of the key.
    pub const LEN: usize = 32;

    /// Wraps raw key material.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Derives a key from an operator supplied passphrase.
    #[must_use]
    pub fn derive(passphrase: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(KEY_DOMAIN);
        hasher.update(passphrase);
        Self(hasher.finalize().into())
    }

    pub(crate) const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str("SecretKey(..)")
    }
}

/// Errors raised while obtaining the store key.
#[derive(Debug, Error)]
pub enum KeyError {
    /// The passphrase environment variable was absent or empty.
    #[error("environment variable {name} must hold the configuration passphrase")]
    MissingEnv {
        /// Variable that was consulted.
        name: String,
    },
    /// The key file could not be read.
    #[error("failed to read key file '{path}': {source}")]
    ReadKeyFile {
        /// Key file path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The key file held no passphrase.
    #[error("key file '{path}' is empty")]
    EmptyKeyFile {
        /// Key file path.
        path: PathBuf,
    },
    /// An inline passphrase was empty.
    #[error("the configuration passphrase must not be empty")]
    EmptyPassphrase,
}

/// Capability that yields the store key.
pub trait KeySource: Send + Sync {
    /// Produces the key. Called once per store.
    fn secret_key(&self) -> Result<SecretKey, KeyError>;
}

/// Key source wrapping a passphrase held in memory.
pub struct PassphraseKeySource {
    passphrase: Zeroizing<String>,
}

impl PassphraseKeySource {
    /// Builds a source from `passphrase`.
    #[must_use]
    pub fn new(passphrase: impl Into<String>) -> Self {
        Self {
            passphrase: Zeroizing::new(passphrase.into()),
        }
    }
}

impl KeySource for PassphraseKeySource {
    fn secret_key(&self) -> Result<SecretKey, KeyError> {
        if self.passphrase.is_empty() {
            return Err(KeyError::EmptyPassphrase);
        }
        Ok(SecretKey::derive(self.passphrase.as_bytes()))
    }
}

/// Key source reading the passphrase from an environment variable.
#[derive(Debug, Clone)]
pub struct EnvKeySource {
    name: String,
}

impl EnvKeySource {
    /// Builds a source reading `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl KeySource for EnvKeySource {
    fn secret_key(&self) -> Result<SecretKey, KeyError> {
        let passphrase = env::var(&self.name)
            .ok()
            .filter(|value| !value.is_empty())
            .map(Zeroizing::new)
            .ok_or_else(|| KeyError::MissingEnv {
                name: self.name.clone(),
            })?;
        Ok(SecretKey::derive(passphrase.as_bytes()))
    }
}

/// Key source reading the passphrase from a file.
#[derive(Debug, Clone)]
pub struct KeyFileSource {
    path: PathBuf,
}

impl KeyFileSource {
    /// Builds a source reading `path`.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl KeySource for KeyFileSource {
    fn secret_key(&self) -> Result<SecretKey, KeyError> {
        let contents =
            Zeroizing::new(
                fs::read_to_string(&self.path).map_err(|source| KeyError::ReadKeyFile {
                    path: self.path.clone(),
                    source,
                })?,
            );
        let passphrase = contents.trim_end_matches(['\r', '\n']);
        if passphrase.is_empty() {
            return Err(KeyError::EmptyKeyFile {
                path: self.path.clone(),
            });
        }
        Ok(SecretKey::derive(passphrase.as_bytes()))
    }
}

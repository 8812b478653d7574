//! Derives the artefact paths owned by one installed binary.
//!
//! The encrypted configuration store and the log files live next to the
//! executable and are named after the name it was invoked under, so several
//! differently named copies or symlinks of the daemon can share a directory
//! without clobbering each other.

use std::env;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::defaults::{LOG_EXTENSION, STORE_EXTENSION};
use crate::logging::LogLevel;

/// Canonical paths for the files written next to the executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessPaths {
    directory: PathBuf,
    process_name: String,
}

impl ProcessPaths {
    /// Derives paths for the currently running executable.
    pub fn current() -> Result<Self, PathsError> {
        let invoked_as = env::args_os().next().map(PathBuf::from);
        Self::from_invocation(invoked_as.as_deref(), env::current_exe)
    }

    /// Derives paths from the name the daemon was invoked under.
    ///
    /// `invoked_as` supplies the base name and, when it carries a directory,
    /// the directory too. A bare name takes its directory from `current_exe`.
    pub fn from_invocation<F>(invoked_as: Option<&Path>, current_exe: F) -> Result<Self, PathsError>
    where
        F: FnOnce() -> io::Result<PathBuf>,
    {
        let locate = || current_exe().map_err(|source| PathsError::CurrentExecutable { source });
        match invoked_as {
            Some(invoked) if non_empty_parent(invoked).is_some() => Self::from_executable(invoked),
            Some(invoked) => {
                let process_name = process_name_of(invoked)?;
                let resolved = Self::from_executable(&locate()?)?;
                Ok(Self {
                    directory: resolved.directory,
                    process_name,
                })
            }
            None => Self::from_executable(&locate()?),
        }
    }

    /// Derives paths for the executable at `executable`.
    pub fn from_executable(executable: &Path) -> Result<Self, PathsError> {
        let directory =
            non_empty_parent(executable).map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        Ok(Self {
            directory,
            process_name: process_name_of(executable)?,
        })
    }

    /// Directory holding the executable and its artefacts.
    #[must_use]
    pub fn directory(&self) -> &Path {
        self.directory.as_path()
    }

    /// Base name of the executable without its extension.
    #[must_use]
    pub fn process_name(&self) -> &str {
        self.process_name.as_str()
    }

    /// Path to the encrypted configuration store.
    #[must_use]
    pub fn store_path(&self) -> PathBuf {
        self.directory
            .join(format!("{}.{STORE_EXTENSION}", self.process_name))
    }

    /// Path to the log file used at `level`.
    #[must_use]
    pub fn log_path(&self, level: LogLevel) -> PathBuf {
        self.directory.join(format!(
            "{}{}.{LOG_EXTENSION}",
            self.process_name,
            level.file_suffix()
        ))
    }
}

fn non_empty_parent(path: &Path) -> Option<&Path> {
    path.parent().filter(|parent| !parent.as_os_str().is_empty())
}

fn process_name_of(path: &Path) -> Result<String, PathsError> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| PathsError::MissingFileName {
            path: path.to_path_buf(),
        })
}

/// Errors raised while deriving process artefact paths.
#[derive(Debug, Error)]
pub enum PathsError {
    /// The running executable could not be located.
    #[error("failed to locate the running executable: {source}")]
    CurrentExecutable {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The executable path did not end in a usable file name.
    #[error("executable path '{path}' has no usable file name")]
    MissingFileName {
        /// Offending executable path.
        path: PathBuf,
    },
}

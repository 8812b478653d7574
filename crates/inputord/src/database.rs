//! Turns validated configuration into the shared MySQL connection pool.

use std::fmt;
use std::io;
use std::num::ParseIntError;
use std::time::Duration;

use once_cell::sync::OnceCell;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use thiserror::Error;
use tokio::runtime::{Builder, Runtime};
use tracing::info;
use zeroize::Zeroizing;

use crate::process::PROCESS_TARGET;
use crate::settings::{
    Configuration, DB_DATABASE, DB_HOSTNAME, DB_PASSWORD, DB_PORT, DB_USERNAME, redacted,
};

/// Alias the pool is registered under.
pub const DEFAULT_ALIAS: &str = "default";
/// Connection character set.
pub const CHARSET: &str = "utf8mb4";
/// Session time zone applied to every connection.
pub const SESSION_TIME_ZONE: &str = "+09:00";
/// Connections kept open while idle.
pub const MIN_CONNECTIONS: u32 = 3;
/// Upper bound on open connections.
pub const MAX_CONNECTIONS: u32 = 3;
/// How long registration waits for a connection.
pub const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

const RUNTIME_THREAD_NAME: &str = "inputor-db";

/// Errors raised while deriving a [`ConnectionDescriptor`].
#[derive(Debug, Error)]
pub enum DescriptorError {
    /// A required connection key was absent or empty.
    #[error("configuration key '{key}' is missing")]
    MissingKey {
        /// Name of the missing key.
        key: &'static str,
    },
    /// The configured port is not a valid TCP port.
    #[error("configured port '{value}' is invalid: {source}")]
    InvalidPort {
        /// Raw configured value.
        value: String,
        /// Parse failure.
        #[source]
        source: ParseIntError,
    },
}

/// Everything needed to open the database pool.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    host: String,
    port: u16,
    username: String,
    password: Zeroizing<String>,
    database: String,
}

impl ConnectionDescriptor {
    /// Builds the descriptor from the five `db.*` configuration keys.
    pub fn from_configuration(configuration: &Configuration) -> Result<Self, DescriptorError> {
        let port_value = required(configuration, DB_PORT)?;
        let port = port_value
            .parse::<u16>()
            .map_err(|source| DescriptorError::InvalidPort {
                value: port_value.to_owned(),
                source,
            })?;
        Ok(Self {
            host: required(configuration, DB_HOSTNAME)?.to_owned(),
            port,
            username: required(configuration, DB_USERNAME)?.to_owned(),
            password: Zeroizing::new(required(configuration, DB_PASSWORD)?.to_owned()),
            database: required(configuration, DB_DATABASE)?.to_owned(),
        })
    }

    /// Database server host name.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Database server port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Login user.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Schema selected on connect.
    #[must_use]
    pub fn database(&self) -> &str {
        &self.database
    }

    fn connect_options(&self) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.username)
            .password(&self.password)
            .database(&self.database)
            .charset(CHARSET)
            .timezone(Some(SESSION_TIME_ZONE.to_owned()))
    }
}

fn required<'a>(
    configuration: &'a Configuration,
    key: &'static str,
) -> Result<&'a str, DescriptorError> {
    configuration
        .get(key)
        .filter(|value| !value.is_empty())
        .ok_or(DescriptorError::MissingKey { key })
}

impl fmt::Display for ConnectionDescriptor {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "mysql://{}:{}@{}:{}/{}?charset={CHARSET}&time_zone={SESSION_TIME_ZONE}",
            self.username,
            redacted(),
            self.host,
            self.port,
            self.database
        )
    }
}

impl fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ConnectionDescriptor")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &redacted())
            .field("database", &self.database)
            .finish()
    }
}

/// Errors surfaced by a [`DatabaseRegistrar`].
#[derive(Debug, Error)]
pub enum RegistrarError {
    /// The configuration did not describe a usable connection.
    #[error("invalid connection settings: {source}")]
    Descriptor {
        /// Underlying descriptor error.
        #[from]
        source: DescriptorError,
    },
    /// A pool is already registered under the alias.
    #[error("database alias '{alias}' is already registered")]
    AlreadyRegistered {
        /// Alias that was taken.
        alias: &'static str,
    },
    /// The registrar could not start its connection runtime.
    #[error("failed to start database runtime: {source}")]
    Runtime {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Opening the pool failed.
    #[error("failed to connect to {descriptor}: {source}")]
    Connect {
        /// Redacted connection string.
        descriptor: String,
        /// Underlying driver error.
        #[source]
        source: sqlx::Error,
    },
}

/// Opens the database connection described by the configuration.
pub trait DatabaseRegistrar: Send + Sync {
    /// Registers the pool for `descriptor`. Failures are not retried.
    fn register(&self, descriptor: &ConnectionDescriptor) -> Result<(), RegistrarError>;
}

/// Registrar backed by a `sqlx` MySQL pool.
///
/// The registrar owns a small runtime that keeps the pool's connections
/// driven for as long as the registrar lives.
pub struct MySqlRegistrar {
    runtime: Runtime,
    pool: OnceCell<MySqlPool>,
}

impl MySqlRegistrar {
    /// Builds a registrar with its own connection runtime.
    pub fn new() -> Result<Self, RegistrarError> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name(RUNTIME_THREAD_NAME)
            .enable_all()
            .build()
            .map_err(|source| RegistrarError::Runtime { source })?;
        Ok(Self {
            runtime,
            pool: OnceCell::new(),
        })
    }

    /// The registered pool, once [`DatabaseRegistrar::register`] succeeded.
    #[must_use]
    pub fn pool(&self) -> Option<&MySqlPool> {
        self.pool.get()
    }
}

impl fmt::Debug for MySqlRegistrar {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("MySqlRegistrar")
            .field("registered", &self.pool.get().is_some())
            .finish_non_exhaustive()
    }
}

impl DatabaseRegistrar for MySqlRegistrar {
    fn register(&self, descriptor: &ConnectionDescriptor) -> Result<(), RegistrarError> {
        if self.pool.get().is_some() {
            return Err(RegistrarError::AlreadyRegistered {
                alias: DEFAULT_ALIAS,
            });
        }
        let options = descriptor.connect_options();
        let pool = self
            .runtime
            .block_on(
                MySqlPoolOptions::new()
                    .min_connections(MIN_CONNECTIONS)
                    .max_connections(MAX_CONNECTIONS)
                    .acquire_timeout(ACQUIRE_TIMEOUT)
                    .connect_with(options),
            )
            .map_err(|source| RegistrarError::Connect {
                descriptor: descriptor.to_string(),
                source,
            })?;
        self.pool
            .set(pool)
            .map_err(|_| RegistrarError::AlreadyRegistered {
                alias: DEFAULT_ALIAS,
            })?;
        info!(
            target: PROCESS_TARGET,
            alias = DEFAULT_ALIAS,
            database = %descriptor,
            "database registered"
        );
        Ok(())
    }
}

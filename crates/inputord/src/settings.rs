//! The operational key/value settings persisted in the configuration store.

use std::collections::BTreeMap;
use std::fmt;

/// Hostname of the database server.
pub const DB_HOSTNAME: &str = "db.hostname";
/// Port of the database server.
pub const DB_PORT: &str = "db.port";
/// Account used to connect to the database.
pub const DB_USERNAME: &str = "db.username";
/// Password of the database account.
pub const DB_PASSWORD: &str = "db.password";
/// Name of the database (schema) to open.
pub const DB_DATABASE: &str = "db.database";

/// Keys every usable configuration carries, in prompt order.
pub const REQUIRED_KEYS: [&str; 5] = [DB_HOSTNAME, DB_PORT, DB_USERNAME, DB_PASSWORD, DB_DATABASE];

const REDACTED: &str = "********";

/// Mapping from setting key to value; keys are unique.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Configuration {
    values: BTreeMap<String, String>,
}

impl Configuration {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Stores `value` under `key`, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.values.insert(key.into(), value.into())
    }

    /// Whether `key` is present.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Iterates the keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Number of stored settings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no settings are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Required keys that are absent or empty.
    #[must_use]
    pub fn missing_required(&self) -> Vec<&'static str> {
        REQUIRED_KEYS
            .into_iter()
            .filter(|key| self.get(key).is_none_or(str::is_empty))
            .collect()
    }

    pub(crate) const fn as_map(&self) -> &BTreeMap<String, String> {
        &self.values
    }
}

impl From<BTreeMap<String, String>> for Configuration {
    fn from(values: BTreeMap<String, String>) -> Self {
        Self { values }
    }
}

impl<K, V> FromIterator<(K, V)> for Configuration
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_map()
            .entries(self.values.iter().map(|(key, value)| {
                let shown = if is_secret_key(key) {
                    REDACTED
                } else {
                    value.as_str()
                };
                (key, shown)
            }))
            .finish()
    }
}

/// Whether values stored under `key` must never be echoed.
pub(crate) fn is_secret_key(key: &str) -> bool {
    key.ends_with("password")
}

/// Placeholder shown instead of a secret value.
pub(crate) const fn redacted() -> &'static str {
    REDACTED
}

//! Bootstrap inputs shared by the inputor daemon and its tests.
//!
//! The crate owns the parsed command-line flags ([`BootstrapConfig`]), the
//! logging verbosity ([`LogLevel`]), and the deterministic file layout next to
//! the executable ([`ProcessPaths`]). Nothing here touches process-wide state;
//! the daemon receives these values explicitly.

mod bootstrap;
pub mod defaults;
mod logging;
mod paths;

pub use bootstrap::BootstrapConfig;
pub use logging::{LogLevel, LogLevelParseError};
pub use paths::{PathsError, ProcessPaths};

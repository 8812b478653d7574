//! Registrar doubles: a `mockall` mock and a recording fake.

use std::sync::Mutex;

use mockall::mock;

use crate::database::{ConnectionDescriptor, DatabaseRegistrar, RegistrarError};

mock! {
    pub Registrar {}
    impl DatabaseRegistrar for Registrar {
        fn register(&self, descriptor: &ConnectionDescriptor) -> Result<(), RegistrarError>;
    }
}

/// Error returned by registrars that cannot reach the server.
#[must_use]
pub fn connect_failure(descriptor: &ConnectionDescriptor) -> RegistrarError {
    RegistrarError::Connect {
        descriptor: descriptor.to_string(),
        source: sqlx::Error::PoolTimedOut,
    }
}

/// Registrar that records each descriptor and optionally refuses it.
#[derive(Debug, Default)]
pub struct RecordingRegistrar {
    registered: Mutex<Vec<String>>,
    unreachable: Mutex<bool>,
}

impl RecordingRegistrar {
    /// Makes every later registration fail.
    pub fn make_unreachable(&self) {
        *self.unreachable.lock().expect("registrar mutex poisoned") = true;
    }

    /// Descriptors passed to `register`, rendered with the password hidden.
    #[must_use]
    pub fn registered(&self) -> Vec<String> {
        self.registered
            .lock()
            .expect("registrar mutex poisoned")
            .clone()
    }
}

impl DatabaseRegistrar for RecordingRegistrar {
    fn register(&self, descriptor: &ConnectionDescriptor) -> Result<(), RegistrarError> {
        self.registered
            .lock()
            .expect("registrar mutex poisoned")
            .push(descriptor.to_string());
        if *self.unreachable.lock().expect("registrar mutex poisoned") {
            return Err(connect_failure(descriptor));
        }
        Ok(())
    }
}

//! Test suites for the daemon bootstrap.

mod behaviour;
mod support;

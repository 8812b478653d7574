//! Behavioural tests for the engine startup sequence.

use std::cell::RefCell;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use crate::engine::EnginePhase;

use super::support::{self, EngineWorld, HealthEvent, SourceOutcome};

type StepResult = Result<(), String>;

#[fixture]
fn world() -> RefCell<EngineWorld> {
    support::world()
}

#[given("a stored configuration with every required key")]
fn given_complete_configuration(world: &RefCell<EngineWorld>) {
    world
        .borrow_mut()
        .use_outcome(SourceOutcome::Present(support::complete_configuration()));
}

#[given("no stored configuration")]
fn given_missing_store(world: &RefCell<EngineWorld>) {
    world.borrow_mut().use_outcome(SourceOutcome::Missing);
}

#[given("a tampered configuration store")]
fn given_tampered_store(world: &RefCell<EngineWorld>) {
    world.borrow_mut().use_outcome(SourceOutcome::Tampered);
}

#[given("a stored configuration without {key}")]
fn given_configuration_without(world: &RefCell<EngineWorld>, key: String) {
    world.borrow_mut().remove_key(key.trim_matches('"'));
}

#[given("the worker runtime is granted {count} threads")]
fn given_cpu(world: &RefCell<EngineWorld>, count: u16) {
    world.borrow_mut().use_cpu(count);
}

#[given("an unreachable database")]
fn given_unreachable_database(world: &RefCell<EngineWorld>) {
    world.borrow().registrar.make_unreachable();
}

#[when("the engine starts")]
fn when_engine_starts(world: &RefCell<EngineWorld>) {
    world.borrow_mut().start();
}

#[when("shutdown is requested")]
fn when_shutdown_requested(world: &RefCell<EngineWorld>) -> StepResult {
    world.borrow_mut().begin_shutdown()
}

#[then("startup succeeds")]
fn then_startup_succeeds(world: &RefCell<EngineWorld>) {
    let borrowed = world.borrow();
    let result = borrowed.start_result().expect("engine never started");
    assert!(result.is_ok(), "startup failed: {result:?}");
}

#[then("startup fails mentioning {text}")]
fn then_startup_fails(world: &RefCell<EngineWorld>, text: String) -> StepResult {
    let needle = text.trim_matches('"');
    let borrowed = world.borrow();
    match borrowed.start_result() {
        Some(Err(error)) if error.to_string().contains(needle) => Ok(()),
        Some(Err(error)) => Err(format!("error '{error}' does not mention '{needle}'")),
        other => Err(format!("expected a startup failure, got {other:?}")),
    }
}

#[then("the engine is in the {phase} phase")]
fn then_engine_phase(world: &RefCell<EngineWorld>, phase: String) -> StepResult {
    let current = world
        .borrow()
        .phase()
        .ok_or_else(|| "engine was never built".to_owned())?;
    if current.to_string() == phase {
        Ok(())
    } else {
        Err(format!("expected phase {phase}, engine is in {current}"))
    }
}

#[then("the worker runtime has {count} threads")]
fn then_worker_threads(world: &RefCell<EngineWorld>, count: usize) {
    assert_eq!(world.borrow().worker_threads(), Some(count));
}

#[then("the database was registered once")]
fn then_registered_once(world: &RefCell<EngineWorld>) {
    let registered = world.borrow().registrar.registered();
    assert_eq!(registered.len(), 1, "registrations: {registered:?}");
    assert!(
        registered.iter().all(|descriptor| !descriptor.contains("s3cret")),
        "password leaked into descriptor: {registered:?}"
    );
}

#[then("the database was never registered")]
fn then_never_registered(world: &RefCell<EngineWorld>) {
    let registered = world.borrow().registrar.registered();
    assert!(registered.is_empty(), "unexpected registrations: {registered:?}");
}

#[then("the reporter recorded every startup phase in order")]
fn then_phases_in_order(world: &RefCell<EngineWorld>) {
    let phases = world.borrow().reporter.phases();
    assert_eq!(
        phases,
        vec![
            EnginePhase::ConfigLoaded,
            EnginePhase::Validated,
            EnginePhase::LoggerReady,
            EnginePhase::DatabaseReady,
            EnginePhase::Running,
        ]
    );
    assert!(
        world
            .borrow()
            .reporter
            .events()
            .contains(&HealthEvent::BootstrapSucceeded),
        "bootstrap success event missing"
    );
}

#[then("the reporter recorded bootstrap failure")]
fn then_reporter_failure(world: &RefCell<EngineWorld>) {
    let events = world.borrow().reporter.events();
    let failed = events
        .iter()
        .any(|event| matches!(event, HealthEvent::BootstrapFailed(_)));
    assert!(failed, "bootstrap failure event missing: {events:?}");
}

#[scenario(path = "tests/features/engine_startup.feature")]
fn engine_startup(#[from(world)] _: RefCell<EngineWorld>) -> Result<(), String> {
    Ok(())
}

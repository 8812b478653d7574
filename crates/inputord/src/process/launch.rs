//! Supervises daemon launch sequencing and runtime orchestration.

use std::ffi::OsString;
use std::fmt;
use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::sync::Arc;

use clap::error::ErrorKind;
use tracing::{error, info, warn};

use inputor_config::defaults::{KEY_ENV_VAR, PRODUCT_NAME, PRODUCT_VERSION};
use inputor_config::{BootstrapConfig, ProcessPaths};

use crate::database::{DatabaseRegistrar, MySqlRegistrar};
use crate::drain::{DEFAULT_CAPACITY, ErrorDrain};
use crate::engine::{Engine, EngineDeps};
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::provision::Provisioner;
use crate::store::{ConfigSource, ConfigStore, EnvKeySource, KeyFileSource, KeySource};
use crate::telemetry::{self, TelemetryHandle};
use crate::worker::{IngestWorker, PlaceholderWorker, WorkerContext};

use super::errors::LaunchError;
use super::shutdown::{ShutdownSignal, SystemShutdownSignal};
use super::{PROCESS_TARGET, SHUTDOWN_TIMEOUT};

/// Collaborators required to run the engine until shutdown.
pub(crate) struct ServiceDeps<W, S> {
    pub(crate) config: Arc<dyn ConfigSource>,
    pub(crate) registrar: Arc<dyn DatabaseRegistrar>,
    pub(crate) reporter: Arc<dyn HealthReporter>,
    pub(crate) worker: W,
    pub(crate) shutdown: S,
}

/// Runs the daemon with the process arguments and standard streams.
///
/// `args` includes the program name. Usage errors, startup failures and
/// provisioning failures are written to `stderr` and yield a failure exit
/// code.
pub fn run<I, T>(args: I, stdout: &mut dyn Write, stderr: &mut dyn Write) -> ExitCode
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let config = match BootstrapConfig::load_from_iter(args) {
        Ok(config) => config,
        Err(usage) => return report_usage(&usage, stdout, stderr),
    };
    if config.version {
        emit(stdout, format_args!("{PRODUCT_NAME} {PRODUCT_VERSION}"));
        return ExitCode::SUCCESS;
    }
    match launch(&config, stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => {
            error!(target: PROCESS_TARGET, error = %failure, "daemon stopped");
            emit(stderr, format_args!("{failure}"));
            ExitCode::FAILURE
        }
    }
}

fn report_usage(usage: &clap::Error, stdout: &mut dyn Write, stderr: &mut dyn Write) -> ExitCode {
    let rendered = usage.render();
    match usage.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            emit(stdout, format_args!("{rendered}"));
            ExitCode::SUCCESS
        }
        _ => {
            emit(stderr, format_args!("{rendered}"));
            ExitCode::FAILURE
        }
    }
}

fn emit(out: &mut dyn Write, line: fmt::Arguments<'_>) {
    if let Err(failure) = writeln!(out, "{line}").and_then(|()| out.flush()) {
        warn!(target: PROCESS_TARGET, error = %failure, "failed to write to the terminal");
    }
}

fn launch(config: &BootstrapConfig, stdout: &mut dyn Write) -> Result<(), LaunchError> {
    let paths = ProcessPaths::current()?;
    let telemetry = telemetry::initialise(&paths, config.log_level())?;
    let keys = key_source(config);
    let store = ConfigStore::new(paths.store_path(), keys.as_ref())?;

    if config.configure {
        let stdin = io::stdin();
        return run_provisioning(&store, &config.extra_keys(), stdin.lock(), stdout);
    }

    let shutdown = SystemShutdownSignal::install()?;
    let services = ServiceDeps {
        config: Arc::new(store),
        registrar: Arc::new(MySqlRegistrar::new()?),
        reporter: Arc::new(StructuredHealthReporter::new()),
        worker: PlaceholderWorker::default(),
        shutdown,
    };
    serve(config.clone(), telemetry, services)
}

/// Picks the key file when one is configured, the environment otherwise.
pub(crate) fn key_source(config: &BootstrapConfig) -> Box<dyn KeySource> {
    match &config.key_file {
        Some(path) => Box::new(KeyFileSource::new(path)),
        None => Box::new(EnvKeySource::new(KEY_ENV_VAR)),
    }
}

/// Interactive provisioning pass: prompts, saves and reports the outcome.
pub(crate) fn run_provisioning<R, W>(
    store: &ConfigStore,
    extra_keys: &[String],
    input: R,
    output: W,
) -> Result<(), LaunchError>
where
    R: BufRead,
    W: Write,
{
    let mut provisioner = Provisioner::new(input, output);
    provisioner.announce("Setting configuration");
    let existing = store.load_or_default()?;
    let provisioned = provisioner.provision(existing, extra_keys);
    store.save(&provisioned)?;
    provisioner.announce("Done");
    info!(
        target: PROCESS_TARGET,
        path = %store.path().display(),
        keys = provisioned.len(),
        "configuration saved"
    );
    Ok(())
}

/// Starts the engine and worker, then blocks until shutdown is requested.
pub(crate) fn serve<W, S>(
    bootstrap: BootstrapConfig,
    telemetry: TelemetryHandle,
    services: ServiceDeps<W, S>,
) -> Result<(), LaunchError>
where
    W: IngestWorker,
    S: ShutdownSignal,
{
    let ServiceDeps {
        config,
        registrar,
        reporter,
        mut worker,
        shutdown,
    } = services;
    let interval = bootstrap.interval();
    let watch_dir = bootstrap.watch_dir.clone();
    let mut engine = Engine::new(
        bootstrap,
        telemetry,
        EngineDeps {
            config,
            registrar,
            reporter,
        },
    );
    engine.start()?;

    let (errors, drain) = ErrorDrain::channel(DEFAULT_CAPACITY);
    let drain_handle = drain
        .spawn()
        .map_err(|source| LaunchError::Drain { source })?;
    let handle = engine
        .worker_runtime()
        .ok_or(LaunchError::MissingWorkerRuntime)?
        .handle()
        .clone();
    worker.start(WorkerContext {
        runtime: handle,
        interval,
        watch_dir,
        reporter: errors,
    })?;
    info!(target: PROCESS_TARGET, "Started");

    shutdown.wait()?;
    engine.begin_shutdown()?;
    worker.shutdown();
    if let Some(worker_runtime) = engine.take_worker_runtime() {
        worker_runtime.shutdown_timeout(SHUTDOWN_TIMEOUT);
    }
    let pending = drain_handle.stop();
    if pending > 0 {
        warn!(target: PROCESS_TARGET, pending, "queued ingestion errors discarded at shutdown");
    }
    info!(target: PROCESS_TARGET, "shutdown sequence completed");
    Ok(())
}

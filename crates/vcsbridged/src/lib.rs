//! Dispatch core of the out-of-process version-control bridge.
//!
//! An editor launches a bridge process and talks to it over stdin and stdout,
//! one JSON object per line. This crate owns everything between the wire and
//! a concrete backend: the [`VersionControlBackend`] trait, the engine-owned
//! [`Session`], and the [`DispatchEngine`] with its command envelope and
//! connectivity state machine.
//!
//! A backend binary is a thin `main` around [`run`]:
//!
//! ```rust,no_run
//! use std::process::ExitCode;
//! use vcsbridged::VersionControlBackend;
//!
//! fn serve_stdio<B: VersionControlBackend>(backend: B) -> ExitCode {
//!     vcsbridged::run(backend)
//! }
//! ```
//!
//! [`run`] resolves the configuration from either argument form, installs
//! telemetry, and serves the host until it sends `exit` (success) or the
//! session ends abnormally (failure).

mod backend;
pub mod dispatch;
mod session;
pub mod telemetry;

use std::io::{self, Write};
use std::process::ExitCode;

use tracing::{error, info};
use vcsbridge_config::{Config, ConfigError, PROGRAM_NAME, ProcessArguments};
use vcsbridge_protocol::JsonlConnection;

pub use self::backend::{BackendError, BackendResult, VersionControlBackend};
pub use self::dispatch::{
    DispatchEngine, EngineSettings, Flow, NegotiationError, Outcome, RunError, negotiate_version,
};
pub use self::session::{Connectivity, Session};
pub use self::telemetry::{TelemetryError, TelemetryHandle};

const RUN_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::run");

/// Serves the host over stdio with the process arguments.
///
/// Returns success only when the host ended the session with `exit`.
#[must_use]
pub fn run<B: VersionControlBackend>(backend: B) -> ExitCode {
    let arguments = ProcessArguments::detect(std::env::args_os());
    let config = match Config::load(arguments) {
        Ok(config) => config,
        Err(ConfigError::Parse { source }) => {
            let _ = source.print();
            return if source.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
        Err(other) => {
            let _ = writeln!(io::stderr(), "{PROGRAM_NAME}: {other}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(telemetry_error) = telemetry::initialise(&config, &backend.log_file_name()) {
        let _ = writeln!(io::stderr(), "{PROGRAM_NAME}: {telemetry_error}");
        return ExitCode::FAILURE;
    }

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut connection = JsonlConnection::new(stdin.lock(), stdout.lock());
    match serve(backend, &config, &mut connection) {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}

/// Runs the command loop for `backend` over `connection`.
///
/// # Errors
///
/// Returns [`RunError`] when the loop ends without an `exit` command.
pub fn serve<B, C>(backend: B, config: &Config, connection: &mut C) -> Result<(), RunError>
where
    B: VersionControlBackend,
    C: vcsbridge_protocol::Connection,
{
    let mut engine = DispatchEngine::from_config(backend, config);
    info!(
        target: RUN_TARGET,
        backend = engine.backend().name(),
        project_path = ?config.project_path(),
        reconnect_attempts = config.reconnect_attempts(),
        "bridge starting"
    );
    engine.run(connection).inspect_err(|run_error| {
        error!(target: RUN_TARGET, error = %run_error, "bridge stopped");
    })
}

#[cfg(test)]
mod tests;

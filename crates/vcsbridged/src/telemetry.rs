//! Structured telemetry initialisation for the bridge.
//!
//! Stdout carries the protocol, so logs go to stderr or, when a log
//! directory is configured, to the backend's log file inside it.

use std::fs::{self, File, OpenOptions};
use std::io::{self, IsTerminal};
use std::sync::Mutex;

use camino::{Utf8Path, Utf8PathBuf};
use once_cell::sync::OnceCell;
use tracing::{Subscriber, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use vcsbridge_config::{Config, LogFormat};

static TELEMETRY_GUARD: OnceCell<()> = OnceCell::new();

/// Handle returned when telemetry has been initialised.
#[derive(Debug, Default, Clone, Copy)]
pub struct TelemetryHandle;

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Failed to parse the configured log filter expression.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// Failed to open the log file.
    #[error("failed to open log file '{path}': {source}")]
    LogFile {
        /// Path of the log file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Failed to install the tracing subscriber.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Configures the global tracing subscriber when invoked for the first time.
///
/// Repeated calls are idempotent: only the first installs a subscriber.
///
/// # Errors
///
/// Returns [`TelemetryError`] when the filter is invalid, the log file cannot
/// be opened, or another subscriber is already installed.
pub fn initialise(config: &Config, log_file_name: &str) -> Result<TelemetryHandle, TelemetryError> {
    TELEMETRY_GUARD
        .get_or_try_init(|| install_subscriber(config, log_file_name))
        .map(|_| TelemetryHandle)
}

fn install_subscriber(config: &Config, log_file_name: &str) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_new(config.log_filter())
        .map_err(|error| TelemetryError::Filter(error.to_string()))?;

    let (writer, ansi) = match config.log_dir() {
        Some(dir) => {
            let file = open_log_file(dir, log_file_name)?;
            (BoxMakeWriter::new(Mutex::new(file)), false)
        }
        None => (BoxMakeWriter::new(io::stderr), io::stderr().is_terminal()),
    };

    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(writer)
        .with_ansi(ansi)
        .with_timer(fmt::time::UtcTime::rfc_3339());

    let subscriber: Box<dyn Subscriber + Send + Sync> = match config.log_format() {
        LogFormat::Json => Box::new(builder.json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder.compact().finish()),
    };

    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)
}

/// Opens `dir/name` for appending, creating the directory when needed.
pub(crate) fn open_log_file(dir: &Utf8Path, name: &str) -> Result<File, TelemetryError> {
    let path = dir.join(name);
    let to_error = |source| TelemetryError::LogFile {
        path: path.clone(),
        source,
    };
    fs::create_dir_all(dir).map_err(to_error)?;
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(to_error)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    use super::*;

    fn utf8_dir(temp: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf-8 temp dir")
    }

    #[test]
    fn creates_missing_log_directory() {
        let temp = TempDir::new().expect("temp dir");
        let dir = utf8_dir(&temp).join("logs");

        let mut file = open_log_file(&dir, "memory.log").expect("open log file");
        writeln!(file, "hello").expect("write");

        let contents = fs::read_to_string(dir.join("memory.log")).expect("read back");
        assert_eq!(contents, "hello\n");
    }

    #[test]
    fn appends_to_existing_log() {
        let temp = TempDir::new().expect("temp dir");
        let dir = utf8_dir(&temp);

        for line in ["first", "second"] {
            let mut file = open_log_file(&dir, "memory.log").expect("open log file");
            writeln!(file, "{line}").expect("write");
        }

        let contents = fs::read_to_string(dir.join("memory.log")).expect("read back");
        assert_eq!(contents, "first\nsecond\n");
    }

    #[test]
    fn unwritable_target_reports_path() {
        let temp = TempDir::new().expect("temp dir");
        let dir = utf8_dir(&temp);
        fs::create_dir(dir.join("occupied")).expect("create dir");

        let error = open_log_file(&dir, "occupied").expect_err("directory is not a file");
        assert!(matches!(error, TelemetryError::LogFile { ref path, .. } if path.ends_with("occupied")));
    }
}

//! Shared configuration for the version-control bridge binaries.
//!
//! The host launches the bridge process with either a conventional argument
//! vector or a single string carrying every flag. Both forms resolve to the
//! same [`Config`] through `clap`, with environment variables filling any flag
//! the host leaves out.

mod defaults;
mod logging;

use std::ffi::OsString;

use camino::Utf8PathBuf;
use clap::Parser;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_RECONNECT_ATTEMPTS, PROGRAM_NAME, default_log_filter_string,
    default_log_format, default_reconnect_attempts,
};
pub use logging::LogFormat;

/// Runtime configuration for a bridge process.
#[derive(Debug, Clone, PartialEq, Eq, Parser, Serialize, Deserialize)]
#[command(
    name = "vcsbridge",
    about = "Out-of-process version control bridge speaking JSONL over stdio"
)]
pub struct Config {
    /// Root directory of the host project.
    #[arg(long, env = "VCSBRIDGE_PROJECT_PATH", value_name = "PATH")]
    #[serde(default)]
    pub project_path: Option<Utf8PathBuf>,
    /// Tracing filter expression (for example `info` or `vcsbridged=debug`).
    #[arg(long, env = "VCSBRIDGE_LOG_FILTER", default_value = DEFAULT_LOG_FILTER)]
    #[serde(default = "default_log_filter_string")]
    pub log_filter: String,
    /// Log output format.
    #[arg(
        long,
        env = "VCSBRIDGE_LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Json
    )]
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
    /// Directory receiving the backend log file instead of stderr.
    #[arg(long, env = "VCSBRIDGE_LOG_DIR", value_name = "DIR")]
    #[serde(default)]
    pub log_dir: Option<Utf8PathBuf>,
    /// Implicit reconnect attempts before a backend command fails fast.
    #[arg(
        long,
        env = "VCSBRIDGE_RECONNECT_ATTEMPTS",
        default_value_t = DEFAULT_RECONNECT_ATTEMPTS
    )]
    #[serde(default = "default_reconnect_attempts")]
    pub reconnect_attempts: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project_path: None,
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            log_dir: None,
            reconnect_attempts: default_reconnect_attempts(),
        }
    }
}

impl Config {
    /// Loads configuration from whichever argument form the host used.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the arguments cannot be tokenised or
    /// parsed.
    pub fn load(arguments: ProcessArguments) -> Result<Self, ConfigError> {
        match arguments {
            ProcessArguments::Vector(args) => Self::load_from_iter(args),
            ProcessArguments::Single(line) => Self::load_from_str(&line),
        }
    }

    /// Parses an argument vector whose first element is the program name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when `clap` rejects the arguments.
    pub fn load_from_iter<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::try_parse_from(args).map_err(|source| ConfigError::Parse {
            source: Box::new(source),
        })
    }

    /// Parses the single-string form (flags only, no program name).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnterminatedQuote`] for unbalanced quoting, or
    /// [`ConfigError::Parse`] when the resulting tokens are rejected.
    pub fn load_from_str(line: &str) -> Result<Self, ConfigError> {
        let mut args = vec![PROGRAM_NAME.to_owned()];
        args.extend(split_argument_string(line)?);
        Self::load_from_iter(args)
    }

    /// Returns the configured project path, if any.
    #[must_use]
    pub const fn project_path(&self) -> Option<&Utf8PathBuf> {
        self.project_path.as_ref()
    }

    /// Returns the tracing filter expression.
    #[must_use]
    pub const fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Returns the configured log format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Returns the directory receiving log files, if any.
    #[must_use]
    pub const fn log_dir(&self) -> Option<&Utf8PathBuf> {
        self.log_dir.as_ref()
    }

    /// Returns the number of implicit reconnect attempts.
    #[must_use]
    pub const fn reconnect_attempts(&self) -> u32 {
        self.reconnect_attempts
    }
}

/// The two argument shapes a host may use to launch the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessArguments {
    /// Conventional `argv`, program name first.
    Vector(Vec<OsString>),
    /// One string holding every flag.
    Single(String),
}

impl ProcessArguments {
    /// Classifies raw process arguments.
    ///
    /// A lone argument containing whitespace is treated as the single-string
    /// form; anything else is an argument vector.
    #[must_use]
    pub fn detect<I>(raw: I) -> Self
    where
        I: IntoIterator<Item = OsString>,
    {
        let args: Vec<OsString> = raw.into_iter().collect();
        if let [_, single] = args.as_slice() {
            let text = single.to_string_lossy();
            if text.contains(char::is_whitespace) {
                return Self::Single(text.into_owned());
            }
        }
        Self::Vector(args)
    }
}

/// Splits a single argument string into tokens.
///
/// Double and single quotes both group whitespace into one token and are
/// stripped. Inside one kind of quote the other kind is literal, so
/// `"it's"` yields `it's`. There are no escapes.
///
/// # Errors
///
/// Returns [`ConfigError::UnterminatedQuote`] when a quote is left open.
pub fn split_argument_string(line: &str) -> Result<Vec<String>, ConfigError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut open_quote: Option<char> = None;

    for ch in line.chars() {
        match (open_quote, ch) {
            (None, '"' | '\'') => {
                open_quote = Some(ch);
                in_token = true;
            }
            (Some(quote), c) if c == quote => open_quote = None,
            (None, c) if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            (_, c) => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if open_quote.is_some() {
        return Err(ConfigError::UnterminatedQuote {
            line: line.to_owned(),
        });
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

/// Errors raised while resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `clap` rejected the argument list.
    #[error("invalid arguments: {source}")]
    Parse {
        /// Underlying parser error.
        #[source]
        source: Box<clap::Error>,
    },
    /// The single-string form left a quote open.
    #[error("unterminated quote in argument string '{line}'")]
    UnterminatedQuote {
        /// The offending argument string.
        line: String,
    },
}

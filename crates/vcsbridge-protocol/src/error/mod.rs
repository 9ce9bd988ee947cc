//! Protocol and transport errors.
//!
//! [`ProtocolError`] covers requests the engine can answer (malformed lines,
//! unknown commands, bad arguments); they become error status items and the
//! command loop keeps going. [`TransportError`] covers the channel itself
//! failing, which ends the loop.

use thiserror::Error;

/// Recoverable failures decoding or validating one request.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The request line is not a valid request object.
    #[error("malformed request: {message}")]
    Malformed {
        /// Human-readable description of the parse failure.
        message: String,
        /// Underlying JSON error, when there is one.
        #[source]
        source: Option<serde_json::Error>,
    },

    /// The command name is not in the command table.
    #[error("unknown command '{command}'")]
    UnknownCommand {
        /// The name as received.
        command: String,
    },

    /// The command was recognised but its arguments are unusable.
    #[error("invalid arguments for '{command}': {message}")]
    InvalidArguments {
        /// Command name.
        command: String,
        /// What is wrong with the arguments.
        message: String,
    },

    /// A move request paired source and destination lists of unequal length.
    #[error("move requires one destination per source ({sources} sources, {targets} targets)")]
    MismatchedMove {
        /// Number of source assets.
        sources: usize,
        /// Number of destination assets.
        targets: usize,
    },

    /// A configuration key names no declared field.
    #[error("unknown configuration field '{name}'")]
    UnknownField {
        /// Field name as received.
        name: String,
    },
}

impl ProtocolError {
    /// Creates a malformed-request error from a serde error.
    #[must_use]
    pub fn from_json_error(source: serde_json::Error) -> Self {
        Self::Malformed {
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Creates a malformed-request error with a custom message.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an unknown-command error.
    #[must_use]
    pub fn unknown_command(command: impl Into<String>) -> Self {
        Self::UnknownCommand {
            command: command.into(),
        }
    }

    /// Creates an invalid-arguments error.
    #[must_use]
    pub fn invalid_arguments(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Creates an unknown-field error.
    #[must_use]
    pub fn unknown_field(name: impl Into<String>) -> Self {
        Self::UnknownField { name: name.into() }
    }
}

/// Unrecoverable failures of the host channel.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Reading from the host failed.
    #[error("failed to read from host: {source}")]
    Read {
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Writing to the host failed.
    #[error("failed to write to host: {source}")]
    Write {
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A response could not be serialised.
    #[error("failed to serialise message: {source}")]
    Serialize {
        /// Underlying serialisation error.
        #[source]
        source: serde_json::Error,
    },

    /// The host closed its end of the channel.
    #[error("host closed the connection")]
    Closed,
}

impl TransportError {
    /// Wraps a read failure.
    #[must_use]
    pub fn read(source: std::io::Error) -> Self {
        Self::Read { source }
    }

    /// Wraps a write failure.
    #[must_use]
    pub fn write(source: std::io::Error) -> Self {
        Self::Write { source }
    }

    /// Wraps a serialisation failure.
    #[must_use]
    pub fn serialize(source: serde_json::Error) -> Self {
        Self::Serialize { source }
    }
}

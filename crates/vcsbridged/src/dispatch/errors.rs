//! Errors that end the command loop.

use thiserror::Error;
use vcsbridge_protocol::TransportError;

/// The host and backend share no protocol version.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NegotiationError {
    /// The offered version sets are disjoint.
    #[error(
        "no common protocol version: host supports {host:?}, backend supports {backend:?}"
    )]
    Incompatible {
        /// Versions offered by the host, ascending.
        host: Vec<u32>,
        /// Versions supported by the backend, ascending.
        backend: Vec<u32>,
    },
}

/// Reasons the command loop stopped without an `exit` command.
#[derive(Debug, Error)]
pub enum RunError {
    /// Reading from or writing to the host failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// Version negotiation failed; the error was already reported to the host.
    #[error(transparent)]
    Negotiation(#[from] NegotiationError),
}

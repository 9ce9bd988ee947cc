//! Host connection.
//!
//! The engine talks to the host through the [`Connection`] trait. The
//! binaries use [`JsonlConnection`], which frames one JSON object per line
//! over any buffered reader and writer (stdin and stdout in production).

use std::io::{BufRead, Write};

use tracing::debug;

use crate::error::{ProtocolError, TransportError};
use crate::message::BridgeMessage;

const CONNECTION_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::connection");

/// One request frame read from the host.
#[derive(Debug)]
pub enum RequestLine {
    /// A line of text, still to be parsed as a request.
    Text(String),
    /// A frame that cannot be text; answered as a malformed request.
    Undecodable(ProtocolError),
}

/// Bidirectional, ordered message channel to the host.
pub trait Connection {
    /// Blocks until the next request line arrives.
    ///
    /// A line that is not valid UTF-8 is returned as
    /// [`RequestLine::Undecodable`] so the loop can answer it and continue.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Closed`] at end of stream and
    /// [`TransportError::Read`] when the channel fails.
    fn read_request(&mut self) -> Result<RequestLine, TransportError>;

    /// Sends one message.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when the message cannot be encoded or
    /// written.
    fn write_message(&mut self, message: &BridgeMessage) -> Result<(), TransportError>;

    /// Flushes buffered output.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Write`] when flushing fails.
    fn flush(&mut self) -> Result<(), TransportError>;
}

/// Line-delimited JSON connection.
pub struct JsonlConnection<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> JsonlConnection<R, W> {
    /// Wraps a reader and writer.
    #[must_use]
    pub const fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Returns the reader and writer.
    #[must_use]
    pub fn into_inner(self) -> (R, W) {
        (self.reader, self.writer)
    }
}

impl<R: BufRead, W: Write> Connection for JsonlConnection<R, W> {
    fn read_request(&mut self) -> Result<RequestLine, TransportError> {
        let mut bytes = Vec::new();
        let read = self
            .reader
            .read_until(b'\n', &mut bytes)
            .map_err(TransportError::read)?;
        if read == 0 {
            debug!(target: CONNECTION_TARGET, "host closed the request stream");
            return Err(TransportError::Closed);
        }
        debug!(target: CONNECTION_TARGET, bytes = read, "request line received");
        Ok(String::from_utf8(bytes).map_or_else(
            |error| {
                RequestLine::Undecodable(ProtocolError::malformed(format!(
                    "request line is not valid UTF-8: {}",
                    error.utf8_error()
                )))
            },
            RequestLine::Text,
        ))
    }

    fn write_message(&mut self, message: &BridgeMessage) -> Result<(), TransportError> {
        let payload = serde_json::to_string(message).map_err(TransportError::serialize)?;
        self.writer
            .write_all(payload.as_bytes())
            .map_err(TransportError::write)?;
        self.writer.write_all(b"\n").map_err(TransportError::write)?;
        debug!(target: CONNECTION_TARGET, bytes = payload.len(), "message sent");
        Ok(())
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        self.writer.flush().map_err(TransportError::write)
    }
}

#[cfg(test)]
mod tests;

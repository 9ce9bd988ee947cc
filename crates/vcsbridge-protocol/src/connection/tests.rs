//! Unit tests for the JSONL connection.

use std::io::{self, Cursor, Write};

use super::*;
use crate::error::ProtocolError;
use crate::message::{CommandResponse, ResponsePayload};
use crate::status::VcsStatus;

fn connection(input: &str) -> JsonlConnection<Cursor<Vec<u8>>, Vec<u8>> {
    JsonlConnection::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
}

fn text(connection: &mut impl Connection) -> String {
    match connection.read_request().expect("a request line") {
        RequestLine::Text(line) => line,
        RequestLine::Undecodable(error) => panic!("expected text, got {error}"),
    }
}

#[test]
fn reads_one_line_at_a_time() {
    let mut connection = connection("{\"command\":\"status\"}\n{\"command\":\"exit\"}\n");
    assert_eq!(text(&mut connection), "{\"command\":\"status\"}\n");
    assert_eq!(text(&mut connection), "{\"command\":\"exit\"}\n");
}

#[test]
fn invalid_utf8_line_is_undecodable_and_reading_continues() {
    let mut input = vec![0xff, b'\n'];
    input.extend_from_slice(b"{\"command\":\"exit\"}\n");
    let mut connection = JsonlConnection::new(Cursor::new(input), Vec::new());

    let first = connection.read_request().expect("first frame");
    let RequestLine::Undecodable(error) = first else {
        panic!("expected an undecodable frame, got {first:?}");
    };
    assert!(matches!(error, ProtocolError::Malformed { .. }));
    assert!(error.to_string().contains("not valid UTF-8"));

    assert_eq!(text(&mut connection), "{\"command\":\"exit\"}\n");
}

#[test]
fn end_of_stream_is_closed() {
    let mut connection = connection("");
    assert!(matches!(
        connection.read_request(),
        Err(TransportError::Closed)
    ));
}

#[test]
fn writes_newline_framed_messages() {
    let mut connection = connection("");
    connection
        .write_message(&BridgeMessage::Online)
        .expect("write online");
    connection
        .write_message(&BridgeMessage::from(CommandResponse::from_status(
            "login",
            &VcsStatus::new(),
            ResponsePayload::Empty,
        )))
        .expect("write response");
    connection.flush().expect("flush");

    let (_, output) = connection.into_inner();
    let text = String::from_utf8(output).expect("utf8");
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines.first().copied(), Some(r#"{"kind":"online"}"#));
    assert!(text.ends_with('\n'));
}

struct BrokenPipe;

impl Write for BrokenPipe {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))
    }
}

#[test]
fn write_failures_surface_as_transport_errors() {
    let mut connection = JsonlConnection::new(Cursor::new(Vec::new()), BrokenPipe);
    let error = connection
        .write_message(&BridgeMessage::Online)
        .expect_err("broken pipe");
    assert!(matches!(error, TransportError::Write { .. }));
    assert!(matches!(
        connection.flush(),
        Err(TransportError::Write { .. })
    ));
}

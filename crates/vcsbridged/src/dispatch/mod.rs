//! JSONL command dispatch.
//!
//! The engine reads one request per line from the host, routes it to a local
//! handler or to the backend, and answers with exactly one response. A
//! connectivity notification precedes the response when the command moved
//! the session online or offline:
//!
//! ```json
//! {"command":"checkout","assets":[{"path":"foo.txt","state":1}]}
//! ```
//!
//! ```json
//! {"kind":"online"}
//! {"kind":"response","command":"checkout","success":true,"status":[],"payload":{"type":"assets","assets":[{"path":"foo.txt","state":17}]}}
//! ```
//!
//! Malformed lines and unknown commands are answered with a failed response
//! and the loop continues. The loop ends with success on `exit`, and with
//! failure when the transport breaks or version negotiation finds no common
//! version.

mod engine;
mod envelope;
mod errors;
mod handlers;
mod negotiation;

pub use self::engine::{DispatchEngine, EngineSettings, Flow, Outcome};
pub use self::errors::{NegotiationError, RunError};
pub use self::negotiation::negotiate_version;

//! The dispatch engine and its command loop.

use tracing::{debug, info, warn};
use vcsbridge_config::{Config, DEFAULT_RECONNECT_ATTEMPTS};
use vcsbridge_protocol::{
    BridgeMessage, Command, CommandResponse, ConfigFields, Connection, HostRequest, ProtocolError,
    RequestLine, ResponsePayload, StatusItem,
};

use super::errors::{NegotiationError, RunError};
use crate::backend::VersionControlBackend;
use crate::session::Session;

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Tunables for a [`DispatchEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    /// Implicit reconnect attempts before a backend command fails fast.
    /// Zero disables implicit reconnection.
    pub reconnect_attempts: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            reconnect_attempts: DEFAULT_RECONNECT_ATTEMPTS,
        }
    }
}

impl From<&Config> for EngineSettings {
    fn from(config: &Config) -> Self {
        Self {
            reconnect_attempts: config.reconnect_attempts(),
        }
    }
}

/// What the loop does after a request has been answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    /// Read the next request.
    Continue,
    /// The host sent `exit`; stop with success.
    Exit,
    /// Negotiation failed; stop with failure.
    Abort(NegotiationError),
}

/// Messages produced for one request and the resulting loop control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Optional connectivity notification followed by the response.
    pub messages: Vec<BridgeMessage>,
    /// Loop control.
    pub flow: Flow,
}

impl Outcome {
    /// Returns the response closing the request.
    #[must_use]
    pub fn response(&self) -> Option<&CommandResponse> {
        self.messages.iter().find_map(BridgeMessage::as_response)
    }
}

/// Result of a command handler before post-command bookkeeping.
#[derive(Debug)]
pub(super) struct Reply {
    pub(super) payload: ResponsePayload,
    pub(super) flow: Flow,
}

impl Reply {
    pub(super) const fn new(payload: ResponsePayload) -> Self {
        Self {
            payload,
            flow: Flow::Continue,
        }
    }

    pub(super) const fn empty() -> Self {
        Self::new(ResponsePayload::Empty)
    }
}

/// Drives one backend through the host protocol.
///
/// The engine owns the [`Session`], so connectivity and the status aggregate
/// are never shared with anything but the backend calls it makes.
pub struct DispatchEngine<B> {
    pub(super) backend: B,
    pub(super) session: Session,
    pub(super) settings: EngineSettings,
}

impl<B: VersionControlBackend> DispatchEngine<B> {
    /// Builds an engine, declaring the backend's configuration fields.
    #[must_use]
    pub fn new(backend: B, settings: EngineSettings) -> Self {
        let fields = ConfigFields::new(backend.config_fields());
        debug!(
            target: DISPATCH_TARGET,
            backend = backend.name(),
            fields = fields.as_slice().len(),
            "engine created"
        );
        Self {
            backend,
            session: Session::new(fields),
            settings,
        }
    }

    /// Builds an engine from process configuration.
    #[must_use]
    pub fn from_config(backend: B, config: &Config) -> Self {
        let mut engine = Self::new(backend, EngineSettings::from(config));
        if let Some(path) = config.project_path() {
            engine.session.set_project_path(path.clone());
        }
        engine
    }

    /// Returns the session.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Returns the backend.
    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Returns the backend for direct manipulation.
    pub const fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Handles one request line and returns the messages to send.
    ///
    /// Undecodable lines and unknown commands produce a failed response and
    /// leave the loop running.
    pub fn process(&mut self, line: &str) -> Outcome {
        self.session.clear_status();

        let request = match HostRequest::parse(line) {
            Ok(request) => request,
            Err(error) => return self.reject("", &error),
        };
        let command = match Command::parse(&request.command) {
            Ok(command) => command,
            Err(error) => return self.reject(&request.command, &error),
        };

        debug!(target: DISPATCH_TARGET, %command, "dispatching command");
        let was_online = self.session.is_online();
        let reply = self.route(command, request);

        let mut messages = Vec::with_capacity(2);
        if let Some(notification) = self.connectivity_change(was_online) {
            messages.push(notification);
        }
        let response =
            CommandResponse::from_status(command.as_str(), self.session.status(), reply.payload);
        if !response.success {
            debug!(
                target: DISPATCH_TARGET,
                %command,
                errors = self.session.status().error_count(),
                "command failed"
            );
        }
        messages.push(response.into());
        Outcome {
            messages,
            flow: reply.flow,
        }
    }

    /// Runs the command loop until `exit`, a transport failure or a
    /// negotiation failure.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Transport`] when the connection fails or closes,
    /// and [`RunError::Negotiation`] after reporting a version mismatch.
    pub fn run<C: Connection>(&mut self, connection: &mut C) -> Result<(), RunError> {
        info!(target: DISPATCH_TARGET, backend = self.backend.name(), "command loop started");
        loop {
            let frame = connection.read_request().inspect_err(|error| {
                warn!(target: DISPATCH_TARGET, %error, "failed to read request");
            })?;
            let outcome = match frame {
                RequestLine::Text(line) => self.process(&line),
                RequestLine::Undecodable(error) => {
                    self.session.clear_status();
                    self.reject("", &error)
                }
            };
            for message in &outcome.messages {
                connection.write_message(message)?;
            }
            connection.flush()?;

            match outcome.flow {
                Flow::Continue => {}
                Flow::Exit => {
                    info!(target: DISPATCH_TARGET, "command loop finished");
                    return Ok(());
                }
                Flow::Abort(error) => {
                    warn!(target: DISPATCH_TARGET, %error, "version negotiation failed");
                    return Err(error.into());
                }
            }
        }
    }

    fn reject(&mut self, command: &str, error: &ProtocolError) -> Outcome {
        warn!(target: DISPATCH_TARGET, command, %error, "rejected request");
        self.session.add_status(StatusItem::error(error.to_string()));
        let response =
            CommandResponse::from_status(command, self.session.status(), ResponsePayload::Empty);
        Outcome {
            messages: vec![response.into()],
            flow: Flow::Continue,
        }
    }

    fn connectivity_change(&self, was_online: bool) -> Option<BridgeMessage> {
        match (was_online, self.session.is_online()) {
            (false, true) => Some(BridgeMessage::Online),
            (true, false) => Some(BridgeMessage::offline(
                self.session.offline_reason().unwrap_or("connection lost"),
            )),
            _ => None,
        }
    }
}

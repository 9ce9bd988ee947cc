//! Command handlers.
//!
//! Local commands (`config`, `query-config`, `set-config`) never touch the
//! backend. Everything else goes through the envelope in
//! [`super::envelope`].

use std::collections::BTreeSet;

use camino::Utf8PathBuf;
use tracing::{debug, info};
use vcsbridge_protocol::{
    Capabilities, Changelist, ChangelistRevision, ChangelistRevisions, Changes, Command,
    EngineCommand, HostRequest, ProtocolError, ResponsePayload, StatusItem, VcsCommand,
    VersionedAssetList,
};

use super::engine::{DISPATCH_TARGET, DispatchEngine, Flow, Reply};
use super::negotiation::negotiate_version;
use crate::backend::{BackendResult, VersionControlBackend};
use crate::session::Session;

const KEY_VERSIONS: &str = "versions";
const KEY_TRAITS: &str = "traits";
const KEY_PROJECT_PATH: &str = "project-path";
const RECURSIVE_FLAG: &str = "recursive";

impl<B: VersionControlBackend> DispatchEngine<B> {
    pub(super) fn route(&mut self, command: Command, request: HostRequest) -> Reply {
        match command {
            Command::Vcs(vcs) => self.route_vcs(vcs, request),
            Command::Engine(EngineCommand::Login) => self.handle_login(),
            Command::Engine(EngineCommand::Exit) => self.handle_exit(),
            Command::Engine(EngineCommand::Config) => self.handle_config(&request.arguments),
            Command::Engine(EngineCommand::QueryConfig) => {
                Reply::new(ResponsePayload::ConfigFields {
                    fields: self.session.fields().clone(),
                })
            }
            Command::Engine(EngineCommand::SetConfig) => {
                self.handle_set_config(&request.arguments)
            }
            Command::Engine(EngineCommand::Custom) => self.handle_custom(&request.arguments),
        }
    }

    fn route_vcs(&mut self, command: VcsCommand, request: HostRequest) -> Reply {
        let revision = request.revision_or_default();
        let HostRequest {
            arguments,
            assets,
            targets,
            revisions,
            changelist,
            description,
            target_dir,
            ..
        } = request;

        match command {
            VcsCommand::Add => self.batch(command, assets, B::add),
            VcsCommand::Checkout => self.batch(command, assets, B::checkout),
            VcsCommand::GetLatest => self.batch(command, assets, B::get_latest),
            VcsCommand::Revert => self.batch(command, assets, B::revert),
            VcsCommand::Resolve => self.batch(command, assets, B::resolve),
            VcsCommand::Delete => self.batch(command, assets, B::remove),
            VcsCommand::Lock => self.batch(command, assets, B::lock),
            VcsCommand::Unlock => self.batch(command, assets, B::unlock),
            VcsCommand::Status => {
                let recursive = arguments
                    .iter()
                    .any(|argument| argument.eq_ignore_ascii_case(RECURSIVE_FLAG));
                self.batch(command, assets, |backend, session, batch| {
                    backend.status(session, batch, recursive)
                })
            }
            VcsCommand::Move => self.handle_move(&assets, targets),
            VcsCommand::Download => self.handle_download(target_dir, &revisions, assets),
            VcsCommand::ChangeMove => self.batch(command, assets, |backend, session, batch| {
                backend.change_or_move(session, &revision, batch)
            }),
            VcsCommand::Submit => {
                let submitted = changelist.unwrap_or_else(|| {
                    Changelist::new(revision.clone(), description.unwrap_or_default())
                });
                self.batch(command, assets, |backend, session, batch| {
                    backend.submit(session, &submitted, batch)
                })
            }
            VcsCommand::ChangeStatus => {
                self.filled(command, assets, |backend, session, batch| {
                    backend.change_status(session, &revision, batch)
                })
            }
            VcsCommand::IncomingChangeAssets => {
                self.filled(command, assets, |backend, session, batch| {
                    backend.incoming_change_status(session, &revision, batch)
                })
            }
            VcsCommand::RevertChanges => self.batch(command, assets, |backend, session, batch| {
                backend.revert_changes(session, &revision, batch)
            }),
            VcsCommand::Changes => self.changes(command, B::changes),
            VcsCommand::Incoming => self.changes(command, B::incoming_changes),
            VcsCommand::ChangeDescription => {
                let text = description.unwrap_or_default();
                let stored = self.run_query(Command::Vcs(command), |backend, session| {
                    backend.update_revision(session, &revision, &text)
                });
                stored.map_or_else(Reply::empty, |updated| {
                    Reply::new(ResponsePayload::Description {
                        description: updated,
                    })
                })
            }
            VcsCommand::DeleteChanges => self.handle_delete_changes(&revisions),
        }
    }

    fn batch<F>(
        &mut self,
        command: VcsCommand,
        mut assets: VersionedAssetList,
        operation: F,
    ) -> Reply
    where
        F: FnOnce(&mut B, &mut Session, &mut VersionedAssetList) -> BackendResult<()>,
    {
        self.run_batch(Command::Vcs(command), &mut assets, operation);
        Reply::new(ResponsePayload::Assets { assets })
    }

    /// Queries that fill `assets` with backend results instead of annotating
    /// a fixed list.
    fn filled<F>(
        &mut self,
        command: VcsCommand,
        mut assets: VersionedAssetList,
        operation: F,
    ) -> Reply
    where
        F: FnOnce(&mut B, &mut Session, &mut VersionedAssetList) -> BackendResult<()>,
    {
        self.run_query(Command::Vcs(command), |backend, session| {
            operation(backend, session, &mut assets)
        });
        Reply::new(ResponsePayload::Assets { assets })
    }

    fn changes<F>(&mut self, command: VcsCommand, operation: F) -> Reply
    where
        F: FnOnce(&mut B, &mut Session) -> BackendResult<Changes>,
    {
        let changes = self
            .run_query(Command::Vcs(command), operation)
            .unwrap_or_default();
        Reply::new(ResponsePayload::Changes { changes })
    }

    fn handle_move(&mut self, from: &VersionedAssetList, mut to: VersionedAssetList) -> Reply {
        let command = Command::Vcs(VcsCommand::Move);
        if from.len() == to.len() {
            self.run_batch(command, &mut to, |backend, session, targets| {
                backend.move_assets(session, from, targets)
            });
        } else {
            let error = ProtocolError::MismatchedMove {
                sources: from.len(),
                targets: to.len(),
            };
            self.fail_fast(command, &error, &mut to);
        }
        Reply::new(ResponsePayload::Assets { assets: to })
    }

    fn handle_download(
        &mut self,
        target_dir: Option<String>,
        revisions: &ChangelistRevisions,
        mut assets: VersionedAssetList,
    ) -> Reply {
        let command = Command::Vcs(VcsCommand::Download);
        match target_dir.filter(|dir| !dir.trim().is_empty()) {
            Some(directory) => {
                self.run_batch(command, &mut assets, |backend, session, batch| {
                    backend.download(session, &directory, revisions, batch)
                });
            }
            None => {
                let error =
                    ProtocolError::invalid_arguments(command.as_str(), "missing target_dir");
                self.fail_fast(command, &error, &mut assets);
            }
        }
        Reply::new(ResponsePayload::Assets { assets })
    }

    fn handle_delete_changes(&mut self, revisions: &[ChangelistRevision]) -> Reply {
        let command = Command::Vcs(VcsCommand::DeleteChanges);
        self.run_query(command, |backend, session| {
            for revision in revisions {
                match backend.delete_revision(session, revision) {
                    Ok(()) => {}
                    Err(error) if error.is_connection_lost() => return Err(error),
                    Err(error) => {
                        session.add_status(StatusItem::error(format!(
                            "{command}: changelist {revision}: {error}"
                        )));
                    }
                }
            }
            Ok(())
        });
        Reply::empty()
    }

    fn handle_login(&mut self) -> Reply {
        match self.handshake() {
            Ok(()) => info!(target: DISPATCH_TARGET, "login succeeded"),
            Err(error) => {
                self.session.notify_offline(error.to_string());
                self.session
                    .add_status(StatusItem::error(format!("login failed: {error}")));
            }
        }
        Reply::empty()
    }

    fn handle_exit(&mut self) -> Reply {
        if self.backend.is_connected() {
            self.backend.disconnect(&mut self.session);
        }
        info!(target: DISPATCH_TARGET, "exit requested");
        Reply {
            payload: ResponsePayload::Empty,
            flow: Flow::Exit,
        }
    }

    fn handle_config(&mut self, arguments: &[String]) -> Reply {
        let Some((key, values)) = arguments.split_first() else {
            return self.protocol_error(&ProtocolError::invalid_arguments(
                EngineCommand::Config.as_str(),
                "missing configuration key",
            ));
        };

        match key.as_str() {
            KEY_VERSIONS => self.handle_versions(values),
            KEY_TRAITS => Reply::new(ResponsePayload::Capabilities {
                capabilities: self.capabilities(),
            }),
            KEY_PROJECT_PATH => {
                if values.is_empty() {
                    return self.protocol_error(&ProtocolError::invalid_arguments(
                        EngineCommand::Config.as_str(),
                        "project-path requires a value",
                    ));
                }
                let path = Utf8PathBuf::from(values.join(" "));
                info!(target: DISPATCH_TARGET, %path, "project path set");
                self.session.set_project_path(path);
                Reply::empty()
            }
            field => {
                self.set_field(field, &values.join(" "));
                Reply::empty()
            }
        }
    }

    fn handle_versions(&mut self, values: &[String]) -> Reply {
        let mut host = BTreeSet::new();
        for value in values {
            match value.trim().parse::<u32>() {
                Ok(version) => {
                    host.insert(version);
                }
                Err(error) => {
                    return self.protocol_error(&ProtocolError::invalid_arguments(
                        EngineCommand::Config.as_str(),
                        format!("invalid protocol version '{value}': {error}"),
                    ));
                }
            }
        }

        match negotiate_version(&host, &self.backend.supported_versions()) {
            Ok(version) => {
                info!(target: DISPATCH_TARGET, version, "protocol version negotiated");
                self.session.set_protocol_version(version);
                Reply::new(ResponsePayload::Version { version })
            }
            Err(error) => {
                self.session.add_status(StatusItem::error(error.to_string()));
                Reply {
                    payload: ResponsePayload::Empty,
                    flow: Flow::Abort(error),
                }
            }
        }
    }

    fn handle_set_config(&mut self, arguments: &[String]) -> Reply {
        let pairs = arguments.chunks_exact(2);
        if !pairs.remainder().is_empty() {
            return self.protocol_error(&ProtocolError::invalid_arguments(
                EngineCommand::SetConfig.as_str(),
                "expected name/value pairs",
            ));
        }
        for pair in pairs {
            if let [name, value] = pair {
                self.set_field(name, value);
            }
        }
        Reply::empty()
    }

    fn handle_custom(&mut self, arguments: &[String]) -> Reply {
        let Some((name, rest)) = arguments.split_first() else {
            return self.protocol_error(&ProtocolError::invalid_arguments(
                EngineCommand::Custom.as_str(),
                "missing custom command name",
            ));
        };
        let output = self.run_query(Command::Engine(EngineCommand::Custom), |backend, session| {
            backend.custom_command(session, name, rest)
        });
        output.map_or_else(Reply::empty, |output| {
            Reply::new(ResponsePayload::Custom { output })
        })
    }

    fn set_field(&mut self, name: &str, value: &str) {
        match self.session.fields_mut().set(name, value) {
            Ok(field) => debug!(
                target: DISPATCH_TARGET,
                field = field.name(),
                value = field.display_value(),
                "configuration field set"
            ),
            Err(error) => {
                self.session.add_status(StatusItem::warning(error.to_string()));
            }
        }
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            fields: self.session.fields().as_slice().to_vec(),
            supported_commands: self.backend.supported_commands(),
            online_commands: self.backend.online_commands(),
            traits: self.backend.traits(),
            overlays: self.backend.overlays(),
        }
    }

    fn protocol_error(&mut self, error: &ProtocolError) -> Reply {
        self.session.add_status(StatusItem::error(error.to_string()));
        Reply::empty()
    }
}

//! Command envelope around backend calls.
//!
//! Every backend-facing command first makes sure the session is online,
//! reconnecting up to the configured number of attempts. Batch operations
//! then run with their assets marked pending, and any asset the backend
//! leaves pending is failed with its own status item. Connection loss
//! reported by any call moves the session offline exactly once.

use tracing::{debug, warn};
use vcsbridge_protocol::{Command, StatusItem, VersionedAssetList};

use super::engine::{DISPATCH_TARGET, DispatchEngine};
use crate::backend::{BackendError, BackendResult, VersionControlBackend};
use crate::session::Session;

impl<B: VersionControlBackend> DispatchEngine<B> {
    /// Connects and authenticates, skipping `connect` when the session is
    /// online and the backend reports an open connection.
    pub(super) fn handshake(&mut self) -> BackendResult<()> {
        let missing: Vec<&str> = self
            .session
            .fields()
            .missing_required()
            .into_iter()
            .map(|field| field.name())
            .collect();
        if !missing.is_empty() {
            return Err(BackendError::failed(format!(
                "missing required configuration: {}",
                missing.join(", ")
            )));
        }

        if !(self.session.is_online() && self.backend.is_connected()) {
            self.backend.connect(&mut self.session)?;
        }
        self.backend.login(&mut self.session)?;
        self.session.notify_online();
        Ok(())
    }

    /// Brings an offline session online, trying at most the configured
    /// number of times.
    pub(super) fn ensure_online(&mut self) -> BackendResult<()> {
        if self.session.is_online() {
            return Ok(());
        }

        let mut last_error = BackendError::connection_lost(
            self.session
                .offline_reason()
                .unwrap_or("backend is offline")
                .to_owned(),
        );
        for attempt in 1..=self.settings.reconnect_attempts {
            debug!(target: DISPATCH_TARGET, attempt, "attempting implicit reconnect");
            match self.handshake() {
                Ok(()) => return Ok(()),
                Err(error) => {
                    warn!(target: DISPATCH_TARGET, attempt, %error, "reconnect failed");
                    last_error = error;
                }
            }
        }
        Err(last_error)
    }

    /// Runs a batch operation over `assets` inside the envelope.
    pub(super) fn run_batch<F>(
        &mut self,
        command: Command,
        assets: &mut VersionedAssetList,
        operation: F,
    ) where
        F: FnOnce(&mut B, &mut Session, &mut VersionedAssetList) -> BackendResult<()>,
    {
        if let Err(error) = self.ensure_online() {
            self.fail_fast(command, &error, assets);
            return;
        }

        for asset in assets.iter_mut() {
            asset.mark_pending();
        }
        let expected = assets.len();

        if let Err(error) = operation(&mut self.backend, &mut self.session, assets) {
            self.record_backend_error(command, &error);
        }

        if assets.len() != expected {
            self.session.add_status(StatusItem::error(format!(
                "{command}: backend returned {} assets for {expected} requested",
                assets.len()
            )));
        }
        for asset in assets.iter_mut().filter(|asset| asset.is_pending()) {
            asset.mark_failed();
            self.session.add_status(StatusItem::error(format!(
                "{command}: no result for '{}'",
                asset.path()
            )));
        }
    }

    /// Runs a query inside the envelope. Returns `None` when it failed; the
    /// failure is already recorded in the status aggregate.
    pub(super) fn run_query<T, F>(&mut self, command: Command, operation: F) -> Option<T>
    where
        F: FnOnce(&mut B, &mut Session) -> BackendResult<T>,
    {
        if let Err(error) = self.ensure_online() {
            self.session.add_status(StatusItem::error(format!(
                "{command}: not run: {error}"
            )));
            return None;
        }

        match operation(&mut self.backend, &mut self.session) {
            Ok(value) => Some(value),
            Err(error) => {
                self.record_backend_error(command, &error);
                None
            }
        }
    }

    /// Fails every asset of a command that never reached the backend.
    pub(super) fn fail_fast(
        &mut self,
        command: Command,
        error: &dyn std::fmt::Display,
        assets: &mut VersionedAssetList,
    ) {
        self.session
            .add_status(StatusItem::error(format!("{command}: not run: {error}")));
        for asset in assets.iter_mut() {
            asset.mark_failed();
        }
    }

    fn record_backend_error(&mut self, command: Command, error: &BackendError) {
        warn!(target: DISPATCH_TARGET, %command, %error, "backend call failed");
        if let BackendError::ConnectionLost { reason } = error {
            self.session.notify_offline(reason.clone());
        }
        self.session
            .add_status(StatusItem::error(format!("{command}: {error}")));
    }
}

#[cfg(test)]
mod tests;

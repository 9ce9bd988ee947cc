//! Backend operations interface.
//!
//! A concrete version-control integration implements [`VersionControlBackend`]
//! and is driven by exactly one [`crate::DispatchEngine`] per process. Batch
//! operations annotate the assets they are handed; the engine takes care of
//! the pending markers, list-length checks and status aggregation around each
//! call.

use std::collections::BTreeSet;

use thiserror::Error;
use vcsbridge_protocol::{
    Changelist, ChangelistRevision, ChangelistRevisions, Changes, CommandFlags, ConfigField,
    Overlays, TraitFlags, VersionedAssetList,
};

use crate::session::Session;

/// Result type returned by backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Failures a backend reports to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The backend can no longer reach its server.
    #[error("connection to backend lost: {reason}")]
    ConnectionLost {
        /// Human-readable cause, forwarded to the host.
        reason: String,
    },
    /// The operation failed for a reason other than connectivity.
    #[error("{message}")]
    Failed {
        /// Human-readable cause.
        message: String,
    },
    /// The backend does not implement the operation.
    #[error("operation '{operation}' is not supported by this backend")]
    Unsupported {
        /// Operation name.
        operation: String,
    },
}

impl BackendError {
    /// Creates a connection-lost error.
    #[must_use]
    pub fn connection_lost(reason: impl Into<String>) -> Self {
        Self::ConnectionLost {
            reason: reason.into(),
        }
    }

    /// Creates a generic failure.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }

    /// Creates an unsupported-operation error.
    #[must_use]
    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::Unsupported {
            operation: operation.into(),
        }
    }

    /// Returns `true` for connectivity failures.
    #[must_use]
    pub const fn is_connection_lost(&self) -> bool {
        matches!(self, Self::ConnectionLost { .. })
    }
}

/// Operations a version-control integration provides.
///
/// Every operation receives the engine-owned [`Session`] so it can append
/// status items, read configuration values and consult the project path.
/// Per-asset outcomes go on each asset's state; an `Err` describes a failure
/// of the call as a whole.
pub trait VersionControlBackend {
    /// Short backend identifier.
    fn name(&self) -> &'static str;

    /// Name of the log file written when a log directory is configured.
    fn log_file_name(&self) -> String {
        format!("{}.log", self.name())
    }

    /// Protocol versions the backend speaks.
    fn supported_versions(&self) -> BTreeSet<u32>;

    /// Optional behaviours the backend supports.
    fn traits(&self) -> TraitFlags;

    /// Configuration fields, declared once when the engine is built.
    fn config_fields(&self) -> Vec<ConfigField>;

    /// Commands the backend implements.
    fn supported_commands(&self) -> CommandFlags {
        CommandFlags::all()
    }

    /// Commands the host should enable while the session is online.
    fn online_commands(&self) -> CommandFlags;

    /// Overlay icons keyed by asset state; empty keeps the host defaults.
    fn overlays(&self) -> Overlays {
        Overlays::new()
    }

    /// Opens the connection to the server.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::ConnectionLost`] when the server is unreachable.
    fn connect(&mut self, session: &mut Session) -> BackendResult<()>;

    /// Closes the connection. Called once when the host sends `exit`.
    fn disconnect(&mut self, session: &mut Session);

    /// Reports whether the connection is currently open.
    fn is_connected(&self) -> bool {
        true
    }

    /// Authenticates after [`connect`](Self::connect).
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] when the credentials are rejected.
    fn login(&mut self, session: &mut Session) -> BackendResult<()> {
        let _ = session;
        Ok(())
    }

    /// Marks assets for addition.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] when the call fails as a whole.
    fn add(&mut self, session: &mut Session, assets: &mut VersionedAssetList)
    -> BackendResult<()>;

    /// Checks assets out for editing.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] when the call fails as a whole.
    fn checkout(
        &mut self,
        session: &mut Session,
        assets: &mut VersionedAssetList,
    ) -> BackendResult<()>;

    /// Fetches the given revisions of assets into `target_dir`.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] when the call fails as a whole.
    fn download(
        &mut self,
        session: &mut Session,
        target_dir: &str,
        revisions: &ChangelistRevisions,
        assets: &mut VersionedAssetList,
    ) -> BackendResult<()>;

    /// Updates assets to the latest revision.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] when the call fails as a whole.
    fn get_latest(
        &mut self,
        session: &mut Session,
        assets: &mut VersionedAssetList,
    ) -> BackendResult<()>;

    /// Discards local modifications.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] when the call fails as a whole.
    fn revert(
        &mut self,
        session: &mut Session,
        assets: &mut VersionedAssetList,
    ) -> BackendResult<()>;

    /// Resolves conflicts.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] when the call fails as a whole.
    fn resolve(
        &mut self,
        session: &mut Session,
        assets: &mut VersionedAssetList,
    ) -> BackendResult<()>;

    /// Marks assets for deletion.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] when the call fails as a whole.
    fn remove(
        &mut self,
        session: &mut Session,
        assets: &mut VersionedAssetList,
    ) -> BackendResult<()>;

    /// Moves `from[i]` to `to[i]`; results are reported on `to`.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] when the call fails as a whole.
    fn move_assets(
        &mut self,
        session: &mut Session,
        from: &VersionedAssetList,
        to: &mut VersionedAssetList,
    ) -> BackendResult<()>;

    /// Locks assets.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] when the call fails as a whole.
    fn lock(&mut self, session: &mut Session, assets: &mut VersionedAssetList)
    -> BackendResult<()>;

    /// Releases locks.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] when the call fails as a whole.
    fn unlock(
        &mut self,
        session: &mut Session,
        assets: &mut VersionedAssetList,
    ) -> BackendResult<()>;

    /// Moves assets into the pending changelist `revision`.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] when the call fails as a whole.
    fn change_or_move(
        &mut self,
        session: &mut Session,
        revision: &ChangelistRevision,
        assets: &mut VersionedAssetList,
    ) -> BackendResult<()>;

    /// Submits assets under `changelist`.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] when the call fails as a whole.
    fn submit(
        &mut self,
        session: &mut Session,
        changelist: &Changelist,
        assets: &mut VersionedAssetList,
    ) -> BackendResult<()>;

    /// Refreshes asset state, descending into folders when `recursive`.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] when the call fails as a whole.
    fn status(
        &mut self,
        session: &mut Session,
        assets: &mut VersionedAssetList,
        recursive: bool,
    ) -> BackendResult<()>;

    /// Fills `assets` with the contents of the pending changelist `revision`.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] when the query fails.
    fn change_status(
        &mut self,
        session: &mut Session,
        revision: &ChangelistRevision,
        assets: &mut VersionedAssetList,
    ) -> BackendResult<()>;

    /// Fills `assets` with the contents of the incoming changelist `revision`.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] when the query fails.
    fn incoming_change_status(
        &mut self,
        session: &mut Session,
        revision: &ChangelistRevision,
        assets: &mut VersionedAssetList,
    ) -> BackendResult<()>;

    /// Lists pending changelists.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] when the query fails.
    fn changes(&mut self, session: &mut Session) -> BackendResult<Changes>;

    /// Lists changelists submitted by others and not yet fetched.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] when the query fails.
    fn incoming_changes(&mut self, session: &mut Session) -> BackendResult<Changes>;

    /// Replaces the description of a pending changelist and returns the
    /// stored text.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] when the changelist cannot be updated.
    fn update_revision(
        &mut self,
        session: &mut Session,
        revision: &ChangelistRevision,
        description: &str,
    ) -> BackendResult<String>;

    /// Deletes an empty pending changelist.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] when the changelist cannot be deleted.
    fn delete_revision(
        &mut self,
        session: &mut Session,
        revision: &ChangelistRevision,
    ) -> BackendResult<()>;

    /// Reverts every asset of a pending changelist and annotates each of
    /// the host's `assets` with its state afterwards.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] when the call fails as a whole.
    fn revert_changes(
        &mut self,
        session: &mut Session,
        revision: &ChangelistRevision,
        assets: &mut VersionedAssetList,
    ) -> BackendResult<()>;

    /// Runs a backend-specific command and returns its output lines.
    ///
    /// # Errors
    ///
    /// The default implementation returns [`BackendError::Unsupported`].
    fn custom_command(
        &mut self,
        session: &mut Session,
        name: &str,
        arguments: &[String],
    ) -> BackendResult<Vec<String>> {
        let _ = (session, arguments);
        Err(BackendError::unsupported(name))
    }
}

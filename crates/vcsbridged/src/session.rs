//! Engine-owned session state.
//!
//! The session is the only mutable state shared between the engine and the
//! backend: the status aggregate of the running command, connectivity, the
//! project path, the declared configuration fields and the negotiated
//! protocol version. Connectivity changes only through
//! [`Session::notify_online`] and [`Session::notify_offline`].

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{info, warn};
use vcsbridge_protocol::{ConfigFields, StatusItem, VcsStatus};

const SESSION_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::session");

/// Whether the backend is currently reachable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Connectivity {
    /// No usable connection; backend commands reconnect first.
    #[default]
    Offline,
    /// Connected and authenticated.
    Online,
}

/// Mutable state of one bridge process.
#[derive(Debug, Default)]
pub struct Session {
    status: VcsStatus,
    connectivity: Connectivity,
    offline_reason: Option<String>,
    project_path: Option<Utf8PathBuf>,
    fields: ConfigFields,
    protocol_version: Option<u32>,
}

impl Session {
    /// Creates an offline session holding the declared fields.
    #[must_use]
    pub fn new(fields: ConfigFields) -> Self {
        Self {
            fields,
            ..Self::default()
        }
    }

    /// Returns the status aggregate of the running command.
    #[must_use]
    pub const fn status(&self) -> &VcsStatus {
        &self.status
    }

    /// Appends a status item and returns the aggregate for chaining.
    pub fn add_status(&mut self, item: StatusItem) -> &mut VcsStatus {
        self.status.add(item)
    }

    /// Empties the status aggregate.
    pub fn clear_status(&mut self) {
        self.status.clear();
    }

    /// Returns the current connectivity.
    #[must_use]
    pub const fn connectivity(&self) -> Connectivity {
        self.connectivity
    }

    /// Returns `true` while online.
    #[must_use]
    pub const fn is_online(&self) -> bool {
        matches!(self.connectivity, Connectivity::Online)
    }

    /// Returns why the session last went offline.
    #[must_use]
    pub fn offline_reason(&self) -> Option<&str> {
        self.offline_reason.as_deref()
    }

    /// Marks the session online. Returns `true` on an actual transition.
    pub fn notify_online(&mut self) -> bool {
        if self.is_online() {
            return false;
        }
        info!(target: SESSION_TARGET, "backend online");
        self.connectivity = Connectivity::Online;
        self.offline_reason = None;
        true
    }

    /// Marks the session offline and records `reason` as a warning item.
    ///
    /// Calling this while already offline changes nothing and adds no item.
    /// Returns `true` on an actual transition.
    pub fn notify_offline(&mut self, cause: impl Into<String>) -> bool {
        if !self.is_online() {
            return false;
        }
        let reason = cause.into();
        warn!(target: SESSION_TARGET, %reason, "backend offline");
        self.status.add(StatusItem::warning(format!("offline: {reason}")));
        self.connectivity = Connectivity::Offline;
        self.offline_reason = Some(reason);
        true
    }

    /// Returns the host project root, once known.
    #[must_use]
    pub fn project_path(&self) -> Option<&Utf8Path> {
        self.project_path.as_deref()
    }

    /// Records the host project root.
    pub fn set_project_path(&mut self, path: impl Into<Utf8PathBuf>) {
        self.project_path = Some(path.into());
    }

    /// Returns the declared configuration fields.
    #[must_use]
    pub const fn fields(&self) -> &ConfigFields {
        &self.fields
    }

    /// Returns the declared configuration fields for update.
    pub const fn fields_mut(&mut self) -> &mut ConfigFields {
        &mut self.fields
    }

    /// Returns the current value of a configuration field.
    #[must_use]
    pub fn config_value(&self, name: &str) -> Option<&str> {
        self.fields.value(name)
    }

    /// Returns the negotiated protocol version.
    #[must_use]
    pub const fn protocol_version(&self) -> Option<u32> {
        self.protocol_version
    }

    /// Records the negotiated protocol version.
    pub const fn set_protocol_version(&mut self, version: u32) {
        self.protocol_version = Some(version);
    }
}

//! Wire messages exchanged with the host.
//!
//! The host sends one [`HostRequest`] per line. The bridge answers with zero
//! or one connectivity notification followed by exactly one
//! [`BridgeMessage::Response`]. Both directions are single-line JSON objects.

use serde::{Deserialize, Serialize};

use crate::asset::VersionedAssetList;
use crate::capability::Capabilities;
use crate::changes::{Changelist, ChangelistRevision, ChangelistRevisions, Changes};
use crate::config_field::ConfigFields;
use crate::error::ProtocolError;
use crate::status::{StatusItem, VcsStatus};

/// One command sent by the host.
///
/// Only `command` is mandatory; every other field defaults to empty so each
/// command reads just the parts it needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRequest {
    /// Command name, kebab-case.
    pub command: String,
    /// Positional string arguments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<String>,
    /// Assets the command operates on.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assets: VersionedAssetList,
    /// Move destinations, paired by index with `assets`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: VersionedAssetList,
    /// Changelist the command addresses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<ChangelistRevision>,
    /// Several changelists or historical revisions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub revisions: ChangelistRevisions,
    /// Changelist to submit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changelist: Option<Changelist>,
    /// New changelist description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Destination directory for downloads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_dir: Option<String>,
}

impl HostRequest {
    /// Creates a request carrying only a command name.
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Self::default()
        }
    }

    /// Parses one request line.
    ///
    /// Surrounding whitespace, including the line terminator, is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Malformed`] when the line is blank, is not
    /// JSON, or does not match the request schema.
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Err(ProtocolError::malformed("empty request line"));
        }
        serde_json::from_str(trimmed).map_err(ProtocolError::from_json_error)
    }

    /// Sets the positional arguments.
    #[must_use]
    pub fn with_arguments<I, S>(mut self, arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.arguments = arguments.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the asset list.
    #[must_use]
    pub fn with_assets(mut self, assets: VersionedAssetList) -> Self {
        self.assets = assets;
        self
    }

    /// Sets the move destinations.
    #[must_use]
    pub fn with_targets(mut self, targets: VersionedAssetList) -> Self {
        self.targets = targets;
        self
    }

    /// Sets the addressed changelist.
    #[must_use]
    pub fn with_revision(mut self, revision: ChangelistRevision) -> Self {
        self.revision = Some(revision);
        self
    }

    /// Sets the revision list.
    #[must_use]
    pub fn with_revisions(mut self, revisions: ChangelistRevisions) -> Self {
        self.revisions = revisions;
        self
    }

    /// Sets the changelist to submit.
    #[must_use]
    pub fn with_changelist(mut self, changelist: Changelist) -> Self {
        self.changelist = Some(changelist);
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the download directory.
    #[must_use]
    pub fn with_target_dir(mut self, target_dir: impl Into<String>) -> Self {
        self.target_dir = Some(target_dir.into());
        self
    }

    /// Returns the addressed changelist, falling back to the default one.
    #[must_use]
    pub fn revision_or_default(&self) -> ChangelistRevision {
        self.revision
            .clone()
            .unwrap_or_else(ChangelistRevision::default_changelist)
    }

    /// Serialises the request as one line without the terminator.
    ///
    /// # Errors
    ///
    /// Returns the serde error if serialisation fails.
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Result data attached to a response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponsePayload {
    /// No data.
    #[default]
    Empty,
    /// Annotated assets.
    Assets {
        /// Assets in request order.
        assets: VersionedAssetList,
    },
    /// Changelists.
    Changes {
        /// Changelists in backend order.
        changes: Changes,
    },
    /// The stored description of a changelist.
    Description {
        /// Description text.
        description: String,
    },
    /// Declared configuration fields.
    ConfigFields {
        /// Fields in declaration order.
        fields: ConfigFields,
    },
    /// Backend capability advertisement.
    Capabilities {
        /// Capabilities bundle.
        capabilities: Capabilities,
    },
    /// Negotiated protocol version.
    Version {
        /// Selected version.
        version: u32,
    },
    /// Output lines of a backend-specific command.
    Custom {
        /// Output lines.
        output: Vec<String>,
    },
}

/// The single response closing each request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResponse {
    /// Name of the command answered.
    pub command: String,
    /// `true` when no error item was recorded.
    pub success: bool,
    /// Status items in the order they were added.
    #[serde(default)]
    pub status: Vec<StatusItem>,
    /// Result data.
    #[serde(default)]
    pub payload: ResponsePayload,
}

impl CommandResponse {
    /// Builds a response from a finished status aggregate.
    ///
    /// Success is derived from the aggregate: any error item fails the
    /// command.
    #[must_use]
    pub fn from_status(
        command: impl Into<String>,
        status: &VcsStatus,
        payload: ResponsePayload,
    ) -> Self {
        Self {
            command: command.into(),
            success: !status.has_errors(),
            status: status.items().to_vec(),
            payload,
        }
    }
}

/// Messages sent from the bridge to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BridgeMessage {
    /// The session went online.
    Online,
    /// The session went offline.
    Offline {
        /// Why connectivity was lost.
        reason: String,
    },
    /// Command result.
    Response(CommandResponse),
}

impl BridgeMessage {
    /// Creates an offline notification.
    #[must_use]
    pub fn offline(reason: impl Into<String>) -> Self {
        Self::Offline {
            reason: reason.into(),
        }
    }

    /// Returns the response, if this message is one.
    #[must_use]
    pub const fn as_response(&self) -> Option<&CommandResponse> {
        match self {
            Self::Response(response) => Some(response),
            Self::Online | Self::Offline { .. } => None,
        }
    }
}

impl From<CommandResponse> for BridgeMessage {
    fn from(response: CommandResponse) -> Self {
        Self::Response(response)
    }
}

#[cfg(test)]
mod tests;

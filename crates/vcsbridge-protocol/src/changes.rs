//! Changelist and revision model.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of the default pending changelist.
pub const DEFAULT_CHANGELIST: &str = "default";

/// Immutable identifier of a changelist or historical revision.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangelistRevision(String);

impl ChangelistRevision {
    /// Wraps a revision identifier.
    #[must_use]
    pub fn new(revision: impl Into<String>) -> Self {
        Self(revision.into())
    }

    /// Returns the identifier of the default pending changelist.
    #[must_use]
    pub fn default_changelist() -> Self {
        Self(DEFAULT_CHANGELIST.to_owned())
    }

    /// Returns `true` for the default pending changelist.
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.0 == DEFAULT_CHANGELIST
    }

    /// Returns the identifier text.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ChangelistRevision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A pending or submitted group of changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Changelist {
    revision: ChangelistRevision,
    #[serde(default)]
    description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    committer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
}

impl Changelist {
    /// Creates a changelist with a description.
    #[must_use]
    pub fn new(revision: ChangelistRevision, description: impl Into<String>) -> Self {
        Self {
            revision,
            description: description.into(),
            committer: None,
            timestamp: None,
        }
    }

    /// Attaches the committer name.
    #[must_use]
    pub fn with_committer(mut self, committer: impl Into<String>) -> Self {
        self.committer = Some(committer.into());
        self
    }

    /// Attaches a submission timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Returns the revision identifier.
    #[must_use]
    pub const fn revision(&self) -> &ChangelistRevision {
        &self.revision
    }

    /// Returns the description.
    #[must_use]
    pub const fn description(&self) -> &str {
        self.description.as_str()
    }

    /// Replaces the description.
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    /// Returns the committer, when known.
    #[must_use]
    pub fn committer(&self) -> Option<&str> {
        self.committer.as_deref()
    }

    /// Returns the submission timestamp, when known.
    #[must_use]
    pub fn timestamp(&self) -> Option<&str> {
        self.timestamp.as_deref()
    }
}

/// Ordered changelists returned by a change query.
pub type Changes = Vec<Changelist>;

/// Ordered revision identifiers.
pub type ChangelistRevisions = Vec<ChangelistRevision>;

//! Command table.
//!
//! [`VcsCommand`] lists the backend-facing commands in their fixed bit order;
//! a [`CommandFlags`] set is what backends advertise. [`EngineCommand`] lists
//! the engine-internal commands that never appear in the bitmask, and
//! [`Command`] is either of the two.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::error::ProtocolError;
use crate::flags::{FlagSet, impl_flag};

/// Commands routed to the backend, in advertised bit order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum VcsCommand {
    /// Mark assets for addition.
    Add = 0,
    /// Edit a pending changelist's description.
    ChangeDescription = 1,
    /// Move assets into another changelist.
    ChangeMove = 2,
    /// List pending changelists.
    Changes = 3,
    /// Query the assets of one changelist.
    ChangeStatus = 4,
    /// Check assets out for editing.
    Checkout = 5,
    /// Delete pending changelists.
    DeleteChanges = 6,
    /// Mark assets for deletion.
    Delete = 7,
    /// Fetch specific revisions of assets into a directory.
    Download = 8,
    /// Update assets to the latest revision.
    GetLatest = 9,
    /// Query the assets of one incoming changelist.
    IncomingChangeAssets = 10,
    /// List incoming changelists.
    Incoming = 11,
    /// Lock assets.
    Lock = 12,
    /// Move or rename assets.
    Move = 13,
    /// Resolve conflicts.
    Resolve = 14,
    /// Revert every asset of a changelist.
    RevertChanges = 15,
    /// Revert local modifications.
    Revert = 16,
    /// Query asset state.
    Status = 17,
    /// Submit a changelist.
    Submit = 18,
    /// Release locks.
    Unlock = 19,
}

impl_flag!(VcsCommand);

impl VcsCommand {
    /// Returns the wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// Set of advertised backend commands.
pub type CommandFlags = FlagSet<VcsCommand>;

/// Commands the engine answers itself; never part of the advertised bitmask.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString, IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum EngineCommand {
    /// Connect and authenticate against the backend.
    Login,
    /// Terminate the command loop.
    Exit,
    /// Keyed configuration: versions, traits, project path, field values.
    Config,
    /// Return the declared configuration fields.
    QueryConfig,
    /// Set configuration field values.
    SetConfig,
    /// Forward a backend-specific command.
    Custom,
}

impl EngineCommand {
    /// Returns the wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// Any command the engine accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// A backend-facing command.
    Vcs(VcsCommand),
    /// An engine-internal command.
    Engine(EngineCommand),
}

impl Command {
    /// Parses a wire command name, ignoring case and surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::UnknownCommand`] for unrecognised names.
    ///
    /// # Example
    ///
    /// ```
    /// use vcsbridge_protocol::{Command, EngineCommand, VcsCommand};
    ///
    /// assert_eq!(Command::parse("checkout").ok(), Some(Command::Vcs(VcsCommand::Checkout)));
    /// assert_eq!(Command::parse("exit").ok(), Some(Command::Engine(EngineCommand::Exit)));
    /// assert!(Command::parse("bogus").is_err());
    /// ```
    pub fn parse(name: &str) -> Result<Self, ProtocolError> {
        let normalised = name.trim().to_ascii_lowercase();
        VcsCommand::from_str(&normalised)
            .map(Self::Vcs)
            .or_else(|_| EngineCommand::from_str(&normalised).map(Self::Engine))
            .map_err(|_| ProtocolError::unknown_command(name))
    }

    /// Returns the wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vcs(command) => command.as_str(),
            Self::Engine(command) => command.as_str(),
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

//! Capability advertisement.
//!
//! A backend describes itself once per session: the configuration fields it
//! declares, the commands it supports and wants enabled while online, its
//! trait flags and an optional overlay table. The engine sends the bundle in
//! reply to `config traits`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::asset::AssetState;
use crate::command::CommandFlags;
use crate::config_field::ConfigField;
use crate::flags::{FlagSet, impl_flag};

/// Optional behaviours a backend supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum BackendTrait {
    /// Operations need a reachable server.
    RequiresNetwork = 0,
    /// Assets must be checked out before editing.
    EnablesCheckout = 1,
    /// Assets can be locked.
    EnablesLocking = 2,
    /// Unchanged checked-out assets can be reverted.
    EnablesRevertUnchanged = 3,
    /// Folders are versioned in their own right.
    EnablesFolderVersioning = 4,
    /// Pending changes are grouped into changelists.
    EnablesChangelists = 5,
    /// Get-latest may target a subset of a changeset.
    EnablesPartialChangesetGet = 6,
    /// The backend resolves conflicts itself.
    EnablesPluginConflictHandling = 7,
}

impl_flag!(BackendTrait);

/// Set of [`BackendTrait`] flags.
pub type TraitFlags = FlagSet<BackendTrait>;

/// Overlay icons keyed by asset state; empty when the backend keeps the
/// host defaults. Each state maps to at most one icon.
pub type Overlays = BTreeMap<AssetState, String>;

/// Everything a backend advertises about itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Declared configuration fields with their current values.
    pub fields: Vec<ConfigField>,
    /// Commands the backend implements.
    pub supported_commands: CommandFlags,
    /// Commands the host should enable while online.
    pub online_commands: CommandFlags,
    /// Trait flags.
    pub traits: TraitFlags,
    /// Overlay icons keyed by asset state.
    #[serde(default)]
    pub overlays: Overlays,
}

#[cfg(test)]
mod tests;

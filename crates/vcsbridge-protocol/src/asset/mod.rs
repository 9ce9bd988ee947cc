//! Versioned asset model.
//!
//! An asset is a host path plus a state flag set. Batch operations receive an
//! ordered [`VersionedAssetList`] and annotate each element in place, so the
//! same objects carry the targets in and the results out.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::flags::{FlagSet, impl_flag};

/// Suffix marking an asset path as a folder.
pub const FOLDER_SUFFIX: char = '/';

/// Extension of the sidecar metadata files the host keeps next to assets.
pub const META_EXTENSION: &str = ".meta";

/// One state bit an asset may carry.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum AssetState {
    /// Present in the local workspace.
    Local = 0,
    /// Up to date with the repository.
    Synced = 1,
    /// A newer revision exists in the repository.
    OutOfSync = 2,
    /// Tracked but absent from the workspace.
    Missing = 3,
    /// Checked out by the current user.
    CheckedOutLocal = 4,
    /// Checked out by another user.
    CheckedOutRemote = 5,
    /// Marked for deletion locally.
    DeletedLocal = 6,
    /// Deleted in the repository.
    DeletedRemote = 7,
    /// Marked for addition locally.
    AddedLocal = 8,
    /// Added in the repository but not yet fetched.
    AddedRemote = 9,
    /// Local and remote edits collide.
    Conflicted = 10,
    /// Locked by the current user.
    LockedLocal = 11,
    /// Locked by another user.
    LockedRemote = 12,
    /// An operation is still pending on the asset.
    Updating = 13,
    /// Write protected in the workspace.
    ReadOnly = 14,
    /// Sidecar metadata file.
    MetaFile = 15,
    /// Moved locally.
    MovedLocal = 16,
    /// Moved in the repository.
    MovedRemote = 17,
    /// The last operation on the asset failed.
    Error = 18,
}

impl_flag!(AssetState);

/// Set of [`AssetState`] flags.
pub type AssetStates = FlagSet<AssetState>;

/// A file or folder tracked by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedAsset {
    path: String,
    #[serde(default)]
    state: AssetStates,
}

impl VersionedAsset {
    /// Creates an asset with no state.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            state: AssetStates::empty(),
        }
    }

    /// Creates an asset carrying `state`.
    #[must_use]
    pub fn with_state(path: impl Into<String>, state: impl Into<AssetStates>) -> Self {
        Self {
            path: path.into(),
            state: state.into(),
        }
    }

    /// Returns the host path.
    #[must_use]
    pub const fn path(&self) -> &str {
        self.path.as_str()
    }

    /// Replaces the host path.
    pub fn set_path(&mut self, path: impl Into<String>) {
        self.path = path.into();
    }

    /// Returns the state flags.
    #[must_use]
    pub const fn state(&self) -> AssetStates {
        self.state
    }

    /// Replaces the state with a terminal result.
    pub fn set_state(&mut self, state: impl Into<AssetStates>) {
        self.state = state.into();
    }

    /// Adds one state flag, keeping the rest.
    pub fn insert_state(&mut self, flag: AssetState) {
        self.state.insert(flag);
    }

    /// Removes one state flag, keeping the rest.
    pub fn remove_state(&mut self, flag: AssetState) {
        self.state.remove(flag);
    }

    /// Returns `true` when the path names a folder.
    #[must_use]
    pub fn is_folder(&self) -> bool {
        self.path.ends_with(FOLDER_SUFFIX)
    }

    /// Returns `true` when the path names a metadata sidecar.
    #[must_use]
    pub fn is_meta(&self) -> bool {
        self.path.ends_with(META_EXTENSION) || self.state.contains(AssetState::MetaFile)
    }

    /// Returns `true` while an operation is pending on the asset.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.state.contains(AssetState::Updating)
    }

    /// Flags the asset as awaiting a result.
    pub fn mark_pending(&mut self) {
        self.state.insert(AssetState::Updating);
    }

    /// Records a failed operation: clears the pending flag and sets `error`.
    pub fn mark_failed(&mut self) {
        self.state.remove(AssetState::Updating);
        self.state.insert(AssetState::Error);
    }
}

/// Ordered in/out list of assets handed to each operation.
pub type VersionedAssetList = Vec<VersionedAsset>;

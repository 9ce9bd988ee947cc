//! Depot and workspace bookkeeping.
//!
//! The depot holds the head revision of every tracked file along with who
//! else has it checked out or locked. The workspace holds what the local
//! user has synced and opened. Asset states are derived from both on demand.

use std::collections::BTreeMap;

use vcsbridge_protocol::{
    AssetState, AssetStates, Changelist, ChangelistRevision, FOLDER_SUFFIX, META_EXTENSION,
};

/// How a workspace file is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum OpenAction {
    Add,
    Edit,
    Delete,
    MoveAdd { from: String },
    MoveDelete,
}

/// A tracked file as the server sees it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct DepotFile {
    pub(crate) head: u32,
    pub(crate) checked_out_by: Option<String>,
    pub(crate) locked_by: Option<String>,
}

/// A file in the local workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct WorkspaceFile {
    pub(crate) have: u32,
    pub(crate) action: Option<OpenAction>,
    pub(crate) changelist: ChangelistRevision,
    pub(crate) needs_resolve: bool,
}

impl OpenAction {
    pub(crate) const fn verb(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Edit => "edit",
            Self::Delete => "delete",
            Self::MoveAdd { .. } => "move/add",
            Self::MoveDelete => "move/delete",
        }
    }
}

impl WorkspaceFile {
    pub(crate) fn synced(have: u32) -> Self {
        Self {
            have,
            action: None,
            changelist: ChangelistRevision::default_changelist(),
            needs_resolve: false,
        }
    }

    pub(crate) fn opened(have: u32, action: OpenAction) -> Self {
        Self {
            action: Some(action),
            ..Self::synced(have)
        }
    }

    fn is_present(&self) -> bool {
        !matches!(
            self.action,
            Some(OpenAction::Delete | OpenAction::MoveDelete)
        ) && (self.have > 0 || self.action.is_some())
    }
}

/// A submitted changelist and the files it touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SubmittedChange {
    pub(crate) changelist: Changelist,
    pub(crate) paths: Vec<String>,
}

/// Server and workspace state of the in-memory backend.
#[derive(Debug, Default)]
pub(crate) struct Depot {
    pub(crate) files: BTreeMap<String, DepotFile>,
    pub(crate) workspace: BTreeMap<String, WorkspaceFile>,
    pub(crate) pending: BTreeMap<ChangelistRevision, Changelist>,
    pub(crate) submitted: Vec<SubmittedChange>,
    last_change: u32,
}

pub(crate) fn is_folder(path: &str) -> bool {
    path.ends_with(FOLDER_SUFFIX)
}

impl Depot {
    /// Allocates the next changelist number.
    pub(crate) fn next_revision(&mut self) -> ChangelistRevision {
        self.last_change += 1;
        ChangelistRevision::new(self.last_change.to_string())
    }

    pub(crate) fn is_tracked(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    pub(crate) fn opened_action(&self, path: &str) -> Option<&OpenAction> {
        self.workspace.get(path).and_then(|file| file.action.as_ref())
    }

    /// Workspace paths opened in `revision`, in path order.
    pub(crate) fn opened_in(&self, revision: &ChangelistRevision) -> Vec<String> {
        self.workspace
            .iter()
            .filter(|(_, file)| file.action.is_some() && &file.changelist == revision)
            .map(|(path, _)| path.clone())
            .collect()
    }

    pub(crate) fn has_changelist(&self, revision: &ChangelistRevision) -> bool {
        revision.is_default() || self.pending.contains_key(revision)
    }

    /// Returns `true` when some file below `folder` is behind its head.
    fn folder_out_of_sync(&self, folder: &str) -> bool {
        self.files
            .iter()
            .filter(|(path, _)| path.starts_with(folder))
            .any(|(path, file)| self.workspace.get(path).map_or(0, |ws| ws.have) < file.head)
    }

    /// Derives the state of `path` as seen by `user`.
    pub(crate) fn state(&self, path: &str, user: &str, recursive: bool) -> AssetStates {
        if is_folder(path) {
            let sync = if recursive && self.folder_out_of_sync(path) {
                AssetState::OutOfSync
            } else {
                AssetState::Synced
            };
            return AssetState::Local | sync;
        }

        let mut state = AssetStates::empty();
        if path.ends_with(META_EXTENSION) {
            state.insert(AssetState::MetaFile);
        }

        let local = self.workspace.get(path);
        if local.map_or(!self.is_tracked(path), WorkspaceFile::is_present) {
            state.insert(AssetState::Local);
        }
        match local.and_then(|file| file.action.as_ref()) {
            Some(OpenAction::Add) => state.insert(AssetState::AddedLocal),
            Some(OpenAction::Edit) => state.insert(AssetState::CheckedOutLocal),
            Some(OpenAction::Delete) => state.insert(AssetState::DeletedLocal),
            Some(OpenAction::MoveAdd { .. } | OpenAction::MoveDelete) => {
                state.insert(AssetState::MovedLocal);
            }
            None => {}
        }
        if local.is_some_and(|file| file.needs_resolve) {
            state.insert(AssetState::Conflicted);
        }

        if let Some(file) = self.files.get(path) {
            let have = local.map_or(0, |ws| ws.have);
            if have == 0 && local.is_none() {
                state.insert(AssetState::Missing);
            } else if have < file.head {
                state.insert(AssetState::OutOfSync);
            } else {
                state.insert(AssetState::Synced);
            }
            if file.checked_out_by.as_deref().is_some_and(|other| other != user) {
                state.insert(AssetState::CheckedOutRemote);
            }
            match file.locked_by.as_deref() {
                Some(owner) if owner == user => state.insert(AssetState::LockedLocal),
                Some(_) => state.insert(AssetState::LockedRemote),
                None => {}
            }
        }
        state
    }

    /// Adds `path` to the depot at revision 1 and syncs it.
    pub(crate) fn seed(&mut self, path: &str) {
        self.files.entry(path.to_owned()).or_insert(DepotFile {
            head: 1,
            ..DepotFile::default()
        });
        self.workspace
            .entry(path.to_owned())
            .or_insert_with(|| WorkspaceFile::synced(1));
    }

    /// Records a submit by someone else, bumping the head of each path.
    pub(crate) fn remote_submit(&mut self, changelist: Changelist, paths: Vec<String>) {
        for path in &paths {
            self.files.entry(path.clone()).or_default().head += 1;
        }
        self.submitted.push(SubmittedChange { changelist, paths });
    }

    /// Submitted changes with at least one file the workspace has not synced.
    pub(crate) fn incoming(&self, user: &str) -> impl Iterator<Item = &SubmittedChange> {
        self.submitted.iter().filter(move |change| {
            change.changelist.committer() != Some(user)
                && change.paths.iter().any(|path| {
                    let have = self.workspace.get(path).map_or(0, |ws| ws.have);
                    self.files.get(path).is_some_and(|file| have < file.head)
                })
        })
    }

    /// Applies the open action of `path` to the depot. Returns `false` when
    /// the file was not opened.
    pub(crate) fn commit(&mut self, path: &str) -> bool {
        let Some(local) = self.workspace.get(path).cloned() else {
            return false;
        };
        let Some(action) = local.action else {
            return false;
        };

        match action {
            OpenAction::Delete | OpenAction::MoveDelete => {
                self.files.remove(path);
                self.workspace.remove(path);
            }
            OpenAction::Add | OpenAction::Edit | OpenAction::MoveAdd { .. } => {
                let file = self.files.entry(path.to_owned()).or_default();
                file.head += 1;
                file.locked_by = None;
                let head = file.head;
                self.workspace
                    .insert(path.to_owned(), WorkspaceFile::synced(head));
            }
        }
        true
    }
}

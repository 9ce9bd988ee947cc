//! In-memory reference backend for the version-control bridge.
//!
//! [`MemoryBackend`] keeps a depot and a single workspace in process memory
//! and implements every bridge operation against them, so the whole host
//! contract can be exercised without a server. Activity by other users and
//! connection outages are staged through `custom` commands (see the `script`
//! module) or, in process, through the methods on [`MemoryBackend`].
//!
//! The `vcsbridge-memory` binary serves this backend over stdio.

mod depot;
mod script;

#[cfg(test)]
mod tests;

use std::collections::BTreeSet;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{debug, info};
use vcsbridge_protocol::{
    AssetState, AssetStates, BackendTrait, Changelist, ChangelistRevision, ChangelistRevisions,
    Changes, CommandFlags, ConfigField, FieldFlag, FieldFlags, Overlays, StatusItem, TraitFlags,
    VersionedAsset, VersionedAssetList,
};
use vcsbridged::{BackendError, BackendResult, Session, VersionControlBackend};

use self::depot::{Depot, OpenAction, WorkspaceFile, is_folder};
use self::script::Script;

const BACKEND_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::backend");

/// Name of the required user field.
pub const FIELD_USER: &str = "user";
/// Name of the workspace field.
pub const FIELD_WORKSPACE: &str = "workspace";
/// Name of the password field.
pub const FIELD_PASSWORD: &str = "password";

const UNREACHABLE: &str = "depot unreachable";

/// Version-control backend whose depot lives in memory.
#[derive(Debug)]
pub struct MemoryBackend {
    depot: Depot,
    reachable: bool,
    refused_connects: u32,
    connected: bool,
    user: String,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self {
            depot: Depot::default(),
            reachable: true,
            refused_connects: 0,
            connected: false,
            user: String::new(),
        }
    }
}

impl MemoryBackend {
    /// Creates a backend with an empty depot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Switches the simulated server on or off. While unreachable every
    /// connect fails and every operation reports connection loss.
    pub fn set_reachable(&mut self, reachable: bool) {
        info!(target: BACKEND_TARGET, reachable, "reachability changed");
        self.reachable = reachable;
        if !reachable {
            self.connected = false;
        }
    }

    /// Adds files to the depot at revision 1 and syncs them.
    pub fn seed<I, S>(&mut self, paths: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for path in paths {
            self.depot.seed(path.as_ref());
        }
    }

    /// Records that `user` has `path` checked out, seeding it when needed.
    pub fn checkout_by(&mut self, path: &str, user: &str) {
        self.depot.seed(path);
        if let Some(file) = self.depot.files.get_mut(path) {
            file.checked_out_by = Some(user.to_owned());
        }
    }

    /// Records that `user` holds the lock on `path`, seeding it when needed.
    pub fn lock_by(&mut self, path: &str, user: &str) {
        self.depot.seed(path);
        if let Some(file) = self.depot.files.get_mut(path) {
            file.locked_by = Some(user.to_owned());
        }
    }

    /// Submits new revisions of `paths` as `user` and returns the changelist
    /// number.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Failed`] when the timestamp cannot be
    /// formatted.
    pub fn remote_submit<I, S>(
        &mut self,
        user: &str,
        description: &str,
        paths: I,
    ) -> BackendResult<ChangelistRevision>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let timestamp = now()?;
        let revision = self.depot.next_revision();
        let changelist = Changelist::new(revision.clone(), description)
            .with_committer(user)
            .with_timestamp(timestamp);
        self.depot
            .remote_submit(changelist, paths.into_iter().map(Into::into).collect());
        Ok(revision)
    }

    /// Returns the user the session logged in as.
    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Returns the current state of `path`.
    #[must_use]
    pub fn state_of(&self, path: &str) -> AssetStates {
        self.depot.state(path, &self.user, false)
    }

    fn ensure_reachable(&mut self) -> BackendResult<()> {
        if self.reachable && self.refused_connects == 0 {
            return Ok(());
        }
        self.connected = false;
        Err(BackendError::connection_lost(UNREACHABLE))
    }

    fn annotate(&self, asset: &mut VersionedAsset, recursive: bool) {
        asset.set_state(self.depot.state(asset.path(), &self.user, recursive));
    }

    /// Records a per-asset failure: one error item, and the asset's current
    /// state plus the error flag.
    fn fail(&self, session: &mut Session, asset: &mut VersionedAsset, message: String) {
        debug!(target: BACKEND_TARGET, path = asset.path(), %message, "asset failed");
        session.add_status(StatusItem::error(message));
        self.annotate(asset, false);
        asset.insert_state(AssetState::Error);
    }

    fn require_changelist(&self, revision: &ChangelistRevision) -> BackendResult<()> {
        if self.depot.has_changelist(revision) {
            Ok(())
        } else {
            Err(BackendError::failed(format!(
                "no pending changelist {revision}"
            )))
        }
    }

    fn sync(&mut self, path: &str) -> Result<(), String> {
        let Some(head) = self.depot.files.get(path).map(|file| file.head) else {
            return match self.depot.opened_action(path) {
                Some(OpenAction::Add | OpenAction::MoveAdd { .. }) => Ok(()),
                _ => Err(format!("'{path}' is not in the depot")),
            };
        };
        let local = self
            .depot
            .workspace
            .entry(path.to_owned())
            .or_insert_with(|| WorkspaceFile::synced(0));
        if local.action == Some(OpenAction::Edit) && local.have < head {
            local.needs_resolve = true;
        }
        local.have = head;
        Ok(())
    }

    /// Undoes whatever `path` is opened for.
    fn revert_path(&mut self, path: &str) {
        let Some(action) = self.depot.opened_action(path).cloned() else {
            return;
        };
        match action {
            OpenAction::Add => {
                self.depot.workspace.remove(path);
            }
            OpenAction::MoveAdd { from } => {
                self.depot.workspace.remove(path);
                self.reopen_unchanged(&from);
            }
            OpenAction::MoveDelete => {
                let target = self.depot.workspace.iter().find_map(|(target, file)| {
                    matches!(&file.action, Some(OpenAction::MoveAdd { from }) if from == path)
                        .then(|| target.clone())
                });
                if let Some(target) = target {
                    self.depot.workspace.remove(&target);
                }
                self.reopen_unchanged(path);
            }
            OpenAction::Edit | OpenAction::Delete => self.reopen_unchanged(path),
        }
        if let Some(file) = self.depot.files.get_mut(path)
            && file.locked_by.as_deref() == Some(self.user.as_str())
        {
            file.locked_by = None;
        }
    }

    fn reopen_unchanged(&mut self, path: &str) {
        if let Some(local) = self.depot.workspace.get_mut(path) {
            local.action = None;
            local.changelist = ChangelistRevision::default_changelist();
            local.needs_resolve = false;
        }
    }

    fn fill(&self, paths: impl IntoIterator<Item = String>, assets: &mut VersionedAssetList) {
        assets.extend(paths.into_iter().map(|path| {
            let state = self.depot.state(&path, &self.user, false);
            VersionedAsset::with_state(path, state)
        }));
    }

    fn run_script(&mut self, script: Script) -> BackendResult<Vec<String>> {
        let output: Vec<String> = match script {
            Script::Seed { paths } => {
                self.seed(&paths);
                paths.iter().map(|path| format!("seeded {path}")).collect()
            }
            Script::CheckoutBy { user, paths } => paths
                .iter()
                .map(|path| {
                    self.checkout_by(path, &user);
                    format!("'{path}' checked out by {user}")
                })
                .collect(),
            Script::LockBy { user, paths } => paths
                .iter()
                .map(|path| {
                    self.lock_by(path, &user);
                    format!("'{path}' locked by {user}")
                })
                .collect(),
            Script::RemoteSubmit {
                user,
                description,
                paths,
            } => {
                let revision = self.remote_submit(&user, &description, paths)?;
                vec![format!("change {revision} submitted by {user}")]
            }
            Script::Outage { connects } => {
                self.refused_connects = connects;
                vec![format!("outage: refusing the next {connects} connects")]
            }
            Script::Files => self
                .depot
                .files
                .iter()
                .map(|(path, file)| {
                    let have = self.depot.workspace.get(path).map_or(0, |local| local.have);
                    format!("{path}#{have}/{}", file.head)
                })
                .collect(),
        };
        Ok(output)
    }
}

fn now() -> BackendResult<String> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(|error| BackendError::failed(format!("failed to format timestamp: {error}")))
}

impl VersionControlBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn supported_versions(&self) -> BTreeSet<u32> {
        BTreeSet::from([1, 2])
    }

    fn traits(&self) -> TraitFlags {
        BackendTrait::RequiresNetwork
            | BackendTrait::EnablesCheckout
            | BackendTrait::EnablesLocking
            | BackendTrait::EnablesChangelists
    }

    fn config_fields(&self) -> Vec<ConfigField> {
        vec![
            ConfigField::new(
                FIELD_USER,
                "User",
                "User name used to connect",
                "",
                FieldFlag::Required,
            ),
            ConfigField::new(
                FIELD_WORKSPACE,
                "Workspace",
                "Client workspace name",
                "default",
                FieldFlags::empty(),
            ),
            ConfigField::new(
                FIELD_PASSWORD,
                "Password",
                "Password for the user",
                "",
                FieldFlag::Password,
            ),
        ]
    }

    fn online_commands(&self) -> CommandFlags {
        CommandFlags::all()
    }

    fn overlays(&self) -> Overlays {
        Overlays::from([
            (
                AssetState::CheckedOutRemote,
                "memory/checked-out-remote".to_owned(),
            ),
            (AssetState::LockedRemote, "memory/locked-remote".to_owned()),
        ])
    }

    fn connect(&mut self, _session: &mut Session) -> BackendResult<()> {
        if !self.reachable {
            return Err(BackendError::connection_lost(UNREACHABLE));
        }
        if self.refused_connects > 0 {
            self.refused_connects -= 1;
            return Err(BackendError::connection_lost(UNREACHABLE));
        }
        self.connected = true;
        info!(target: BACKEND_TARGET, "connected");
        Ok(())
    }

    fn disconnect(&mut self, _session: &mut Session) {
        info!(target: BACKEND_TARGET, "disconnected");
        self.connected = false;
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn login(&mut self, session: &mut Session) -> BackendResult<()> {
        let user = session
            .config_value(FIELD_USER)
            .map(str::trim)
            .filter(|user| !user.is_empty())
            .ok_or_else(|| BackendError::failed("no user configured"))?;
        self.user = user.to_owned();
        info!(
            target: BACKEND_TARGET,
            user = %self.user,
            workspace = session.config_value(FIELD_WORKSPACE).unwrap_or_default(),
            "logged in"
        );
        Ok(())
    }

    fn add(&mut self, session: &mut Session, assets: &mut VersionedAssetList) -> BackendResult<()> {
        self.ensure_reachable()?;
        for asset in assets.iter_mut() {
            let path = asset.path().to_owned();
            if !is_folder(&path) {
                if self.depot.is_tracked(&path) || self.depot.opened_action(&path).is_some() {
                    session.add_status(StatusItem::warning(format!(
                        "'{path}' is already under version control"
                    )));
                } else {
                    self.depot
                        .workspace
                        .insert(path, WorkspaceFile::opened(0, OpenAction::Add));
                }
            }
            self.annotate(asset, false);
        }
        Ok(())
    }

    fn checkout(
        &mut self,
        session: &mut Session,
        assets: &mut VersionedAssetList,
    ) -> BackendResult<()> {
        self.ensure_reachable()?;
        for asset in assets.iter_mut() {
            let path = asset.path().to_owned();
            if is_folder(&path) {
                self.annotate(asset, false);
                continue;
            }
            let Some(file) = self.depot.files.get(&path) else {
                self.fail(session, asset, format!("'{path}' is not in the depot"));
                continue;
            };
            if let Some(other) = file
                .checked_out_by
                .as_deref()
                .filter(|other| *other != self.user)
            {
                let message = format!("'{path}' is checked out by {other}");
                self.fail(session, asset, message);
                asset.insert_state(AssetState::Conflicted);
                continue;
            }
            let head = file.head;
            match self.depot.opened_action(&path) {
                None => {
                    let local = self
                        .depot
                        .workspace
                        .entry(path)
                        .or_insert_with(|| WorkspaceFile::synced(head));
                    local.action = Some(OpenAction::Edit);
                }
                Some(OpenAction::Edit) => {}
                Some(other) => {
                    let message = format!("'{path}' is already opened for {}", other.verb());
                    self.fail(session, asset, message);
                    continue;
                }
            }
            self.annotate(asset, false);
        }
        Ok(())
    }

    fn download(
        &mut self,
        session: &mut Session,
        target_dir: &str,
        revisions: &ChangelistRevisions,
        assets: &mut VersionedAssetList,
    ) -> BackendResult<()> {
        self.ensure_reachable()?;
        debug!(target: BACKEND_TARGET, target_dir, revisions = revisions.len(), "download");
        for (index, asset) in assets.iter_mut().enumerate() {
            let path = asset.path().to_owned();
            let Some(head) = self.depot.files.get(&path).map(|file| file.head) else {
                self.fail(session, asset, format!("'{path}' is not in the depot"));
                continue;
            };
            let wanted = match revisions.get(index) {
                None => Ok(head),
                Some(revision) if revision.as_str() == "head" => Ok(head),
                Some(revision) => revision.as_str().parse::<u32>(),
            };
            match wanted {
                Ok(wanted) if (1..=head).contains(&wanted) => {
                    asset.set_state(AssetState::Local | AssetState::Synced);
                }
                _ => {
                    let revision = revisions.get(index).map_or("head", |r| r.as_str());
                    self.fail(
                        session,
                        asset,
                        format!("'{path}' has no revision {revision}"),
                    );
                }
            }
        }
        Ok(())
    }

    fn get_latest(
        &mut self,
        session: &mut Session,
        assets: &mut VersionedAssetList,
    ) -> BackendResult<()> {
        self.ensure_reachable()?;
        for asset in assets.iter_mut() {
            let path = asset.path().to_owned();
            let result = if is_folder(&path) {
                let below: Vec<String> = self
                    .depot
                    .files
                    .keys()
                    .filter(|file| file.starts_with(&path))
                    .cloned()
                    .collect();
                below.iter().try_for_each(|file| self.sync(file))
            } else {
                self.sync(&path)
            };
            match result {
                Ok(()) => self.annotate(asset, false),
                Err(message) => self.fail(session, asset, message),
            }
        }
        Ok(())
    }

    fn revert(
        &mut self,
        _session: &mut Session,
        assets: &mut VersionedAssetList,
    ) -> BackendResult<()> {
        self.ensure_reachable()?;
        for asset in assets.iter_mut() {
            self.revert_path(asset.path());
            self.annotate(asset, false);
        }
        Ok(())
    }

    fn resolve(
        &mut self,
        session: &mut Session,
        assets: &mut VersionedAssetList,
    ) -> BackendResult<()> {
        self.ensure_reachable()?;
        for asset in assets.iter_mut() {
            let path = asset.path().to_owned();
            match self.depot.workspace.get_mut(&path) {
                Some(local) => {
                    local.needs_resolve = false;
                    self.annotate(asset, false);
                }
                None => self.fail(session, asset, format!("'{path}' is not in the workspace")),
            }
        }
        Ok(())
    }

    fn remove(
        &mut self,
        session: &mut Session,
        assets: &mut VersionedAssetList,
    ) -> BackendResult<()> {
        self.ensure_reachable()?;
        for asset in assets.iter_mut() {
            let path = asset.path().to_owned();
            if self.depot.opened_action(&path) == Some(&OpenAction::Add) {
                self.depot.workspace.remove(&path);
            } else if !self.depot.is_tracked(&path) {
                self.fail(session, asset, format!("'{path}' is not in the depot"));
                continue;
            } else {
                let head = self.depot.files.get(&path).map_or(0, |file| file.head);
                let local = self
                    .depot
                    .workspace
                    .entry(path)
                    .or_insert_with(|| WorkspaceFile::synced(head));
                local.action = Some(OpenAction::Delete);
            }
            self.annotate(asset, false);
        }
        Ok(())
    }

    fn move_assets(
        &mut self,
        session: &mut Session,
        from: &VersionedAssetList,
        to: &mut VersionedAssetList,
    ) -> BackendResult<()> {
        self.ensure_reachable()?;
        for (origin, target) in from.iter().zip(to.iter_mut()) {
            let source = origin.path().to_owned();
            let destination = target.path().to_owned();
            if !self.depot.is_tracked(&source) {
                self.fail(session, target, format!("'{source}' is not in the depot"));
                continue;
            }
            if self.depot.is_tracked(&destination) || self.depot.opened_action(&destination).is_some()
            {
                self.fail(session, target, format!("'{destination}' already exists"));
                continue;
            }
            match self.depot.opened_action(&source) {
                None | Some(OpenAction::Edit) => {}
                Some(other) => {
                    let message = format!("'{source}' is already opened for {}", other.verb());
                    self.fail(session, target, message);
                    continue;
                }
            }

            let head = self.depot.files.get(&source).map_or(0, |file| file.head);
            let local = self
                .depot
                .workspace
                .entry(source.clone())
                .or_insert_with(|| WorkspaceFile::synced(head));
            local.action = Some(OpenAction::MoveDelete);
            let changelist = local.changelist.clone();
            let mut moved = WorkspaceFile::opened(0, OpenAction::MoveAdd { from: source });
            moved.changelist = changelist;
            self.depot.workspace.insert(destination, moved);
            self.annotate(target, false);
        }
        Ok(())
    }

    fn lock(&mut self, session: &mut Session, assets: &mut VersionedAssetList) -> BackendResult<()> {
        self.ensure_reachable()?;
        for asset in assets.iter_mut() {
            let path = asset.path().to_owned();
            let user = self.user.clone();
            let Some(file) = self.depot.files.get_mut(&path) else {
                self.fail(session, asset, format!("'{path}' is not in the depot"));
                continue;
            };
            match file.locked_by.clone() {
                Some(owner) if owner != user => {
                    self.fail(session, asset, format!("'{path}' is locked by {owner}"));
                    continue;
                }
                _ => file.locked_by = Some(user),
            }
            self.annotate(asset, false);
        }
        Ok(())
    }

    fn unlock(
        &mut self,
        session: &mut Session,
        assets: &mut VersionedAssetList,
    ) -> BackendResult<()> {
        self.ensure_reachable()?;
        for asset in assets.iter_mut() {
            let path = asset.path().to_owned();
            let user = self.user.clone();
            if let Some(file) = self.depot.files.get_mut(&path) {
                match file.locked_by.clone() {
                    Some(owner) if owner == user => file.locked_by = None,
                    Some(owner) => {
                        self.fail(session, asset, format!("'{path}' is locked by {owner}"));
                        continue;
                    }
                    None => {}
                }
            }
            self.annotate(asset, false);
        }
        Ok(())
    }

    fn change_or_move(
        &mut self,
        session: &mut Session,
        revision: &ChangelistRevision,
        assets: &mut VersionedAssetList,
    ) -> BackendResult<()> {
        self.ensure_reachable()?;
        self.require_changelist(revision)?;
        for asset in assets.iter_mut() {
            let path = asset.path().to_owned();
            let opened = self
                .depot
                .workspace
                .get_mut(&path)
                .filter(|local| local.action.is_some());
            match opened {
                Some(local) => {
                    local.changelist = revision.clone();
                    self.annotate(asset, false);
                }
                None => self.fail(session, asset, format!("'{path}' is not opened")),
            }
        }
        Ok(())
    }

    fn submit(
        &mut self,
        session: &mut Session,
        changelist: &Changelist,
        assets: &mut VersionedAssetList,
    ) -> BackendResult<()> {
        self.ensure_reachable()?;
        if changelist.description().trim().is_empty() {
            return Err(BackendError::failed("submit requires a description"));
        }
        self.require_changelist(changelist.revision())?;
        let timestamp = now()?;

        let mut committable = Vec::new();
        for asset in assets.iter_mut() {
            let path = asset.path().to_owned();
            let Some(local) = self.depot.workspace.get(&path) else {
                self.fail(session, asset, format!("'{path}' is not opened"));
                continue;
            };
            let head = self.depot.files.get(&path).map_or(0, |file| file.head);
            let problem = match &local.action {
                None => Some(format!("'{path}' is not opened")),
                Some(_) if local.needs_resolve => {
                    Some(format!("'{path}' must be resolved before submit"))
                }
                Some(OpenAction::Edit) if local.have < head => {
                    Some(format!("'{path}' is out of date"))
                }
                Some(_) => None,
            };
            match problem {
                Some(message) => self.fail(session, asset, message),
                None => committable.push(path),
            }
        }
        if committable.is_empty() {
            return Ok(());
        }

        let revision = self.depot.next_revision();
        let mut paths = Vec::new();
        for path in &committable {
            if let Some(OpenAction::MoveAdd { from }) = self.depot.opened_action(path).cloned()
                && self.depot.commit(&from)
            {
                paths.push(from);
            }
            if self.depot.commit(path) {
                paths.push(path.clone());
            }
        }
        info!(
            target: BACKEND_TARGET,
            %revision,
            files = paths.len(),
            "changelist submitted"
        );
        self.depot.submitted.push(depot::SubmittedChange {
            changelist: Changelist::new(revision, changelist.description())
                .with_committer(self.user.clone())
                .with_timestamp(timestamp),
            paths,
        });

        let pending = changelist.revision();
        if !pending.is_default() && self.depot.opened_in(pending).is_empty() {
            self.depot.pending.remove(pending);
        }
        for asset in assets.iter_mut() {
            if committable.iter().any(|path| path == asset.path()) {
                self.annotate(asset, false);
            }
        }
        Ok(())
    }

    fn status(
        &mut self,
        _session: &mut Session,
        assets: &mut VersionedAssetList,
        recursive: bool,
    ) -> BackendResult<()> {
        self.ensure_reachable()?;
        for asset in assets.iter_mut() {
            self.annotate(asset, recursive);
        }
        Ok(())
    }

    fn change_status(
        &mut self,
        _session: &mut Session,
        revision: &ChangelistRevision,
        assets: &mut VersionedAssetList,
    ) -> BackendResult<()> {
        self.ensure_reachable()?;
        self.require_changelist(revision)?;
        self.fill(self.depot.opened_in(revision), assets);
        Ok(())
    }

    fn incoming_change_status(
        &mut self,
        _session: &mut Session,
        revision: &ChangelistRevision,
        assets: &mut VersionedAssetList,
    ) -> BackendResult<()> {
        self.ensure_reachable()?;
        let paths = self
            .depot
            .submitted
            .iter()
            .find(|change| change.changelist.revision() == revision)
            .map(|change| change.paths.clone())
            .ok_or_else(|| BackendError::failed(format!("no submitted changelist {revision}")))?;
        self.fill(paths, assets);
        Ok(())
    }

    fn changes(&mut self, _session: &mut Session) -> BackendResult<Changes> {
        self.ensure_reachable()?;
        let mut changes = vec![Changelist::new(
            ChangelistRevision::default_changelist(),
            "Default changelist",
        )];
        changes.extend(self.depot.pending.values().cloned());
        Ok(changes)
    }

    fn incoming_changes(&mut self, _session: &mut Session) -> BackendResult<Changes> {
        self.ensure_reachable()?;
        Ok(self
            .depot
            .incoming(&self.user)
            .map(|change| change.changelist.clone())
            .collect())
    }

    fn update_revision(
        &mut self,
        _session: &mut Session,
        revision: &ChangelistRevision,
        description: &str,
    ) -> BackendResult<String> {
        self.ensure_reachable()?;
        if revision.is_default() {
            let created = self.depot.next_revision();
            for path in self.depot.opened_in(revision) {
                if let Some(local) = self.depot.workspace.get_mut(&path) {
                    local.changelist = created.clone();
                }
            }
            info!(target: BACKEND_TARGET, revision = %created, "pending changelist created");
            self.depot
                .pending
                .insert(created.clone(), Changelist::new(created, description));
            return Ok(description.to_owned());
        }

        let changelist = self
            .depot
            .pending
            .get_mut(revision)
            .ok_or_else(|| BackendError::failed(format!("no pending changelist {revision}")))?;
        changelist.set_description(description);
        Ok(description.to_owned())
    }

    fn delete_revision(
        &mut self,
        _session: &mut Session,
        revision: &ChangelistRevision,
    ) -> BackendResult<()> {
        self.ensure_reachable()?;
        if revision.is_default() {
            return Err(BackendError::failed(
                "the default changelist cannot be deleted",
            ));
        }
        self.require_changelist(revision)?;
        let open = self.depot.opened_in(revision).len();
        if open > 0 {
            return Err(BackendError::failed(format!(
                "changelist {revision} still has {open} open files"
            )));
        }
        self.depot.pending.remove(revision);
        Ok(())
    }

    fn revert_changes(
        &mut self,
        _session: &mut Session,
        revision: &ChangelistRevision,
        assets: &mut VersionedAssetList,
    ) -> BackendResult<()> {
        self.ensure_reachable()?;
        self.require_changelist(revision)?;
        for path in self.depot.opened_in(revision) {
            self.revert_path(&path);
        }
        for asset in assets.iter_mut() {
            self.annotate(asset, false);
        }
        Ok(())
    }

    fn custom_command(
        &mut self,
        _session: &mut Session,
        name: &str,
        arguments: &[String],
    ) -> BackendResult<Vec<String>> {
        let script = Script::parse(name, arguments)?;
        debug!(target: BACKEND_TARGET, ?script, "running staging command");
        self.run_script(script)
    }
}

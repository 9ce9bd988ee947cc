//! Scripted backend double shared by the engine tests.

use std::collections::{BTreeMap, BTreeSet};

use vcsbridge_protocol::{
    AssetState, AssetStates, BackendTrait, Changelist, ChangelistRevision, ChangelistRevisions,
    Changes, CommandFlags, ConfigField, FieldFlags, StatusItem, TraitFlags, VcsCommand,
    VersionedAsset, VersionedAssetList,
};

use crate::{BackendError, BackendResult, Session, VersionControlBackend};

/// In-process backend whose behaviour is set up by each test.
#[derive(Debug)]
pub(crate) struct ScriptedBackend {
    pub(crate) reachable: bool,
    pub(crate) connected: bool,
    pub(crate) versions: BTreeSet<u32>,
    pub(crate) remote_checkouts: BTreeMap<String, String>,
    pub(crate) ignored: BTreeSet<String>,
    pub(crate) drop_connection_after: Option<usize>,
    pub(crate) changelists: Vec<Changelist>,
    pub(crate) calls: Vec<&'static str>,
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self {
            reachable: true,
            connected: false,
            versions: BTreeSet::from([1, 2]),
            remote_checkouts: BTreeMap::new(),
            ignored: BTreeSet::new(),
            drop_connection_after: None,
            changelists: vec![Changelist::new(ChangelistRevision::new("7"), "pending work")],
            calls: Vec::new(),
        }
    }
}

impl ScriptedBackend {
    pub(crate) fn unreachable() -> Self {
        Self {
            reachable: false,
            ..Self::default()
        }
    }

    pub(crate) fn checked_out_by(mut self, path: &str, user: &str) -> Self {
        self.remote_checkouts.insert(path.to_owned(), user.to_owned());
        self
    }

    pub(crate) fn count(&self, call: &str) -> usize {
        self.calls.iter().filter(|recorded| **recorded == call).count()
    }

    /// Applies `state` to each asset, honouring ignored paths and scripted
    /// connection loss.
    fn settle(
        &mut self,
        call: &'static str,
        assets: &mut VersionedAssetList,
        state: AssetStates,
    ) -> BackendResult<()> {
        self.calls.push(call);
        for (index, asset) in assets.iter_mut().enumerate() {
            if self.drop_connection_after == Some(index) {
                self.connected = false;
                self.reachable = false;
                return Err(BackendError::connection_lost("server went away"));
            }
            if !self.ignored.contains(asset.path()) {
                asset.set_state(state);
            }
        }
        Ok(())
    }
}

fn synced() -> AssetStates {
    AssetState::Local | AssetState::Synced
}

impl VersionControlBackend for ScriptedBackend {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn supported_versions(&self) -> BTreeSet<u32> {
        self.versions.clone()
    }

    fn traits(&self) -> TraitFlags {
        BackendTrait::RequiresNetwork | BackendTrait::EnablesCheckout
    }

    fn config_fields(&self) -> Vec<ConfigField> {
        vec![ConfigField::new(
            "server",
            "Server",
            "Server address",
            "localhost",
            FieldFlags::empty(),
        )]
    }

    fn online_commands(&self) -> CommandFlags {
        VcsCommand::Checkout | VcsCommand::Submit
    }

    fn connect(&mut self, _session: &mut Session) -> BackendResult<()> {
        self.calls.push("connect");
        if self.reachable {
            self.connected = true;
            Ok(())
        } else {
            Err(BackendError::connection_lost("server unreachable"))
        }
    }

    fn disconnect(&mut self, _session: &mut Session) {
        self.calls.push("disconnect");
        self.connected = false;
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn add(&mut self, _session: &mut Session, assets: &mut VersionedAssetList) -> BackendResult<()> {
        self.settle("add", assets, AssetState::Local | AssetState::AddedLocal)
    }

    fn checkout(
        &mut self,
        session: &mut Session,
        assets: &mut VersionedAssetList,
    ) -> BackendResult<()> {
        let remote = self.remote_checkouts.clone();
        self.settle("checkout", assets, AssetState::Local | AssetState::CheckedOutLocal)?;
        for asset in assets.iter_mut() {
            if let Some(user) = remote.get(asset.path()) {
                asset.set_state(
                    AssetState::Local
                        | AssetState::CheckedOutRemote
                        | AssetState::Conflicted
                        | AssetState::Error,
                );
                session.add_status(StatusItem::error(format!(
                    "'{}' is checked out by {user}",
                    asset.path()
                )));
            }
        }
        Ok(())
    }

    fn download(
        &mut self,
        _session: &mut Session,
        _target_dir: &str,
        _revisions: &ChangelistRevisions,
        assets: &mut VersionedAssetList,
    ) -> BackendResult<()> {
        self.settle("download", assets, synced())
    }

    fn get_latest(
        &mut self,
        _session: &mut Session,
        assets: &mut VersionedAssetList,
    ) -> BackendResult<()> {
        self.settle("get-latest", assets, synced())
    }

    fn revert(
        &mut self,
        _session: &mut Session,
        assets: &mut VersionedAssetList,
    ) -> BackendResult<()> {
        self.settle("revert", assets, synced())
    }

    fn resolve(
        &mut self,
        _session: &mut Session,
        assets: &mut VersionedAssetList,
    ) -> BackendResult<()> {
        self.settle("resolve", assets, synced())
    }

    fn remove(
        &mut self,
        _session: &mut Session,
        assets: &mut VersionedAssetList,
    ) -> BackendResult<()> {
        self.settle("delete", assets, AssetStates::from(AssetState::DeletedLocal))
    }

    fn move_assets(
        &mut self,
        _session: &mut Session,
        _from: &VersionedAssetList,
        to: &mut VersionedAssetList,
    ) -> BackendResult<()> {
        self.settle("move", to, AssetState::Local | AssetState::MovedLocal)
    }

    fn lock(&mut self, _session: &mut Session, assets: &mut VersionedAssetList) -> BackendResult<()> {
        self.settle("lock", assets, AssetState::Local | AssetState::LockedLocal)
    }

    fn unlock(
        &mut self,
        _session: &mut Session,
        assets: &mut VersionedAssetList,
    ) -> BackendResult<()> {
        self.settle("unlock", assets, synced())
    }

    fn change_or_move(
        &mut self,
        _session: &mut Session,
        _revision: &ChangelistRevision,
        assets: &mut VersionedAssetList,
    ) -> BackendResult<()> {
        self.settle("change-move", assets, AssetState::Local | AssetState::CheckedOutLocal)
    }

    fn submit(
        &mut self,
        _session: &mut Session,
        _changelist: &Changelist,
        assets: &mut VersionedAssetList,
    ) -> BackendResult<()> {
        self.settle("submit", assets, synced())
    }

    fn status(
        &mut self,
        _session: &mut Session,
        assets: &mut VersionedAssetList,
        recursive: bool,
    ) -> BackendResult<()> {
        let call = if recursive { "status-recursive" } else { "status" };
        self.settle(call, assets, synced())
    }

    fn change_status(
        &mut self,
        _session: &mut Session,
        revision: &ChangelistRevision,
        assets: &mut VersionedAssetList,
    ) -> BackendResult<()> {
        self.calls.push("change-status");
        assets.push(VersionedAsset::with_state(
            format!("changelist-{revision}.txt"),
            AssetState::Local | AssetState::CheckedOutLocal,
        ));
        Ok(())
    }

    fn incoming_change_status(
        &mut self,
        _session: &mut Session,
        _revision: &ChangelistRevision,
        assets: &mut VersionedAssetList,
    ) -> BackendResult<()> {
        self.calls.push("incoming-change-assets");
        assets.push(VersionedAsset::with_state("incoming.txt", AssetState::OutOfSync));
        Ok(())
    }

    fn changes(&mut self, _session: &mut Session) -> BackendResult<Changes> {
        self.calls.push("changes");
        Ok(self.changelists.clone())
    }

    fn incoming_changes(&mut self, _session: &mut Session) -> BackendResult<Changes> {
        self.calls.push("incoming");
        Ok(Vec::new())
    }

    fn update_revision(
        &mut self,
        _session: &mut Session,
        revision: &ChangelistRevision,
        description: &str,
    ) -> BackendResult<String> {
        self.calls.push("change-description");
        let changelist = self
            .changelists
            .iter_mut()
            .find(|changelist| changelist.revision() == revision)
            .ok_or_else(|| BackendError::failed(format!("no changelist {revision}")))?;
        changelist.set_description(description);
        Ok(description.to_owned())
    }

    fn delete_revision(
        &mut self,
        _session: &mut Session,
        revision: &ChangelistRevision,
    ) -> BackendResult<()> {
        self.calls.push("delete-changes");
        let before = self.changelists.len();
        self.changelists
            .retain(|changelist| changelist.revision() != revision);
        if self.changelists.len() == before {
            return Err(BackendError::failed(format!("no changelist {revision}")));
        }
        Ok(())
    }

    fn revert_changes(
        &mut self,
        _session: &mut Session,
        _revision: &ChangelistRevision,
        assets: &mut VersionedAssetList,
    ) -> BackendResult<()> {
        self.settle("revert-changes", assets, synced())
    }

    fn custom_command(
        &mut self,
        _session: &mut Session,
        name: &str,
        arguments: &[String],
    ) -> BackendResult<Vec<String>> {
        self.calls.push("custom");
        match name {
            "echo" => Ok(arguments.to_vec()),
            other => Err(BackendError::unsupported(other)),
        }
    }
}


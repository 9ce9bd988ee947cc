//! Envelope tests against a mocked backend.

use std::collections::BTreeSet;

use mockall::mock;
use vcsbridge_protocol::{
    AssetState, Changelist, ChangelistRevision, ChangelistRevisions, Changes, CommandFlags,
    ConfigField, FieldFlag, FieldFlags, TraitFlags, VcsCommand, VersionedAsset,
    VersionedAssetList,
};

use super::*;
use crate::dispatch::EngineSettings;

mock! {
    Backend {}
    impl VersionControlBackend for Backend {
        fn name(&self) -> &'static str;
        fn supported_versions(&self) -> BTreeSet<u32>;
        fn traits(&self) -> TraitFlags;
        fn config_fields(&self) -> Vec<ConfigField>;
        fn online_commands(&self) -> CommandFlags;
        fn connect(&mut self, session: &mut Session) -> BackendResult<()>;
        fn disconnect(&mut self, session: &mut Session);
        fn is_connected(&self) -> bool;
        fn login(&mut self, session: &mut Session) -> BackendResult<()>;
        fn add(&mut self, session: &mut Session, assets: &mut VersionedAssetList)
            -> BackendResult<()>;
        fn checkout(&mut self, session: &mut Session, assets: &mut VersionedAssetList)
            -> BackendResult<()>;
        fn download(
            &mut self,
            session: &mut Session,
            target_dir: &str,
            revisions: &ChangelistRevisions,
            assets: &mut VersionedAssetList,
        ) -> BackendResult<()>;
        fn get_latest(&mut self, session: &mut Session, assets: &mut VersionedAssetList)
            -> BackendResult<()>;
        fn revert(&mut self, session: &mut Session, assets: &mut VersionedAssetList)
            -> BackendResult<()>;
        fn resolve(&mut self, session: &mut Session, assets: &mut VersionedAssetList)
            -> BackendResult<()>;
        fn remove(&mut self, session: &mut Session, assets: &mut VersionedAssetList)
            -> BackendResult<()>;
        fn move_assets(
            &mut self,
            session: &mut Session,
            from: &VersionedAssetList,
            to: &mut VersionedAssetList,
        ) -> BackendResult<()>;
        fn lock(&mut self, session: &mut Session, assets: &mut VersionedAssetList)
            -> BackendResult<()>;
        fn unlock(&mut self, session: &mut Session, assets: &mut VersionedAssetList)
            -> BackendResult<()>;
        fn change_or_move(
            &mut self,
            session: &mut Session,
            revision: &ChangelistRevision,
            assets: &mut VersionedAssetList,
        ) -> BackendResult<()>;
        fn submit(
            &mut self,
            session: &mut Session,
            changelist: &Changelist,
            assets: &mut VersionedAssetList,
        ) -> BackendResult<()>;
        fn status(
            &mut self,
            session: &mut Session,
            assets: &mut VersionedAssetList,
            recursive: bool,
        ) -> BackendResult<()>;
        fn change_status(
            &mut self,
            session: &mut Session,
            revision: &ChangelistRevision,
            assets: &mut VersionedAssetList,
        ) -> BackendResult<()>;
        fn incoming_change_status(
            &mut self,
            session: &mut Session,
            revision: &ChangelistRevision,
            assets: &mut VersionedAssetList,
        ) -> BackendResult<()>;
        fn changes(&mut self, session: &mut Session) -> BackendResult<Changes>;
        fn incoming_changes(&mut self, session: &mut Session) -> BackendResult<Changes>;
        fn update_revision(
            &mut self,
            session: &mut Session,
            revision: &ChangelistRevision,
            description: &str,
        ) -> BackendResult<String>;
        fn delete_revision(
            &mut self,
            session: &mut Session,
            revision: &ChangelistRevision,
        ) -> BackendResult<()>;
        fn revert_changes(
            &mut self,
            session: &mut Session,
            revision: &ChangelistRevision,
            assets: &mut VersionedAssetList,
        ) -> BackendResult<()>;
    }
}

fn backend_with_fields(fields: Vec<ConfigField>) -> MockBackend {
    let mut backend = MockBackend::new();
    backend.expect_name().return_const("mock");
    backend
        .expect_config_fields()
        .returning(move || fields.clone());
    backend
}

fn engine(backend: MockBackend, reconnect_attempts: u32) -> DispatchEngine<MockBackend> {
    DispatchEngine::new(backend, EngineSettings { reconnect_attempts })
}

fn assets(paths: &[&str]) -> VersionedAssetList {
    paths.iter().copied().map(VersionedAsset::new).collect()
}

const CHECKOUT: Command = Command::Vcs(VcsCommand::Checkout);

fn error_messages(engine: &DispatchEngine<MockBackend>) -> Vec<&str> {
    engine
        .session
        .status()
        .items()
        .iter()
        .filter(|item| item.is_error())
        .map(|item| item.message())
        .collect()
}

#[test]
fn reconnect_tries_each_attempt_once() {
    let mut backend = backend_with_fields(Vec::new());
    backend
        .expect_connect()
        .times(3)
        .returning(|_| Err(BackendError::connection_lost("refused")));
    backend.expect_checkout().never();
    let mut engine = engine(backend, 3);
    let mut list = assets(&["foo.txt"]);

    engine.run_batch(CHECKOUT, &mut list, MockBackend::checkout);

    assert_eq!(
        error_messages(&engine),
        ["checkout: not run: connection to backend lost: refused"]
    );
    assert!(list[0].state().contains(AssetState::Error));
    assert!(!list[0].is_pending());
}

#[test]
fn handshake_skips_connect_when_already_connected() {
    let mut backend = backend_with_fields(Vec::new());
    backend.expect_connect().once().returning(|_| Ok(()));
    backend.expect_is_connected().return_const(true);
    backend.expect_login().times(2).returning(|_| Ok(()));
    let mut engine = engine(backend, 1);

    engine.handshake().expect("first login");
    engine.handshake().expect("second login");

    assert!(engine.session.is_online());
}

#[test]
fn handshake_reconnects_when_backend_dropped_the_connection() {
    let mut backend = backend_with_fields(Vec::new());
    backend.expect_connect().times(2).returning(|_| Ok(()));
    backend.expect_is_connected().return_const(false);
    backend.expect_login().times(2).returning(|_| Ok(()));
    let mut engine = engine(backend, 1);

    engine.handshake().expect("first login");
    engine.handshake().expect("second login");
}

#[test]
fn missing_required_field_blocks_the_handshake() {
    let mut backend = backend_with_fields(vec![ConfigField::new(
        "user",
        "User",
        "Account name",
        "",
        FieldFlag::Required,
    )]);
    backend.expect_connect().never();
    let mut engine = engine(backend, 1);

    let error = engine.handshake().expect_err("user is required");

    assert_eq!(error.to_string(), "missing required configuration: user");
    assert!(!engine.session.is_online());
}

#[test]
fn required_field_with_value_allows_the_handshake() {
    let mut backend = backend_with_fields(vec![ConfigField::new(
        "user",
        "User",
        "Account name",
        "",
        FieldFlags::from(FieldFlag::Required),
    )]);
    backend.expect_connect().once().returning(|_| Ok(()));
    backend.expect_login().once().returning(|_| Ok(()));
    let mut engine = engine(backend, 1);
    engine
        .session
        .fields_mut()
        .set("user", "alice")
        .expect("declared field");

    engine.handshake().expect("handshake");

    assert!(engine.session.is_online());
}

#[test]
fn connection_loss_goes_offline_once() {
    let mut backend = backend_with_fields(Vec::new());
    backend.expect_connect().once().returning(|_| Ok(()));
    backend.expect_login().returning(|_| Ok(()));
    backend
        .expect_checkout()
        .once()
        .returning(|session, _| {
            session.notify_offline("socket closed");
            Err(BackendError::connection_lost("socket closed"))
        });
    let mut engine = engine(backend, 1);
    let mut list = assets(&["foo.txt", "bar.txt"]);

    engine.run_batch(CHECKOUT, &mut list, MockBackend::checkout);

    assert!(!engine.session.is_online());
    let warnings = engine
        .session
        .status()
        .items()
        .iter()
        .filter(|item| item.message().starts_with("offline:"))
        .count();
    assert_eq!(warnings, 1);
    assert!(list.iter().all(|asset| asset.state().contains(AssetState::Error)));
}

#[test]
fn assets_left_pending_fail_individually() {
    let mut backend = backend_with_fields(Vec::new());
    backend.expect_connect().returning(|_| Ok(()));
    backend.expect_login().returning(|_| Ok(()));
    backend.expect_checkout().once().returning(|_, assets| {
        assets[0].set_state(AssetState::Local | AssetState::CheckedOutLocal);
        Ok(())
    });
    let mut engine = engine(backend, 1);
    let mut list = assets(&["foo.txt", "bar.txt"]);

    engine.run_batch(CHECKOUT, &mut list, MockBackend::checkout);

    assert!(list[0].state().contains(AssetState::CheckedOutLocal));
    assert!(list[1].state().contains(AssetState::Error));
    assert_eq!(
        error_messages(&engine),
        ["checkout: no result for 'bar.txt'"]
    );
}

#[test]
fn changed_list_length_is_reported() {
    let mut backend = backend_with_fields(Vec::new());
    backend.expect_connect().returning(|_| Ok(()));
    backend.expect_login().returning(|_| Ok(()));
    backend.expect_checkout().once().returning(|_, assets| {
        assets.clear();
        Ok(())
    });
    let mut engine = engine(backend, 1);
    let mut list = assets(&["foo.txt"]);

    engine.run_batch(CHECKOUT, &mut list, MockBackend::checkout);

    assert_eq!(
        error_messages(&engine),
        ["checkout: backend returned 0 assets for 1 requested"]
    );
}

#[test]
fn failed_query_returns_none_and_records_error() {
    let mut backend = backend_with_fields(Vec::new());
    backend.expect_connect().returning(|_| Ok(()));
    backend.expect_login().returning(|_| Ok(()));
    backend
        .expect_changes()
        .once()
        .returning(|_| Err(BackendError::failed("depot locked")));
    let mut engine = engine(backend, 1);

    let changes = engine.run_query(Command::Vcs(VcsCommand::Changes), MockBackend::changes);

    assert!(changes.is_none());
    assert_eq!(error_messages(&engine), ["changes: depot locked"]);
    assert!(engine.session.is_online());
}

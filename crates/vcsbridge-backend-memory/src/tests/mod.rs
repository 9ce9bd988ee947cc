//! Tests driving the in-memory backend through the dispatch engine.


use vcsbridge_protocol::{
    AssetStates, BridgeMessage, Changes, CommandResponse, HostRequest, ResponsePayload,
    VersionedAsset, VersionedAssetList,
};
use vcsbridged::{DispatchEngine, EngineSettings, Outcome};

use crate::MemoryBackend;

pub(crate) struct Harness {
    pub(crate) engine: DispatchEngine<MemoryBackend>,
}

impl Harness {
    pub(crate) fn new() -> Self {
        Self {
            engine: DispatchEngine::new(MemoryBackend::new(), EngineSettings::default()),
        }
    }

    /// A harness logged in as `alice` with `paths` seeded.
    pub(crate) fn logged_in(paths: &[&str]) -> Self {
        let mut harness = Self::new();
        harness.send(HostRequest::new("set-config").with_arguments(["user", "alice"]));
        let login = harness.send(HostRequest::new("login"));
        assert_eq!(login.messages.first(), Some(&BridgeMessage::Online));
        if !paths.is_empty() {
            harness.custom(&[&["seed"][..], paths].concat());
        }
        harness
    }

    pub(crate) fn send(&mut self, request: HostRequest) -> Outcome {
        let line = request.to_line().expect("serialise request");
        self.engine.process(&line)
    }

    pub(crate) fn respond(&mut self, request: HostRequest) -> CommandResponse {
        self.send(request).response().expect("response").clone()
    }

    pub(crate) fn custom(&mut self, arguments: &[&str]) -> Vec<String> {
        let response =
            self.respond(HostRequest::new("custom").with_arguments(arguments.iter().copied()));
        assert!(response.success, "custom {arguments:?} failed: {response:?}");
        match response.payload {
            ResponsePayload::Custom { output } => output,
            other => panic!("expected custom output, got {other:?}"),
        }
    }

    pub(crate) fn on_assets(&mut self, command: &str, paths: &[&str]) -> CommandResponse {
        self.respond(HostRequest::new(command).with_assets(list(paths)))
    }

    pub(crate) fn changes(&mut self, command: &str) -> Changes {
        match self.respond(HostRequest::new(command)).payload {
            ResponsePayload::Changes { changes } => changes,
            other => panic!("expected changes, got {other:?}"),
        }
    }

    pub(crate) fn state_of(&self, path: &str) -> AssetStates {
        self.engine.backend().state_of(path)
    }
}

pub(crate) fn list(paths: &[&str]) -> VersionedAssetList {
    paths.iter().copied().map(VersionedAsset::new).collect()
}

pub(crate) fn assets(response: &CommandResponse) -> &VersionedAssetList {
    match &response.payload {
        ResponsePayload::Assets { assets } => assets,
        other => panic!("expected assets, got {other:?}"),
    }
}

pub(crate) fn errors(response: &CommandResponse) -> Vec<&str> {
    response
        .status
        .iter()
        .filter(|item| item.is_error())
        .map(|item| item.message())
        .collect()
}

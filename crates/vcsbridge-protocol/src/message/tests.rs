//! Unit tests for wire messages.

use serde_json::json;

use super::*;
use crate::asset::{AssetState, VersionedAsset};

#[test]
fn parses_minimal_request() {
    let request = HostRequest::parse(r#"{"command":"exit"}"#).expect("parse minimal");
    assert_eq!(request, HostRequest::new("exit"));
}

#[test]
fn parses_full_request() {
    let line = r#"{"command":"move","arguments":["-f"],"assets":[{"path":"a.txt","state":1}],
        "targets":[{"path":"b.txt"}],"revision":"12","revisions":["10","11"],
        "description":"rename","target_dir":"/tmp/out"}"#
        .replace('\n', "");
    let request = HostRequest::parse(&line).expect("parse full");

    assert_eq!(request.command, "move");
    assert_eq!(request.arguments, vec!["-f"]);
    assert_eq!(request.assets, vec![VersionedAsset::with_state("a.txt", AssetState::Local)]);
    assert_eq!(request.targets, vec![VersionedAsset::new("b.txt")]);
    assert_eq!(request.revision, Some(ChangelistRevision::new("12")));
    assert_eq!(request.revisions.len(), 2);
    assert_eq!(request.description.as_deref(), Some("rename"));
    assert_eq!(request.target_dir.as_deref(), Some("/tmp/out"));
}

#[test]
fn trims_line_terminator() {
    let request = HostRequest::parse("{\"command\":\"status\"}  \r\n").expect("parse");
    assert_eq!(request.command, "status");
}

#[test]
fn rejects_blank_lines() {
    let error = HostRequest::parse("  \n").expect_err("blank");
    assert!(matches!(error, ProtocolError::Malformed { source: None, .. }));
}

#[test]
fn rejects_invalid_json() {
    let error = HostRequest::parse("checkout foo.txt").expect_err("not json");
    assert!(matches!(error, ProtocolError::Malformed { source: Some(_), .. }));
}

#[test]
fn rejects_missing_command() {
    let error = HostRequest::parse(r#"{"arguments":[]}"#).expect_err("no command");
    assert!(matches!(error, ProtocolError::Malformed { .. }));
}

#[test]
fn revision_defaults_to_default_changelist() {
    let request = HostRequest::new("change-status");
    assert!(request.revision_or_default().is_default());
    let request = request.with_revision(ChangelistRevision::new("7"));
    assert_eq!(request.revision_or_default().as_str(), "7");
}

#[test]
fn request_line_omits_empty_fields() {
    let line = HostRequest::new("login").to_line().expect("serialise");
    assert_eq!(line, r#"{"command":"login"}"#);
}

#[test]
fn connectivity_messages_are_tagged_by_kind() {
    assert_eq!(
        serde_json::to_value(BridgeMessage::Online).expect("serialise"),
        json!({"kind": "online"})
    );
    assert_eq!(
        serde_json::to_value(BridgeMessage::offline("server unreachable")).expect("serialise"),
        json!({"kind": "offline", "reason": "server unreachable"})
    );
}

#[test]
fn response_flattens_into_message() {
    let mut status = VcsStatus::new();
    status.add(StatusItem::error("bar.txt is checked out by bob"));
    let response = CommandResponse::from_status(
        "checkout",
        &status,
        ResponsePayload::Assets {
            assets: vec![VersionedAsset::with_state("bar.txt", AssetState::Error)],
        },
    );
    let value = serde_json::to_value(BridgeMessage::from(response)).expect("serialise");

    assert_eq!(
        value,
        json!({
            "kind": "response",
            "command": "checkout",
            "success": false,
            "status": [{"severity": "error", "message": "bar.txt is checked out by bob"}],
            "payload": {"type": "assets", "assets": [{"path": "bar.txt", "state": 262_144}]}
        })
    );
}

#[test]
fn success_follows_error_items() {
    let mut status = VcsStatus::new();
    status.add(StatusItem::warning("slow"));
    let response = CommandResponse::from_status("status", &status, ResponsePayload::Empty);
    assert!(response.success);
    assert_eq!(response.status.len(), 1);
}

#[test]
fn payload_variants_use_snake_case_tags() {
    let value = serde_json::to_value(ResponsePayload::ConfigFields {
        fields: ConfigFields::default(),
    })
    .expect("serialise");
    assert_eq!(value, json!({"type": "config_fields", "fields": []}));
    assert_eq!(
        serde_json::to_value(ResponsePayload::Empty).expect("serialise"),
        json!({"type": "empty"})
    );
}

#[test]
fn messages_read_back() {
    let message = BridgeMessage::from(CommandResponse::from_status(
        "config",
        &VcsStatus::new(),
        ResponsePayload::Version { version: 2 },
    ));
    let line = serde_json::to_string(&message).expect("serialise");
    let back: BridgeMessage = serde_json::from_str(&line).expect("deserialise");
    assert_eq!(back, message);
    assert_eq!(
        back.as_response().map(|response| &response.payload),
        Some(&ResponsePayload::Version { version: 2 })
    );
}

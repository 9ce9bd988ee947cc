//! Unit tests for the capability bundle.

use serde_json::json;

use super::*;
use crate::command::VcsCommand;

fn capabilities(overlays: Overlays) -> Capabilities {
    Capabilities {
        fields: Vec::new(),
        supported_commands: CommandFlags::from(VcsCommand::Status),
        online_commands: CommandFlags::empty(),
        traits: TraitFlags::empty(),
        overlays,
    }
}

#[test]
fn overlays_serialise_as_an_object_keyed_by_state() {
    let overlays = Overlays::from([
        (AssetState::LockedRemote, "locked".to_owned()),
        (AssetState::CheckedOutRemote, "theirs".to_owned()),
    ]);

    let value = serde_json::to_value(capabilities(overlays)).expect("serialise");

    assert_eq!(
        value["overlays"],
        json!({"checked-out-remote": "theirs", "locked-remote": "locked"})
    );
}

#[test]
fn a_state_keeps_only_its_latest_icon() {
    let mut overlays = Overlays::new();
    overlays.insert(AssetState::Conflicted, "first".to_owned());
    overlays.insert(AssetState::Conflicted, "second".to_owned());

    assert_eq!(overlays.len(), 1);
    assert_eq!(
        overlays.get(&AssetState::Conflicted).map(String::as_str),
        Some("second")
    );
}

#[test]
fn duplicate_states_on_the_wire_collapse_to_one_entry() {
    let line = r#"{"fields":[],"supported_commands":0,"online_commands":0,"traits":0,
        "overlays":{"conflicted":"a","conflicted":"b"}}"#
        .replace('\n', "");

    let parsed: Capabilities = serde_json::from_str(&line).expect("parse");

    assert_eq!(parsed.overlays.len(), 1);
}

#[test]
fn missing_overlays_default_to_empty() {
    let parsed: Capabilities = serde_json::from_str(
        r#"{"fields":[],"supported_commands":0,"online_commands":0,"traits":0}"#,
    )
    .expect("parse");

    assert!(parsed.overlays.is_empty());
}

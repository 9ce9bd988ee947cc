//! Unit tests for status aggregation.

use super::*;

#[test]
fn add_chains_and_preserves_order() {
    let mut status = VcsStatus::new();
    status
        .add(StatusItem::info("connecting"))
        .add(StatusItem::error("bar.txt is locked"))
        .add(StatusItem::verbose("done"));

    let messages: Vec<_> = status.items().iter().map(StatusItem::message).collect();
    assert_eq!(messages, vec!["connecting", "bar.txt is locked", "done"]);
}

#[test]
fn has_errors_only_for_error_severity() {
    let mut status = VcsStatus::new();
    status.add(StatusItem::warning("slow server"));
    assert!(!status.has_errors());

    status.add(StatusItem::error("failed"));
    assert!(status.has_errors());
    assert_eq!(status.error_count(), 1);
}

#[test]
fn clear_empties_the_aggregate() {
    let mut status = VcsStatus::new();
    status.add(StatusItem::error("failed"));
    status.clear();
    assert!(status.is_empty());
    assert!(!status.has_errors());
}

#[test]
fn severity_serialises_in_snake_case() {
    let json = serde_json::to_string(&StatusItem::warning("careful")).expect("serialise");
    assert_eq!(json, r#"{"severity":"warning","message":"careful"}"#);
}

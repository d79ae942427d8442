//! Wire-payload shape validation: the five keys, each named explicitly
//! when wrong.

use serde_json::json;

use quill_core::errors::QuillError;
use quill_core::model::{Document, EntityKind};

fn minimal_payload() -> serde_json::Value {
    json!({
        "resources": [],
        "questions": [],
        "subQuestions": [],
        "answers": [],
        "metadata": { "version": "1.0", "lastSync": null, "owner": "t" }
    })
}

#[test]
fn accepts_well_formed_payload() {
    assert!(Document::validate_shape(&minimal_payload()).is_ok());
}

#[test]
fn missing_keys_are_each_named() {
    let payload = json!({ "resources": [] });
    let err = Document::validate_shape(&payload).unwrap_err();
    let QuillError::Shape { problems } = err else {
        panic!("expected shape error");
    };
    for key in ["questions", "subQuestions", "answers", "metadata"] {
        assert!(
            problems.iter().any(|p| p.contains(key)),
            "missing `{key}` not reported: {problems:?}"
        );
    }
}

#[test]
fn wrong_container_kind_is_named() {
    let mut payload = minimal_payload();
    payload["subQuestions"] = json!({});
    payload["metadata"] = json!([]);

    let QuillError::Shape { problems } = Document::validate_shape(&payload).unwrap_err() else {
        panic!("expected shape error");
    };
    assert!(problems.iter().any(|p| p.contains("subQuestions") && p.contains("array")));
    assert!(problems.iter().any(|p| p.contains("metadata") && p.contains("object")));
}

#[test]
fn unexpected_key_is_rejected() {
    let mut payload = minimal_payload();
    payload["extras"] = json!([]);

    let QuillError::Shape { problems } = Document::validate_shape(&payload).unwrap_err() else {
        panic!("expected shape error");
    };
    assert!(problems.iter().any(|p| p.contains("extras")));
}

#[test]
fn non_object_payload_is_rejected() {
    assert!(Document::validate_shape(&json!([1, 2, 3])).is_err());
    assert!(Document::validate_shape(&json!("nope")).is_err());
}

#[test]
fn from_payload_round_trips() {
    let payload = test_payload_with_records();
    let doc = Document::from_payload(&payload).unwrap();
    assert_eq!(doc.count(EntityKind::Resource), 1);
    assert_eq!(doc.count(EntityKind::BigQuestion), 1);

    let back = doc.to_payload().unwrap();
    assert!(Document::validate_shape(&back).is_ok());
}

#[test]
fn upsert_and_remove_by_id() {
    let mut doc = Document::from_payload(&test_payload_with_records()).unwrap();

    let replacement = json!({
        "id": "res-1",
        "title": "Renamed",
        "created_at": "2026-01-01T00:00:00Z",
        "updated_at": "2026-01-02T00:00:00Z"
    });
    doc.upsert(EntityKind::Resource, &replacement).unwrap();
    assert_eq!(doc.count(EntityKind::Resource), 1);
    assert_eq!(doc.resources[0].title, "Renamed");

    assert!(doc.remove(EntityKind::Resource, "res-1"));
    assert!(!doc.remove(EntityKind::Resource, "res-1"));
    assert_eq!(doc.count(EntityKind::Resource), 0);
}

fn test_payload_with_records() -> serde_json::Value {
    json!({
        "resources": [{
            "id": "res-1",
            "title": "A paper",
            "created_at": "2026-01-01T00:00:00Z",
            "updated_at": "2026-01-01T00:00:00Z"
        }],
        "questions": [{
            "id": "bq-1",
            "title": "A question",
            "status": "unsolved",
            "sub_questions": [],
            "created_at": "2026-01-01T00:00:00Z",
            "updated_at": "2026-01-01T00:00:00Z"
        }],
        "subQuestions": [],
        "answers": [],
        "metadata": { "version": "1.0", "lastSync": null, "owner": "t" }
    })
}

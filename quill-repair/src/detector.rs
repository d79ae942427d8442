//! Detector — schema and referential-integrity validation over the raw
//! document.
//!
//! Works on `serde_json::Value` rather than the typed model on purpose:
//! the records being checked are exactly the ones strict deserialization
//! would reject.

use std::collections::HashSet;

use chrono::Utc;
use serde_json::Value;

use quill_core::errors::QuillResult;
use quill_core::model::{DetectionResult, Document, EntityKind, Severity, ValidationError};
use quill_core::schema::{schema_for, validate_record, FieldKind};

fn record_id(record: &Value) -> String {
    record
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or("(no id)")
        .to_string()
}

fn collection<'a>(document: &'a Value, kind: EntityKind) -> &'a [Value] {
    document
        .get(kind.collection_key())
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Validate a single raw record in the context of a document: schema
/// violations plus dangling references. Used by the full detection pass
/// and by the repairer to decide isolation.
pub fn validate_in_context(
    kind: EntityKind,
    record: &Value,
    document: &Value,
) -> Vec<ValidationError> {
    let schema = schema_for(kind);
    let mut errors = validate_record(&schema, record);

    for spec in schema.fields {
        let Some(target_kind) = spec.references else {
            continue;
        };
        let targets: HashSet<&str> = collection(document, target_kind)
            .iter()
            .filter_map(|r| r.get("id").and_then(Value::as_str))
            .collect();
        let Some(value) = record.get(spec.name) else {
            continue; // Missing field is already a schema violation.
        };

        let mut dangling = |id: &str, errors: &mut Vec<ValidationError>| {
            if !targets.contains(id) {
                errors.push(ValidationError {
                    entity_kind: kind,
                    entity_id: record_id(record),
                    field: spec.name.to_string(),
                    message: format!("`{}` references missing {target_kind} `{id}`", spec.name),
                    severity: Severity::Critical,
                    auto_repairable: false,
                });
            }
        };

        match spec.kind {
            FieldKind::Str => {
                if let Some(id) = value.as_str() {
                    dangling(id, &mut errors);
                }
            }
            FieldKind::StrList => {
                if let Some(items) = value.as_array() {
                    for id in items.iter().filter_map(Value::as_str) {
                        dangling(id, &mut errors);
                    }
                }
            }
            _ => {}
        }
    }
    errors
}

/// Run every entity record through its schema and the referential checks.
/// Produces one [`ValidationError`] per violation.
pub fn detect_errors(document: &Value) -> QuillResult<DetectionResult> {
    // The shape check guards the rest; a document without the five
    // containers cannot be walked.
    Document::validate_shape(document)?;

    let mut errors = Vec::new();
    let mut records_checked = 0;

    for kind in EntityKind::ALL {
        for record in collection(document, kind) {
            records_checked += 1;
            errors.extend(validate_in_context(kind, record, document));
        }
    }

    tracing::debug!(
        records = records_checked,
        errors = errors.len(),
        "detection pass complete"
    );
    Ok(DetectionResult {
        errors,
        records_checked,
        detected_at: Some(Utc::now()),
    })
}

//! Analyzer — turns detected errors into a repair plan.
//!
//! One [`RepairAction`] per fixable error. Auto-applicability follows the
//! [`RepairPolicy`]: a fix qualifies only when it supplies a conservative,
//! content-neutral default; anything that invents content or removes a
//! relationship requires explicit selection.

use std::collections::{HashMap, HashSet, VecDeque};

use serde_json::Value;

use quill_core::config::RepairPolicy;
use quill_core::model::{
    DataLossEstimate, EntityKind, RepairAction, RepairOperation, RepairPlan, Severity,
    ValidationError,
};
use quill_core::schema::{schema_for, FieldKind};

/// Action ids are derived from the target and operation, so two analyze
/// passes over the same document produce the same ids and a selection
/// made against one plan is valid against the other.
fn action_id(error: &ValidationError, operation: &RepairOperation) -> String {
    let suffix = match operation {
        RepairOperation::SetField { field, .. } => format!("set:{field}"),
        RepairOperation::PruneReference { field, target_id } => {
            format!("prune:{field}:{target_id}")
        }
        RepairOperation::RemoveRecord => "remove".to_string(),
    };
    format!("{}:{}:{suffix}", error.entity_kind, error.entity_id)
}

fn action(
    error: &ValidationError,
    operation: RepairOperation,
    auto_applicable: bool,
    description: String,
) -> RepairAction {
    RepairAction {
        id: action_id(error, &operation),
        entity_kind: error.entity_kind,
        entity_id: error.entity_id.clone(),
        operation,
        auto_applicable,
        description,
    }
}

/// Dangling ids for one record's reference-list field, in list order.
/// Detection emits one error per dangling id in the same order, so the
/// analyzer pairs them up by popping.
fn dangling_ids(document: &Value, error: &ValidationError) -> VecDeque<String> {
    let record = document
        .get(error.entity_kind.collection_key())
        .and_then(Value::as_array)
        .and_then(|list| {
            list.iter()
                .find(|r| r.get("id").and_then(Value::as_str) == Some(error.entity_id.as_str()))
        });
    let Some(ids) = record
        .and_then(|r| r.get(&error.field))
        .and_then(Value::as_array)
    else {
        return VecDeque::new();
    };

    let target_kind = schema_for(error.entity_kind)
        .fields
        .iter()
        .find(|f| f.name == error.field)
        .and_then(|f| f.references);
    let Some(target_kind) = target_kind else {
        return VecDeque::new();
    };
    let targets: HashSet<&str> = document
        .get(target_kind.collection_key())
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(|r| r.get("id").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();

    ids.iter()
        .filter_map(Value::as_str)
        .filter(|id| !targets.contains(id))
        .map(String::from)
        .collect()
}

/// Group errors by entity and emit one action per fixable error.
pub fn analyze_errors(
    errors: &[ValidationError],
    document: &Value,
    policy: &RepairPolicy,
) -> RepairPlan {
    let mut actions: Vec<RepairAction> = Vec::new();
    let mut pending_dangling: HashMap<(EntityKind, String, String), VecDeque<String>> =
        HashMap::new();

    for error in errors {
        let schema = schema_for(error.entity_kind);
        let Some(spec) = schema.fields.iter().find(|f| f.name == error.field) else {
            continue; // Record-level violation; only isolation can handle it.
        };

        if error.severity == Severity::Critical {
            // Referential error: the relationship itself is broken.
            let act = match spec.kind {
                FieldKind::StrList => {
                    let key = (
                        error.entity_kind,
                        error.entity_id.clone(),
                        error.field.clone(),
                    );
                    let queue = pending_dangling
                        .entry(key)
                        .or_insert_with(|| dangling_ids(document, error));
                    let Some(target_id) = queue.pop_front() else {
                        continue;
                    };
                    action(
                        error,
                        RepairOperation::PruneReference {
                            field: error.field.clone(),
                            target_id: target_id.clone(),
                        },
                        policy.auto_prune_references,
                        format!(
                            "remove dangling reference `{target_id}` from `{}`",
                            error.field
                        ),
                    )
                }
                _ => action(
                    error,
                    RepairOperation::RemoveRecord,
                    policy.auto_remove_records,
                    format!(
                        "remove {} `{}`: `{}` cannot be resolved",
                        error.entity_kind, error.entity_id, error.field
                    ),
                ),
            };
            actions.push(act);
            continue;
        }

        // Schema error: fixable when the schema carries a default.
        let Some(default) = spec.default else {
            continue;
        };
        let auto = default.is_content_neutral() && policy.auto_fill_neutral_defaults;
        let value: Value = default.materialize();
        actions.push(action(
            error,
            RepairOperation::SetField {
                field: error.field.clone(),
                value: value.clone(),
            },
            auto,
            format!("set `{}` to default {value}", error.field),
        ));
    }

    let auto_applicable_count = actions.iter().filter(|a| a.auto_applicable).count();
    let manual_count = actions.len() - auto_applicable_count;

    let estimated_data_loss = if actions
        .iter()
        .any(|a| matches!(a.operation, RepairOperation::RemoveRecord))
    {
        DataLossEstimate::Moderate
    } else if actions
        .iter()
        .any(|a| matches!(a.operation, RepairOperation::PruneReference { .. }))
    {
        DataLossEstimate::Minimal
    } else {
        DataLossEstimate::None
    };

    tracing::debug!(
        actions = actions.len(),
        auto = auto_applicable_count,
        manual = manual_count,
        ?estimated_data_loss,
        "repair plan ready"
    );
    RepairPlan {
        actions,
        auto_applicable_count,
        manual_count,
        estimated_data_loss,
    }
}

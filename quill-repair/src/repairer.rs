//! Repairer — applies selected actions to a deep copy of the document and
//! isolates whatever remains invalid.
//!
//! Each action applies independently; one failure never aborts the batch.
//! After the pass, every record still failing validation is moved out of
//! its collection into the isolated list, so the invariant holds: all
//! records remaining in the four entity collections validate cleanly.

use chrono::Utc;
use serde_json::Value;

use quill_core::errors::{QuillError, QuillResult};
use quill_core::model::{
    Document, EntityKind, IsolatedItem, RepairAction, RepairOperation, RepairPlan,
};

use crate::detector::validate_in_context;

/// Combined result of a repair pass. Partial progress is first-class:
/// "8 of 10 applied, 2 isolated" is representable.
#[derive(Debug, Clone)]
pub struct RepairOutcome {
    /// The repaired document.
    pub document: Value,
    /// Ids of actions that applied cleanly.
    pub applied: Vec<String>,
    /// Actions that failed, with the error that stopped each.
    pub failed: Vec<(String, String)>,
    /// Records no selected repair could save.
    pub isolated: Vec<IsolatedItem>,
}

impl RepairOutcome {
    pub fn applied_count(&self) -> usize {
        self.applied.len()
    }
}

fn find_record_mut<'a>(
    document: &'a mut Value,
    kind: EntityKind,
    id: &str,
) -> Option<&'a mut Value> {
    document
        .get_mut(kind.collection_key())?
        .as_array_mut()?
        .iter_mut()
        .find(|r| r.get("id").and_then(Value::as_str) == Some(id))
}

fn apply_action(document: &mut Value, act: &RepairAction) -> QuillResult<()> {
    match &act.operation {
        RepairOperation::SetField { field, value } => {
            let record = find_record_mut(document, act.entity_kind, &act.entity_id).ok_or_else(
                || QuillError::Repair {
                    action_id: act.id.clone(),
                    reason: format!("{} `{}` not found", act.entity_kind, act.entity_id),
                },
            )?;
            let obj = record.as_object_mut().ok_or_else(|| QuillError::Repair {
                action_id: act.id.clone(),
                reason: "record is not a JSON object".into(),
            })?;
            obj.insert(field.clone(), value.clone());
            Ok(())
        }
        RepairOperation::PruneReference { field, target_id } => {
            let record = find_record_mut(document, act.entity_kind, &act.entity_id).ok_or_else(
                || QuillError::Repair {
                    action_id: act.id.clone(),
                    reason: format!("{} `{}` not found", act.entity_kind, act.entity_id),
                },
            )?;
            let list = record
                .get_mut(field)
                .and_then(Value::as_array_mut)
                .ok_or_else(|| QuillError::Repair {
                    action_id: act.id.clone(),
                    reason: format!("field `{field}` is not an array"),
                })?;
            list.retain(|v| v.as_str() != Some(target_id.as_str()));
            Ok(())
        }
        RepairOperation::RemoveRecord => {
            let list = document
                .get_mut(act.entity_kind.collection_key())
                .and_then(Value::as_array_mut)
                .ok_or_else(|| QuillError::Repair {
                    action_id: act.id.clone(),
                    reason: "collection missing".into(),
                })?;
            let before = list.len();
            list.retain(|r| r.get("id").and_then(Value::as_str) != Some(act.entity_id.as_str()));
            if list.len() == before {
                return Err(QuillError::Repair {
                    action_id: act.id.clone(),
                    reason: format!("{} `{}` not found", act.entity_kind, act.entity_id),
                });
            }
            Ok(())
        }
    }
}

/// Apply the selected actions from a plan onto a deep copy of `document`.
pub fn apply_repairs(
    document: &Value,
    plan: &RepairPlan,
    selected_action_ids: &[String],
) -> QuillResult<RepairOutcome> {
    Document::validate_shape(document)?;
    let mut repaired = document.clone();

    let mut applied = Vec::new();
    let mut failed = Vec::new();
    for act in plan
        .actions
        .iter()
        .filter(|a| selected_action_ids.contains(&a.id))
    {
        match apply_action(&mut repaired, act) {
            Ok(()) => applied.push(act.id.clone()),
            Err(err) => {
                tracing::warn!(action_id = %act.id, error = %err, "repair action failed");
                failed.push((act.id.clone(), err.to_string()));
            }
        }
    }

    // Isolation: pull out anything still invalid. Runs to a fixpoint
    // because removing a record can leave a reference in an
    // already-checked record dangling.
    let mut isolated = Vec::new();
    loop {
        let mut changed = false;
        for kind in EntityKind::ALL {
            let records: Vec<Value> = repaired
                .get(kind.collection_key())
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();

            let mut keep = Vec::with_capacity(records.len());
            for record in records {
                let residual = validate_in_context(kind, &record, &repaired);
                if residual.is_empty() {
                    keep.push(record);
                } else {
                    changed = true;
                    isolated.push(IsolatedItem {
                        entity_kind: kind,
                        entity_id: record
                            .get("id")
                            .and_then(Value::as_str)
                            .unwrap_or("(no id)")
                            .to_string(),
                        data: record,
                        residual_errors: residual,
                        isolated_at: Utc::now(),
                    });
                }
            }
            if let Some(slot) = repaired.get_mut(kind.collection_key()) {
                *slot = Value::Array(keep);
            }
        }
        if !changed {
            break;
        }
    }

    tracing::info!(
        applied = applied.len(),
        failed = failed.len(),
        isolated = isolated.len(),
        "repair pass complete"
    );
    Ok(RepairOutcome {
        document: repaired,
        applied,
        failed,
        isolated,
    })
}

//! Types produced and consumed by the data repair pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::entity::EntityKind;

/// How serious a detected violation is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Recoverable with a content-neutral default.
    Warning,
    /// Structural problem in a single record.
    Error,
    /// Breaks referential integrity across records.
    Critical,
}

/// One schema or referential-integrity violation on one record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationError {
    pub entity_kind: EntityKind,
    pub entity_id: String,
    pub field: String,
    pub message: String,
    pub severity: Severity,
    #[serde(rename = "autoRepairable")]
    pub auto_repairable: bool,
}

/// Everything the detector found in one pass over a document snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectionResult {
    pub errors: Vec<ValidationError>,
    pub records_checked: usize,
    pub detected_at: Option<DateTime<Utc>>,
}

impl DetectionResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Errors attributed to one record.
    pub fn errors_for(&self, kind: EntityKind, id: &str) -> Vec<&ValidationError> {
        self.errors
            .iter()
            .filter(|e| e.entity_kind == kind && e.entity_id == id)
            .collect()
    }
}

/// The concrete fix a repair action performs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RepairOperation {
    /// Set a field to the given value (conservative default or supplied fix).
    SetField { field: String, value: Value },
    /// Remove one dangling id from a reference-list field.
    PruneReference { field: String, target_id: String },
    /// Remove the record from its collection entirely.
    RemoveRecord,
}

/// One proposed fix for one validation error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairAction {
    pub id: String,
    pub entity_kind: EntityKind,
    pub entity_id: String,
    pub operation: RepairOperation,
    /// Whether this fix may run without explicit user selection.
    #[serde(rename = "autoApplicable")]
    pub auto_applicable: bool,
    pub description: String,
}

/// Qualitative estimate of how much content a plan would discard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataLossEstimate {
    /// Only content-neutral defaults are filled in.
    #[default]
    None,
    /// Relationships are pruned but no record content is lost.
    Minimal,
    /// Whole records would be removed.
    Moderate,
}

/// The analyzer's full proposal for a document snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepairPlan {
    pub actions: Vec<RepairAction>,
    pub auto_applicable_count: usize,
    pub manual_count: usize,
    #[serde(rename = "estimatedDataLoss")]
    pub estimated_data_loss: DataLossEstimate,
}

impl RepairPlan {
    /// Ids of all actions safe to run unattended.
    pub fn auto_action_ids(&self) -> Vec<String> {
        self.actions
            .iter()
            .filter(|a| a.auto_applicable)
            .map(|a| a.id.clone())
            .collect()
    }
}

/// A record pulled out of the document because no selected repair left it
/// valid. Lives outside the four entity collections until manually resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsolatedItem {
    pub entity_kind: EntityKind,
    pub entity_id: String,
    /// Original record data, untouched.
    pub data: Value,
    /// Violations still present after the selected repairs ran.
    pub residual_errors: Vec<ValidationError>,
    pub isolated_at: DateTime<Utc>,
}

//! Reporter — plain-text export of a detection result. Pure formatting,
//! no decision logic.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};

use quill_core::model::{DetectionResult, EntityKind, Severity};

/// Context lines printed in the report header.
#[derive(Debug, Clone, Default)]
pub struct ReportMeta {
    /// Human-readable data set label (e.g. owner or workspace name).
    pub label: String,
    pub generated_at: Option<DateTime<Utc>>,
}

fn severity_tag(severity: Severity) -> &'static str {
    match severity {
        Severity::Warning => "warning",
        Severity::Error => "error",
        Severity::Critical => "critical",
    }
}

/// Render a detection result as text.
pub fn export_text(detection: &DetectionResult, meta: &ReportMeta) -> String {
    let mut out = String::new();
    let generated = meta.generated_at.unwrap_or_else(Utc::now);

    let _ = writeln!(out, "Data integrity report — {}", meta.label);
    let _ = writeln!(out, "Generated: {}", generated.to_rfc3339());
    let _ = writeln!(out, "Records checked: {}", detection.records_checked);
    let _ = writeln!(out, "Violations: {}", detection.errors.len());

    if detection.errors.is_empty() {
        let _ = writeln!(out, "\nAll records are structurally valid.");
        return out;
    }

    for kind in EntityKind::ALL {
        let errors: Vec<_> = detection
            .errors
            .iter()
            .filter(|e| e.entity_kind == kind)
            .collect();
        if errors.is_empty() {
            continue;
        }
        let _ = writeln!(out, "\n{} ({} violations)", kind.collection_key(), errors.len());
        for error in errors {
            let _ = writeln!(
                out,
                "  [{}] {} · {}: {}{}",
                severity_tag(error.severity),
                error.entity_id,
                error.field,
                error.message,
                if error.auto_repairable {
                    " (auto-repairable)"
                } else {
                    ""
                },
            );
        }
    }
    out
}

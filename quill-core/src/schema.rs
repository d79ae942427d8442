//! Declarative entity schemas.
//!
//! Each entity kind's shape is data: field name, kind, required/optional,
//! enum membership, and an optional conservative default. One generic
//! validator interprets the tables, so adding a field means editing data,
//! not scattered conditionals.

use chrono::Utc;
use serde_json::{json, Value};

use crate::model::entity::{EntityKind, QuestionStatus};
use crate::model::repair::{Severity, ValidationError};

/// The JSON kind a field must hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Non-empty JSON string.
    Str,
    /// RFC 3339 timestamp string.
    Timestamp,
    /// Array of strings.
    StrList,
    /// String restricted to a fixed set of values.
    Enum(&'static [&'static str]),
}

/// Default the analyzer may propose when a field is missing or invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDefault {
    /// Current time. Content-neutral.
    Now,
    /// A fixed enum value. Content-neutral.
    EnumValue(&'static str),
    /// An empty list. Content-neutral.
    EmptyList,
    /// Invented placeholder text. Never content-neutral.
    Placeholder(&'static str),
}

impl FieldDefault {
    /// Materialize the default as a JSON value.
    pub fn materialize(&self) -> Value {
        match self {
            FieldDefault::Now => json!(Utc::now()),
            FieldDefault::EnumValue(v) => json!(v),
            FieldDefault::EmptyList => json!([]),
            FieldDefault::Placeholder(t) => json!(t),
        }
    }

    /// Whether filling this default invents no user-visible content.
    pub fn is_content_neutral(&self) -> bool {
        !matches!(self, FieldDefault::Placeholder(_))
    }
}

/// Declarative description of one field.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub default: Option<FieldDefault>,
    /// For reference fields: the kind the listed/held ids must resolve to.
    pub references: Option<EntityKind>,
}

impl FieldSpec {
    const fn new(name: &'static str, kind: FieldKind, required: bool) -> Self {
        Self {
            name,
            kind,
            required,
            default: None,
            references: None,
        }
    }

    const fn with_default(mut self, default: FieldDefault) -> Self {
        self.default = Some(default);
        self
    }

    const fn referencing(mut self, kind: EntityKind) -> Self {
        self.references = Some(kind);
        self
    }
}

/// Schema for one entity kind.
#[derive(Debug, Clone, Copy)]
pub struct EntitySchema {
    pub kind: EntityKind,
    pub fields: &'static [FieldSpec],
}

const RESOURCE_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("id", FieldKind::Str, true),
    FieldSpec::new("title", FieldKind::Str, true)
        .with_default(FieldDefault::Placeholder("(untitled resource)")),
    FieldSpec::new("url", FieldKind::Str, false),
    FieldSpec::new("description", FieldKind::Str, false),
    FieldSpec::new("tags", FieldKind::StrList, false).with_default(FieldDefault::EmptyList),
    FieldSpec::new("created_at", FieldKind::Timestamp, true).with_default(FieldDefault::Now),
    FieldSpec::new("updated_at", FieldKind::Timestamp, true).with_default(FieldDefault::Now),
];

const BIG_QUESTION_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("id", FieldKind::Str, true),
    FieldSpec::new("title", FieldKind::Str, true)
        .with_default(FieldDefault::Placeholder("(untitled question)")),
    FieldSpec::new("description", FieldKind::Str, false),
    FieldSpec::new("status", FieldKind::Enum(&QuestionStatus::VALUES), true)
        .with_default(FieldDefault::EnumValue("unsolved")),
    FieldSpec::new("sub_questions", FieldKind::StrList, true)
        .with_default(FieldDefault::EmptyList)
        .referencing(EntityKind::SubQuestion),
    FieldSpec::new("created_at", FieldKind::Timestamp, true).with_default(FieldDefault::Now),
    FieldSpec::new("updated_at", FieldKind::Timestamp, true).with_default(FieldDefault::Now),
];

const SUB_QUESTION_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("id", FieldKind::Str, true),
    FieldSpec::new("parent_id", FieldKind::Str, true).referencing(EntityKind::BigQuestion),
    FieldSpec::new("title", FieldKind::Str, true)
        .with_default(FieldDefault::Placeholder("(untitled sub-question)")),
    FieldSpec::new("content", FieldKind::Str, false),
    FieldSpec::new("status", FieldKind::Enum(&QuestionStatus::VALUES), true)
        .with_default(FieldDefault::EnumValue("unsolved")),
    FieldSpec::new("answers", FieldKind::StrList, true)
        .with_default(FieldDefault::EmptyList)
        .referencing(EntityKind::Answer),
    FieldSpec::new("created_at", FieldKind::Timestamp, true).with_default(FieldDefault::Now),
    FieldSpec::new("updated_at", FieldKind::Timestamp, true).with_default(FieldDefault::Now),
];

const ANSWER_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("id", FieldKind::Str, true),
    FieldSpec::new("content", FieldKind::Str, true)
        .with_default(FieldDefault::Placeholder("(empty answer)")),
    FieldSpec::new("created_at", FieldKind::Timestamp, true).with_default(FieldDefault::Now),
    FieldSpec::new("updated_at", FieldKind::Timestamp, true).with_default(FieldDefault::Now),
];

/// Look up the schema for an entity kind.
pub fn schema_for(kind: EntityKind) -> EntitySchema {
    let fields = match kind {
        EntityKind::Resource => RESOURCE_FIELDS,
        EntityKind::BigQuestion => BIG_QUESTION_FIELDS,
        EntityKind::SubQuestion => SUB_QUESTION_FIELDS,
        EntityKind::Answer => ANSWER_FIELDS,
    };
    EntitySchema { kind, fields }
}

fn value_matches(kind: FieldKind, value: &Value) -> Result<(), String> {
    match kind {
        FieldKind::Str => match value.as_str() {
            Some(s) if !s.is_empty() => Ok(()),
            Some(_) => Err("must not be empty".into()),
            None => Err("must be a string".into()),
        },
        FieldKind::Timestamp => match value.as_str() {
            Some(s) if chrono::DateTime::parse_from_rfc3339(s).is_ok() => Ok(()),
            Some(_) => Err("must be an RFC 3339 timestamp".into()),
            None => Err("must be a timestamp string".into()),
        },
        FieldKind::StrList => match value.as_array() {
            Some(items) if items.iter().all(Value::is_string) => Ok(()),
            Some(_) => Err("must contain only strings".into()),
            None => Err("must be an array of strings".into()),
        },
        FieldKind::Enum(allowed) => match value.as_str() {
            Some(s) if allowed.contains(&s) => Ok(()),
            Some(s) => Err(format!("`{s}` is not one of {allowed:?}")),
            None => Err(format!("must be one of {allowed:?}")),
        },
    }
}

/// Validate one raw record against its kind's schema.
///
/// Referential integrity is checked separately by the detector, which has
/// the whole document in view.
pub fn validate_record(schema: &EntitySchema, record: &Value) -> Vec<ValidationError> {
    let record_id = record
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or("(no id)")
        .to_string();

    let Some(obj) = record.as_object() else {
        return vec![ValidationError {
            entity_kind: schema.kind,
            entity_id: record_id,
            field: String::new(),
            message: "record is not a JSON object".into(),
            severity: Severity::Critical,
            auto_repairable: false,
        }];
    };

    let mut errors = Vec::new();
    for spec in schema.fields {
        match obj.get(spec.name) {
            None | Some(Value::Null) => {
                if spec.required {
                    let neutral_fix = spec.default.is_some_and(|d| d.is_content_neutral());
                    errors.push(ValidationError {
                        entity_kind: schema.kind,
                        entity_id: record_id.clone(),
                        field: spec.name.to_string(),
                        message: format!("required field `{}` is missing", spec.name),
                        severity: if neutral_fix {
                            Severity::Warning
                        } else {
                            Severity::Error
                        },
                        auto_repairable: neutral_fix,
                    });
                }
            }
            Some(value) => {
                if let Err(why) = value_matches(spec.kind, value) {
                    let neutral_fix = spec.default.is_some_and(|d| d.is_content_neutral());
                    errors.push(ValidationError {
                        entity_kind: schema.kind,
                        entity_id: record_id.clone(),
                        field: spec.name.to_string(),
                        message: format!("field `{}` {}", spec.name, why),
                        severity: if neutral_fix {
                            Severity::Warning
                        } else {
                            Severity::Error
                        },
                        auto_repairable: neutral_fix,
                    });
                }
            }
        }
    }
    errors
}

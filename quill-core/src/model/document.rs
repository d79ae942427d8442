//! The aggregate document — the unit exchanged with the remote store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::DOCUMENT_FORMAT_VERSION;
use crate::errors::{QuillError, QuillResult};

use super::entity::{Answer, BigQuestion, EntityKind, Resource, SubQuestion};

/// Document-level metadata. Absent fields fall back to the defaults so a
/// sparse metadata object still loads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentMetadata {
    /// Document format version.
    pub version: String,
    /// When this copy was last synchronized with the remote store.
    #[serde(rename = "lastSync")]
    pub last_sync: Option<DateTime<Utc>>,
    /// Owner identifier (opaque to this core).
    pub owner: String,
}

impl Default for DocumentMetadata {
    fn default() -> Self {
        Self {
            version: DOCUMENT_FORMAT_VERSION.to_string(),
            last_sync: None,
            owner: String::new(),
        }
    }
}

/// The full data set: exactly five wire keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub resources: Vec<Resource>,
    pub questions: Vec<BigQuestion>,
    #[serde(rename = "subQuestions")]
    pub sub_questions: Vec<SubQuestion>,
    pub answers: Vec<Answer>,
    pub metadata: DocumentMetadata,
}

/// Expected container kind per wire key.
const SHAPE: [(&str, &str); 5] = [
    ("resources", "array"),
    ("questions", "array"),
    ("subQuestions", "array"),
    ("answers", "array"),
    ("metadata", "object"),
];

impl Document {
    /// Check that a raw payload has exactly the five top-level keys, each of
    /// the correct container kind. Every offending or missing key is named.
    pub fn validate_shape(payload: &Value) -> QuillResult<()> {
        let Some(obj) = payload.as_object() else {
            return Err(QuillError::shape("payload is not a JSON object"));
        };

        let mut problems = Vec::new();
        for (key, expected) in SHAPE {
            match obj.get(key) {
                None => problems.push(format!("missing key `{key}`")),
                Some(v) => {
                    let ok = match expected {
                        "array" => v.is_array(),
                        _ => v.is_object(),
                    };
                    if !ok {
                        problems.push(format!("key `{key}` must be a JSON {expected}"));
                    }
                }
            }
        }
        for key in obj.keys() {
            if !SHAPE.iter().any(|(k, _)| k == key) {
                problems.push(format!("unexpected key `{key}`"));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(QuillError::Shape { problems })
        }
    }

    /// Parse a raw payload, enforcing the shape check first so failures
    /// name the offending keys instead of a generic serde message.
    pub fn from_payload(payload: &Value) -> QuillResult<Self> {
        Self::validate_shape(payload)?;
        Ok(serde_json::from_value(payload.clone())?)
    }

    /// Serialize into the wire payload.
    pub fn to_payload(&self) -> QuillResult<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Number of records of the given kind.
    pub fn count(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Resource => self.resources.len(),
            EntityKind::BigQuestion => self.questions.len(),
            EntityKind::SubQuestion => self.sub_questions.len(),
            EntityKind::Answer => self.answers.len(),
        }
    }

    /// Whether a record with this id exists in the kind's collection.
    pub fn contains(&self, kind: EntityKind, id: &str) -> bool {
        match kind {
            EntityKind::Resource => self.resources.iter().any(|e| e.id == id),
            EntityKind::BigQuestion => self.questions.iter().any(|e| e.id == id),
            EntityKind::SubQuestion => self.sub_questions.iter().any(|e| e.id == id),
            EntityKind::Answer => self.answers.iter().any(|e| e.id == id),
        }
    }

    /// Insert or replace a record from its serialized form.
    pub fn upsert(&mut self, kind: EntityKind, data: &Value) -> QuillResult<()> {
        fn upsert_into<T: super::entity::SyncEntity + serde::de::DeserializeOwned>(
            list: &mut Vec<T>,
            data: &Value,
        ) -> QuillResult<()> {
            let record: T = serde_json::from_value(data.clone())?;
            match list.iter_mut().find(|e| e.id() == record.id()) {
                Some(slot) => *slot = record,
                None => list.push(record),
            }
            Ok(())
        }

        match kind {
            EntityKind::Resource => upsert_into(&mut self.resources, data),
            EntityKind::BigQuestion => upsert_into(&mut self.questions, data),
            EntityKind::SubQuestion => upsert_into(&mut self.sub_questions, data),
            EntityKind::Answer => upsert_into(&mut self.answers, data),
        }
    }

    /// Remove a record by id. Returns whether anything was removed.
    pub fn remove(&mut self, kind: EntityKind, id: &str) -> bool {
        fn remove_from<T: super::entity::SyncEntity>(list: &mut Vec<T>, id: &str) -> bool {
            let before = list.len();
            list.retain(|e| e.id() != id);
            list.len() != before
        }

        match kind {
            EntityKind::Resource => remove_from(&mut self.resources, id),
            EntityKind::BigQuestion => remove_from(&mut self.questions, id),
            EntityKind::SubQuestion => remove_from(&mut self.sub_questions, id),
            EntityKind::Answer => remove_from(&mut self.answers, id),
        }
    }

    /// Ids of all records of the given kind.
    pub fn ids(&self, kind: EntityKind) -> Vec<String> {
        match kind {
            EntityKind::Resource => self.resources.iter().map(|e| e.id.clone()).collect(),
            EntityKind::BigQuestion => self.questions.iter().map(|e| e.id.clone()).collect(),
            EntityKind::SubQuestion => self.sub_questions.iter().map(|e| e.id.clone()).collect(),
            EntityKind::Answer => self.answers.iter().map(|e| e.id.clone()).collect(),
        }
    }
}

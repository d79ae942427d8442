//! The four entity kinds and the trait that lets sync code treat them
//! uniformly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The four record kinds managed by the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    Resource,
    BigQuestion,
    SubQuestion,
    Answer,
}

impl EntityKind {
    /// All kinds, in document-collection order.
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Resource,
        EntityKind::BigQuestion,
        EntityKind::SubQuestion,
        EntityKind::Answer,
    ];

    /// The wire key of the document collection holding this kind.
    pub fn collection_key(&self) -> &'static str {
        match self {
            EntityKind::Resource => "resources",
            EntityKind::BigQuestion => "questions",
            EntityKind::SubQuestion => "subQuestions",
            EntityKind::Answer => "answers",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EntityKind::Resource => "resource",
            EntityKind::BigQuestion => "bigQuestion",
            EntityKind::SubQuestion => "subQuestion",
            EntityKind::Answer => "answer",
        };
        f.write_str(name)
    }
}

/// Lifecycle status of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionStatus {
    #[default]
    Unsolved,
    Solving,
    Solved,
}

impl QuestionStatus {
    /// Valid wire values, used by the schema validator.
    pub const VALUES: [&'static str; 3] = ["unsolved", "solving", "solved"];
}

/// A saved reference: article, paper, link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A top-level research question; owns an ordered list of sub-question ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BigQuestion {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: QuestionStatus,
    #[serde(default)]
    pub sub_questions: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A narrower question under a BigQuestion; owns an ordered list of answer ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubQuestion {
    pub id: String,
    /// Must resolve to an existing BigQuestion once data is valid.
    pub parent_id: String,
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    pub status: QuestionStatus,
    #[serde(default)]
    pub answers: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An answer attached to a SubQuestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Uniform view over the four entity kinds, enough for id-keyed
/// last-writer-wins merging.
pub trait SyncEntity: Clone {
    fn id(&self) -> &str;
    fn updated_at(&self) -> DateTime<Utc>;
}

macro_rules! impl_sync_entity {
    ($($ty:ty),+) => {
        $(impl SyncEntity for $ty {
            fn id(&self) -> &str {
                &self.id
            }
            fn updated_at(&self) -> DateTime<Utc> {
                self.updated_at
            }
        })+
    };
}

impl_sync_entity!(Resource, BigQuestion, SubQuestion, Answer);

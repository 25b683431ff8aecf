//! Answer document schema

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::IntoIndexes;
use crate::db::schemas::Metadata;

/// Collection name for answers
pub const ANSWER_COLLECTION: &str = "answers";

/// Answer document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AnswerDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub author: ObjectId,

    /// Parent question; answers are always navigated to through it
    pub question: ObjectId,

    pub content: String,

    #[serde(default)]
    pub upvotes: Vec<ObjectId>,

    #[serde(default)]
    pub downvotes: Vec<ObjectId>,

    /// Rarely written; documents without it read as zero
    #[serde(default)]
    pub views: i64,
}

impl AnswerDoc {
    pub fn new(author: ObjectId, question: ObjectId, content: impl Into<String>) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            author,
            question,
            content: content.into(),
            upvotes: Vec::new(),
            downvotes: Vec::new(),
            views: 0,
        }
    }
}

impl IntoIndexes for AnswerDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "author": 1 },
                Some(
                    IndexOptions::builder()
                        .name("author_index".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "question": 1 },
                Some(
                    IndexOptions::builder()
                        .name("question_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

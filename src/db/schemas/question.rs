//! Question document schema

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::IntoIndexes;
use crate::db::schemas::Metadata;
use crate::types::{ColloquyError, Result};

/// Collection name for questions
pub const QUESTION_COLLECTION: &str = "questions";

/// Allowed number of tags on a question
pub const QUESTION_TAG_RANGE: std::ops::RangeInclusive<usize> = 1..=3;

/// Question document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct QuestionDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub title: String,

    #[serde(default)]
    pub content: String,

    /// Tag ids, between one and three
    pub tags: Vec<ObjectId>,

    /// Owning user
    pub author: ObjectId,

    #[serde(default)]
    pub upvotes: Vec<ObjectId>,

    #[serde(default)]
    pub downvotes: Vec<ObjectId>,

    #[serde(default)]
    pub views: i64,

    /// Answer ids; the answer count is derived from this
    #[serde(default)]
    pub answers: Vec<ObjectId>,
}

impl QuestionDoc {
    pub fn new(title: impl Into<String>, author: ObjectId, tags: Vec<ObjectId>) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            title: title.into(),
            content: String::new(),
            tags,
            author,
            upvotes: Vec::new(),
            downvotes: Vec::new(),
            views: 0,
            answers: Vec::new(),
        }
    }

    /// Check document invariants before it is stored
    pub fn validate(&self) -> Result<()> {
        if !QUESTION_TAG_RANGE.contains(&self.tags.len()) {
            return Err(ColloquyError::InvalidArgument(format!(
                "a question needs between {} and {} tags, got {}",
                QUESTION_TAG_RANGE.start(),
                QUESTION_TAG_RANGE.end(),
                self.tags.len()
            )));
        }
        if self.title.trim().is_empty() {
            return Err(ColloquyError::InvalidArgument("question title is empty".into()));
        }
        Ok(())
    }
}

impl IntoIndexes for QuestionDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "author": 1 },
            Some(
                IndexOptions::builder()
                    .name("author_index".to_string())
                    .build(),
            ),
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_count_bounds() {
        let author = ObjectId::new();
        let q = QuestionDoc::new("How?", author, vec![]);
        assert!(q.validate().is_err());

        let q = QuestionDoc::new("How?", author, vec![ObjectId::new()]);
        assert!(q.validate().is_ok());

        let q = QuestionDoc::new("How?", author, (0..4).map(|_| ObjectId::new()).collect());
        assert!(matches!(q.validate(), Err(ColloquyError::InvalidArgument(_))));
    }

    #[test]
    fn test_blank_title_rejected() {
        let q = QuestionDoc::new("   ", ObjectId::new(), vec![ObjectId::new()]);
        assert!(q.validate().is_err());
    }
}

//! Interaction document schema
//!
//! Records what a user did to which question; used for view de-duplication
//! and for tag affinity.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::IntoIndexes;
use crate::db::schemas::Metadata;

/// Collection name for interactions
pub const INTERACTION_COLLECTION: &str = "interactions";

/// Kind of recorded interaction
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum InteractionAction {
    View,
    AskQuestion,
    Answer,
    Upvote,
    Downvote,
}

impl InteractionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::AskQuestion => "ask_question",
            Self::Answer => "answer",
            Self::Upvote => "upvote",
            Self::Downvote => "downvote",
        }
    }
}

/// Interaction document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct InteractionDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub user: ObjectId,

    pub action: InteractionAction,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<ObjectId>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<ObjectId>,

    #[serde(default)]
    pub tags: Vec<ObjectId>,
}

impl InteractionDoc {
    pub fn new(user: ObjectId, action: InteractionAction) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            user,
            action,
            question: None,
            answer: None,
            tags: Vec::new(),
        }
    }

    pub fn with_question(mut self, question: ObjectId) -> Self {
        self.question = Some(question);
        self
    }

    pub fn with_tags(mut self, tags: Vec<ObjectId>) -> Self {
        self.tags = tags;
        self
    }
}

impl IntoIndexes for InteractionDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "user": 1, "action": 1 },
                Some(
                    IndexOptions::builder()
                        .name("user_action_index".to_string())
                        .build(),
                ),
            ),
            // One view per (user, question); racing upserts lose on the key
            (
                doc! { "user": 1, "action": 1, "question": 1 },
                Some(
                    IndexOptions::builder()
                        .name("user_view_question_unique".to_string())
                        .unique(true)
                        .partial_filter_expression(doc! {
                            "action": InteractionAction::View.as_str(),
                            "question": { "$exists": true },
                        })
                        .build(),
                ),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_serializes_snake_case() {
        let json = serde_json::to_string(&InteractionAction::AskQuestion).unwrap();
        assert_eq!(json, "\"ask_question\"");
        assert_eq!(InteractionAction::AskQuestion.as_str(), "ask_question");
    }

    #[test]
    fn test_view_index_is_unique_and_partial() {
        let indices = InteractionDoc::into_indices();
        let (keys, options) = indices
            .iter()
            .find(|(_, opts)| {
                opts.as_ref().and_then(|o| o.name.as_deref()) == Some("user_view_question_unique")
            })
            .unwrap();
        let options = options.as_ref().unwrap();

        assert_eq!(keys, &doc! { "user": 1, "action": 1, "question": 1 });
        assert_eq!(options.unique, Some(true));
        let partial = options.partial_filter_expression.as_ref().unwrap();
        assert_eq!(partial.get_str("action").unwrap(), "view");
        assert!(partial.get_document("question").unwrap().get_bool("$exists").unwrap());
    }
}

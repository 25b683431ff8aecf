//! User document schema
//!
//! Stores the platform profile, reputation and saved questions.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::IntoIndexes;
use crate::db::schemas::Metadata;

/// Collection name for users
pub const USER_COLLECTION: &str = "users";

/// User document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct UserDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    /// Stable external identity key issued by the auth provider
    pub clerk_id: String,

    pub name: String,

    pub username: String,

    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub picture: String,

    /// Reputation score; this service never decrements it
    #[serde(default)]
    pub reputation: i64,

    /// Bookmarked question ids (set semantics)
    #[serde(default)]
    pub saved: Vec<ObjectId>,
}

impl UserDoc {
    /// Create a new user document
    pub fn new(clerk_id: impl Into<String>, name: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            clerk_id: clerk_id.into(),
            name: name.into(),
            username: username.into(),
            email: String::new(),
            picture: String::new(),
            reputation: 0,
            saved: Vec::new(),
        }
    }

    pub fn has_saved(&self, question_id: &ObjectId) -> bool {
        self.saved.contains(question_id)
    }
}

impl IntoIndexes for UserDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "clerk_id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("clerk_id_unique".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "username": 1 },
                Some(
                    IndexOptions::builder()
                        .name("username_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

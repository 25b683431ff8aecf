//! Tag document schema

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::IntoIndexes;
use crate::db::schemas::Metadata;

/// Collection name for tags
pub const TAG_COLLECTION: &str = "tags";

/// Tag document stored in MongoDB
///
/// Membership of a question in `questions` means "tagged with".
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TagDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub questions: Vec<ObjectId>,

    #[serde(default)]
    pub followers: Vec<ObjectId>,
}

impl TagDoc {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            name: name.into(),
            description: String::new(),
            questions: Vec::new(),
            followers: Vec::new(),
        }
    }
}

impl IntoIndexes for TagDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "name": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("name_unique".to_string())
                    .build(),
            ),
        )]
    }
}

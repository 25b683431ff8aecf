//! Common metadata for all documents

use bson::DateTime;
use serde::{Deserialize, Serialize};

/// Creation, update and soft deletion timestamps
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Metadata {
    #[serde(default)]
    pub is_deleted: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
}

impl Metadata {
    /// Create new metadata with current timestamp
    pub fn new() -> Self {
        let now = DateTime::now();
        Self {
            is_deleted: false,
            deleted_at: None,
            updated_at: Some(now),
            created_at: Some(now),
        }
    }
}

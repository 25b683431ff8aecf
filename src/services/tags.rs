//! Tag rankings for sidebars and profile pages

use bson::oid::ObjectId;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::db::schemas::InteractionAction;
use crate::model::TagPopularity;
use crate::store::ForumStore;
use crate::types::{ColloquyError, Result};

pub const DEFAULT_POPULAR_LIMIT: usize = 5;
pub const DEFAULT_INTERACTED_LIMIT: usize = 3;

/// A tag name with how often it occurred
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct TagFrequency {
    pub name: String,
    pub count: u64,
}

pub struct TagRanking {
    store: Arc<dyn ForumStore>,
}

impl TagRanking {
    pub fn new(store: Arc<dyn ForumStore>) -> Self {
        Self { store }
    }

    /// Tags carried by the most questions
    pub async fn top_popular_tags(&self, limit: usize) -> Result<Vec<TagPopularity>> {
        self.store.popular_tags(limit).await
    }

    /// Tags the user asks about most often
    ///
    /// Ranked by frequency, then by name. Fewer than `limit` entries are
    /// returned when the user has touched fewer tags.
    pub async fn top_interacted_tags(
        &self,
        user: &ObjectId,
        limit: usize,
    ) -> Result<Vec<TagFrequency>> {
        if self.store.find_user(user).await?.is_none() {
            return Err(ColloquyError::not_found("user", user.to_hex()));
        }

        let names = self
            .store
            .interaction_tag_names(user, InteractionAction::AskQuestion)
            .await?;

        let mut counts: HashMap<String, u64> = HashMap::new();
        for name in names {
            *counts.entry(name).or_insert(0) += 1;
        }

        let mut ranked: Vec<TagFrequency> = counts
            .into_iter()
            .map(|(name, count)| TagFrequency { name, count })
            .collect();
        ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
        ranked.truncate(limit);

        debug!(user = %user.to_hex(), count = ranked.len(), "Interacted tags ranked");
        Ok(ranked)
    }
}

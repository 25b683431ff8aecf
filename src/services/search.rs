//! Global search
//!
//! A query fans out over the searchable kinds in registry order. Each kind is
//! matched on one field by case-insensitive literal substring and capped; the
//! per-kind lists are concatenated without deduplication.

use futures::future::try_join_all;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::model::{SearchHit, SearchKind};
use crate::store::ForumStore;
use crate::types::Result;

/// Result caps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchLimits {
    /// Cap per kind when every kind is searched
    pub per_kind: usize,
    /// Cap when a single kind is requested
    pub single_kind: usize,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            per_kind: 2,
            single_kind: 8,
        }
    }
}

/// One search result, serialized as `{ "type", "id", "title" }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SearchResult {
    Question { id: String, title: String },
    /// `id` is the external identity key
    User { id: String, title: String },
    /// `id` is the parent question
    Answer { id: String, title: String },
    Tag { id: String, title: String },
}

impl SearchResult {
    pub fn kind(&self) -> SearchKind {
        match self {
            Self::Question { .. } => SearchKind::Question,
            Self::User { .. } => SearchKind::User,
            Self::Answer { .. } => SearchKind::Answer,
            Self::Tag { .. } => SearchKind::Tag,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Question { id, .. }
            | Self::User { id, .. }
            | Self::Answer { id, .. }
            | Self::Tag { id, .. } => id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Question { title, .. }
            | Self::User { title, .. }
            | Self::Answer { title, .. }
            | Self::Tag { title, .. } => title,
        }
    }

    fn from_hit(hit: SearchHit, query: &str) -> Option<Self> {
        let result = match hit {
            SearchHit::Question(q) => Self::Question {
                id: q._id?.to_hex(),
                title: q.title,
            },
            SearchHit::User(u) => Self::User {
                id: u.clerk_id,
                title: u.name,
            },
            SearchHit::Answer(a) => Self::Answer {
                id: a.question.to_hex(),
                title: format!("Answer Containing {}", query),
            },
            SearchHit::Tag(t) => Self::Tag {
                id: t._id?.to_hex(),
                title: t.name,
            },
        };
        Some(result)
    }
}

pub struct SearchAggregator {
    store: Arc<dyn ForumStore>,
    limits: SearchLimits,
}

impl SearchAggregator {
    pub fn new(store: Arc<dyn ForumStore>, limits: SearchLimits) -> Self {
        Self { store, limits }
    }

    pub fn limits(&self) -> SearchLimits {
        self.limits
    }

    /// Search one kind, or every kind when `kind` is absent or empty
    ///
    /// An unrecognised kind is an `InvalidArgument`.
    pub async fn search(&self, query: &str, kind: Option<&str>) -> Result<Vec<SearchResult>> {
        let requested = kind.map(str::trim).filter(|k| !k.is_empty());

        let (kinds, limit) = match requested {
            Some(name) => (vec![name.parse::<SearchKind>()?], self.limits.single_kind),
            None => (SearchKind::ALL.to_vec(), self.limits.per_kind),
        };

        let per_kind = try_join_all(
            kinds
                .iter()
                .map(|kind| self.store.find_matching(*kind, query, limit)),
        )
        .await?;

        let results: Vec<SearchResult> = per_kind
            .into_iter()
            .flatten()
            .filter_map(|hit| {
                let kind = hit.kind();
                let result = SearchResult::from_hit(hit, query);
                if result.is_none() {
                    warn!(%kind, "Search hit without an id skipped");
                }
                result
            })
            .collect();

        debug!(query, ?requested, count = results.len(), "Search completed");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schemas::{AnswerDoc, QuestionDoc, TagDoc, UserDoc};
    use crate::store::MemoryStore;
    use crate::types::ColloquyError;
    use bson::oid::ObjectId;
    use tokio_test::assert_err;

    fn aggregator(store: &Arc<MemoryStore>) -> SearchAggregator {
        SearchAggregator::new(store.clone(), SearchLimits::default())
    }

    /// 3 questions, 1 user and 5 answers match "foo"; no tag does
    fn seeded() -> (Arc<MemoryStore>, ObjectId) {
        let store = Arc::new(MemoryStore::new());
        let author = store.insert_user(UserDoc::new("clerk_foo", "Foo Fighter", "foo"));
        store.insert_user(UserDoc::new("clerk_bar", "Bar", "bar"));
        let tag = store.insert_tag(TagDoc::new("rust"));

        let first = store
            .insert_question(QuestionDoc::new("What is foo?", author, vec![tag]))
            .unwrap();
        store
            .insert_question(QuestionDoc::new("FOO and bar", author, vec![tag]))
            .unwrap();
        store
            .insert_question(QuestionDoc::new("More foo", author, vec![tag]))
            .unwrap();
        for i in 0..5 {
            store
                .insert_answer(AnswerDoc::new(author, first, format!("foo answer {}", i)))
                .unwrap();
        }
        (store, first)
    }

    #[tokio::test]
    async fn test_all_kinds_capped_in_registry_order() {
        let (store, _) = seeded();
        let results = aggregator(&store).search("foo", None).await.unwrap();

        let kinds: Vec<_> = results.iter().map(|r| r.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                SearchKind::Question,
                SearchKind::Question,
                SearchKind::User,
                SearchKind::Answer,
                SearchKind::Answer,
            ]
        );
        assert_eq!(results[0].title(), "What is foo?");
        assert_eq!(results[2].id(), "clerk_foo");
    }

    #[tokio::test]
    async fn test_empty_type_searches_everything() {
        let (store, _) = seeded();
        let results = aggregator(&store).search("foo", Some("")).await.unwrap();
        assert_eq!(results.len(), 5);
    }

    #[tokio::test]
    async fn test_single_kind_cap() {
        let store = Arc::new(MemoryStore::new());
        for i in 0..10 {
            store.insert_tag(TagDoc::new(format!("foo-{}", i)));
        }

        let results = aggregator(&store).search("foo", Some("Tag")).await.unwrap();
        assert_eq!(results.len(), 8);
        assert!(results.iter().all(|r| r.kind() == SearchKind::Tag));
    }

    #[tokio::test]
    async fn test_unknown_type_is_invalid() {
        let (store, _) = seeded();
        let err = assert_err!(aggregator(&store).search("foo", Some("invalidkind")).await);
        assert!(matches!(err, ColloquyError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_answer_results_point_at_parent_question() {
        let (store, question) = seeded();
        let results = aggregator(&store).search("foo", Some("answer")).await.unwrap();

        assert_eq!(results.len(), 5);
        for result in &results {
            assert_eq!(result.id(), question.to_hex());
            assert_eq!(result.title(), "Answer Containing foo");
        }
    }

    #[tokio::test]
    async fn test_query_is_literal() {
        let store = Arc::new(MemoryStore::new());
        let author = store.insert_user(UserDoc::new("clerk_x", "X", "x"));
        let tag = store.insert_tag(TagDoc::new("regex"));
        store
            .insert_question(QuestionDoc::new("Why does a.b match?", author, vec![tag]))
            .unwrap();
        store
            .insert_question(QuestionDoc::new("axb", author, vec![tag]))
            .unwrap();

        let results = aggregator(&store).search("a.b", Some("question")).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title(), "Why does a.b match?");
    }

    #[test]
    fn test_result_json_shape() {
        let result = SearchResult::Answer {
            id: "abc".into(),
            title: "Answer Containing foo".into(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "answer", "id": "abc", "title": "Answer Containing foo"})
        );
    }
}

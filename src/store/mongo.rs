//! MongoDB-backed store
//!
//! Vote and save mutations are single `update_one` calls combining `$addToSet`
//! and `$pull`, so concurrent voters on one document never lose each other's
//! updates. Joins (interaction tags to tag names) are explicit second reads.

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::ForumStore;
use crate::db::mongo::bson_to_count;
use crate::db::schemas::{
    AnswerDoc, InteractionAction, InteractionDoc, QuestionDoc, TagDoc, UserDoc,
    ANSWER_COLLECTION, INTERACTION_COLLECTION, QUESTION_COLLECTION, TAG_COLLECTION,
    USER_COLLECTION,
};
use crate::db::{MongoCollection, MongoPool};
use crate::model::{
    SearchHit, SearchKind, TagPopularity, TargetKind, VoteChange, VoteState, VoteTarget,
};
use crate::types::{ColloquyError, Result};

const DUPLICATE_KEY: i32 = 11000;

struct Collections {
    users: MongoCollection<UserDoc>,
    questions: MongoCollection<QuestionDoc>,
    answers: MongoCollection<AnswerDoc>,
    tags: MongoCollection<TagDoc>,
    interactions: MongoCollection<InteractionDoc>,
}

pub struct MongoStore {
    pool: Arc<MongoPool>,
    collections: OnceCell<Collections>,
}

impl MongoStore {
    pub fn new(pool: Arc<MongoPool>) -> Self {
        Self {
            pool,
            collections: OnceCell::new(),
        }
    }

    /// Typed collections, opened (and indexed) once per process
    async fn collections(&self) -> Result<&Collections> {
        self.collections
            .get_or_try_init(|| async {
                let client = self.pool.acquire().await?;
                let collections = Collections {
                    users: client.collection(USER_COLLECTION).await?,
                    questions: client.collection(QUESTION_COLLECTION).await?,
                    answers: client.collection(ANSWER_COLLECTION).await?,
                    tags: client.collection(TAG_COLLECTION).await?,
                    interactions: client.collection(INTERACTION_COLLECTION).await?,
                };
                info!("MongoDB collections ready in '{}'", client.db_name());
                Ok(collections)
            })
            .await
    }
}

/// Filter for a live document by id
fn by_id(id: &ObjectId) -> Document {
    doc! { "_id": *id, "metadata.is_deleted": { "$ne": true } }
}

/// Update document for a vote change
fn vote_update(voter: &ObjectId, change: VoteChange) -> Document {
    let mut update = Document::new();
    match change {
        VoteChange::Cast(direction) => {
            let mut add = Document::new();
            add.insert(direction.field(), *voter);
            let mut remove = Document::new();
            remove.insert(direction.opposite().field(), *voter);
            update.insert("$addToSet", add);
            update.insert("$pull", remove);
        }
        VoteChange::Retract(direction) => {
            let mut remove = Document::new();
            remove.insert(direction.field(), *voter);
            update.insert("$pull", remove);
        }
    }
    update.insert("$set", doc! { "metadata.updated_at": DateTime::now() });
    update
}

/// Case-insensitive literal substring filter on the kind's search field
fn substring_filter(kind: SearchKind, query: &str) -> Document {
    let mut filter = Document::new();
    filter.insert(
        kind.search_field(),
        doc! { "$regex": regex::escape(query), "$options": "i" },
    );
    filter
}

/// `$size` of an array field that may be missing
fn array_size(field: &str) -> Document {
    doc! { "$size": { "$ifNull": [format!("${}", field), []] } }
}

#[async_trait::async_trait]
impl ForumStore for MongoStore {
    async fn find_user(&self, id: &ObjectId) -> Result<Option<UserDoc>> {
        self.collections()
            .await?
            .users
            .find_one(doc! { "_id": *id })
            .await
    }

    async fn find_user_by_clerk_id(&self, clerk_id: &str) -> Result<Option<UserDoc>> {
        self.collections()
            .await?
            .users
            .find_one(doc! { "clerk_id": clerk_id })
            .await
    }

    async fn vote_state(&self, target: &VoteTarget, voter: &ObjectId) -> Result<VoteState> {
        let c = self.collections().await?;
        let filter = doc! { "_id": target.id };
        let (up, down) = match target.kind {
            TargetKind::Question => c
                .questions
                .find_one(filter)
                .await?
                .map(|q| (q.upvotes, q.downvotes)),
            TargetKind::Answer => c
                .answers
                .find_one(filter)
                .await?
                .map(|a| (a.upvotes, a.downvotes)),
        }
        .ok_or_else(|| ColloquyError::not_found(target.kind.as_str(), target.id.to_hex()))?;

        Ok(VoteState {
            has_upvoted: up.contains(voter),
            has_downvoted: down.contains(voter),
        })
    }

    async fn update_votes(
        &self,
        target: &VoteTarget,
        voter: &ObjectId,
        change: VoteChange,
    ) -> Result<()> {
        let c = self.collections().await?;
        let filter = by_id(&target.id);
        let update = vote_update(voter, change);

        let result = match target.kind {
            TargetKind::Question => c.questions.update_one(filter, update).await?,
            TargetKind::Answer => c.answers.update_one(filter, update).await?,
        };

        if result.matched_count == 0 {
            return Err(ColloquyError::not_found(
                target.kind.as_str(),
                target.id.to_hex(),
            ));
        }

        debug!(
            target = %target,
            ?change,
            modified = result.modified_count,
            "Vote sets updated"
        );
        Ok(())
    }

    async fn toggle_saved(&self, user: &ObjectId, question: &ObjectId) -> Result<bool> {
        let users = &self.collections().await?.users;

        // Conditional pull first: only matches when the question is saved
        let mut saved_filter = by_id(user);
        saved_filter.insert("saved", *question);
        let pulled = users
            .update_one(saved_filter, doc! { "$pull": { "saved": *question } })
            .await?;
        if pulled.modified_count > 0 {
            return Ok(false);
        }

        let added = users
            .update_one(by_id(user), doc! { "$addToSet": { "saved": *question } })
            .await?;
        if added.matched_count == 0 {
            return Err(ColloquyError::not_found("user", user.to_hex()));
        }
        Ok(true)
    }

    async fn count_questions_by(&self, author: &ObjectId) -> Result<u64> {
        self.collections()
            .await?
            .questions
            .count(doc! { "author": *author })
            .await
    }

    async fn count_answers_by(&self, author: &ObjectId) -> Result<u64> {
        self.collections()
            .await?
            .answers
            .count(doc! { "author": *author })
            .await
    }

    async fn sum_question_upvotes(&self, author: &ObjectId) -> Result<u64> {
        self.collections()
            .await?
            .questions
            .sum(doc! { "author": *author }, array_size("upvotes"))
            .await
    }

    async fn sum_answer_upvotes(&self, author: &ObjectId) -> Result<u64> {
        self.collections()
            .await?
            .answers
            .sum(doc! { "author": *author }, array_size("upvotes"))
            .await
    }

    async fn sum_answer_views(&self, author: &ObjectId) -> Result<u64> {
        self.collections()
            .await?
            .answers
            .sum(doc! { "author": *author }, "$views")
            .await
    }

    async fn find_matching(
        &self,
        kind: SearchKind,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchHit>> {
        let c = self.collections().await?;
        let filter = substring_filter(kind, query);
        let limit = Some(limit as i64);

        let hits = match kind {
            SearchKind::Question => c
                .questions
                .find_many(filter, limit)
                .await?
                .into_iter()
                .map(SearchHit::Question)
                .collect(),
            SearchKind::User => c
                .users
                .find_many(filter, limit)
                .await?
                .into_iter()
                .map(SearchHit::User)
                .collect(),
            SearchKind::Answer => c
                .answers
                .find_many(filter, limit)
                .await?
                .into_iter()
                .map(SearchHit::Answer)
                .collect(),
            SearchKind::Tag => c
                .tags
                .find_many(filter, limit)
                .await?
                .into_iter()
                .map(SearchHit::Tag)
                .collect(),
        };
        Ok(hits)
    }

    async fn increment_question_views(&self, question: &ObjectId) -> Result<()> {
        let result = self
            .collections()
            .await?
            .questions
            .update_one(by_id(question), doc! { "$inc": { "views": 1 } })
            .await?;
        if result.matched_count == 0 {
            return Err(ColloquyError::not_found("question", question.to_hex()));
        }
        Ok(())
    }

    async fn record_interaction_once(&self, interaction: InteractionDoc) -> Result<bool> {
        let interactions = &self.collections().await?.interactions;

        let filter = doc! {
            "user": interaction.user,
            "action": interaction.action.as_str(),
            "question": interaction.question,
        };

        let now = DateTime::now();
        let mut on_insert = doc! {
            "metadata": { "is_deleted": false, "created_at": now, "updated_at": now },
            "tags": interaction.tags.clone(),
        };
        if let Some(answer) = interaction.answer {
            on_insert.insert("answer", answer);
        }

        let result = interactions
            .inner()
            .update_one(filter, doc! { "$setOnInsert": on_insert })
            .upsert(true)
            .await;

        match result {
            Ok(result) => Ok(result.upserted_id.is_some()),
            // A concurrent upsert for the same view inserted first
            Err(e) if is_duplicate_key(&e) => {
                debug!(user = %interaction.user, "view already recorded by a concurrent request");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn interaction_tag_names(
        &self,
        user: &ObjectId,
        action: InteractionAction,
    ) -> Result<Vec<String>> {
        let c = self.collections().await?;

        let tag_ids: Vec<ObjectId> = c
            .interactions
            .find_many(doc! { "user": *user, "action": action.as_str() }, None)
            .await?
            .into_iter()
            .flat_map(|i| i.tags)
            .collect();
        if tag_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut unique = tag_ids.clone();
        unique.sort();
        unique.dedup();

        let names: HashMap<ObjectId, String> = c
            .tags
            .find_many(doc! { "_id": { "$in": unique } }, None)
            .await?
            .into_iter()
            .filter_map(|t| t._id.map(|id| (id, t.name)))
            .collect();

        Ok(tag_ids
            .iter()
            .filter_map(|id| names.get(id).cloned())
            .collect())
    }

    async fn popular_tags(&self, limit: usize) -> Result<Vec<TagPopularity>> {
        let pipeline = vec![
            doc! { "$match": { "metadata.is_deleted": { "$ne": true } } },
            doc! { "$project": { "name": 1, "question_count": array_size("questions") } },
            doc! { "$sort": { "question_count": -1, "_id": 1 } },
            doc! { "$limit": limit as i64 },
        ];

        let rows = self.collections().await?.tags.aggregate(pipeline).await?;

        rows.into_iter()
            .map(|row| {
                let id = row.get_object_id("_id").map_err(|e| {
                    ColloquyError::StoreUnavailable(format!("Malformed tag row: {}", e))
                })?;
                Ok(TagPopularity {
                    id,
                    name: row.get_str("name").unwrap_or_default().to_string(),
                    question_count: row.get("question_count").map(bson_to_count).unwrap_or(0),
                })
            })
            .collect()
    }
}

/// Whether a write failed on a unique index
fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY,
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::VoteDirection;
    use bson::Bson;

    #[test]
    fn test_cast_update_pulls_opposite() {
        let voter = ObjectId::new();
        let update = vote_update(&voter, VoteChange::Cast(VoteDirection::Up));

        let add = update.get_document("$addToSet").unwrap();
        assert_eq!(add.get_object_id("upvotes").unwrap(), voter);
        let pull = update.get_document("$pull").unwrap();
        assert_eq!(pull.get_object_id("downvotes").unwrap(), voter);
    }

    #[test]
    fn test_retract_update_only_pulls() {
        let voter = ObjectId::new();
        let update = vote_update(&voter, VoteChange::Retract(VoteDirection::Down));

        assert!(update.get_document("$addToSet").is_err());
        let pull = update.get_document("$pull").unwrap();
        assert_eq!(pull.get_object_id("downvotes").unwrap(), voter);
    }

    #[test]
    fn test_substring_filter_escapes_metacharacters() {
        let filter = substring_filter(SearchKind::Question, "c++ (why?)");
        let clause = filter.get_document("title").unwrap();
        assert_eq!(clause.get_str("$regex").unwrap(), r"c\+\+ \(why\?\)");
        assert_eq!(clause.get_str("$options").unwrap(), "i");
    }

    #[test]
    fn test_duplicate_key_detection() {
        let write_error: mongodb::error::WriteError =
            bson::from_document(doc! { "code": 11000, "errmsg": "E11000 duplicate key" }).unwrap();
        let err = mongodb::error::Error::from(ErrorKind::Write(WriteFailure::WriteError(write_error)));
        assert!(is_duplicate_key(&err));

        let other: mongodb::error::WriteError =
            bson::from_document(doc! { "code": 121, "errmsg": "validation failed" }).unwrap();
        let err = mongodb::error::Error::from(ErrorKind::Write(WriteFailure::WriteError(other)));
        assert!(!is_duplicate_key(&err));

        assert!(!is_duplicate_key(&mongodb::error::Error::custom("unrelated")));
    }

    #[test]
    fn test_search_field_per_kind() {
        assert!(substring_filter(SearchKind::Answer, "x").contains_key("content"));
        assert!(substring_filter(SearchKind::User, "x").contains_key("name"));
    }

    #[test]
    fn test_array_size_tolerates_missing_field() {
        let expr = array_size("upvotes");
        let if_null = expr.get_document("$size").unwrap().get_array("$ifNull").unwrap();
        assert_eq!(if_null[0], Bson::String("$upvotes".into()));
    }
}

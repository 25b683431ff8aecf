//! In-memory store
//!
//! Backs dev mode and the test suites. Each collection is a `DashMap`; a
//! mutation holds the entry's shard lock for its whole read-modify-write, which
//! gives the same single-update atomicity MongoDB gives per document.

use bson::oid::ObjectId;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tracing::debug;

use super::ForumStore;
use crate::db::schemas::{
    AnswerDoc, InteractionAction, InteractionDoc, QuestionDoc, TagDoc, UserDoc,
};
use crate::model::{
    SearchHit, SearchKind, TagPopularity, TargetKind, VoteChange, VoteDirection, VoteState,
    VoteTarget,
};
use crate::types::{ColloquyError, Result};

/// Stored document plus its insertion sequence (natural order)
struct Entry<T> {
    seq: u64,
    doc: T,
}

#[derive(Default)]
pub struct MemoryStore {
    seq: AtomicU64,
    users: DashMap<ObjectId, Entry<UserDoc>>,
    questions: DashMap<ObjectId, Entry<QuestionDoc>>,
    answers: DashMap<ObjectId, Entry<AnswerDoc>>,
    tags: DashMap<ObjectId, Entry<TagDoc>>,
    interactions: Mutex<Vec<InteractionDoc>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::Relaxed)
    }

    pub fn insert_user(&self, mut user: UserDoc) -> ObjectId {
        let id = *user._id.get_or_insert_with(ObjectId::new);
        let seq = self.next_seq();
        self.users.insert(id, Entry { seq, doc: user });
        id
    }

    /// Insert a question and register it on each of its tags
    pub fn insert_question(&self, mut question: QuestionDoc) -> Result<ObjectId> {
        question.validate()?;
        let id = *question._id.get_or_insert_with(ObjectId::new);
        for tag_id in &question.tags {
            if let Some(mut tag) = self.tags.get_mut(tag_id) {
                add_to_set(&mut tag.doc.questions, id);
            }
        }
        let seq = self.next_seq();
        self.questions.insert(id, Entry { seq, doc: question });
        Ok(id)
    }

    /// Insert an answer and register it on its parent question
    pub fn insert_answer(&self, mut answer: AnswerDoc) -> Result<ObjectId> {
        let mut parent = self
            .questions
            .get_mut(&answer.question)
            .ok_or_else(|| ColloquyError::not_found("question", answer.question.to_hex()))?;
        let id = *answer._id.get_or_insert_with(ObjectId::new);
        add_to_set(&mut parent.doc.answers, id);
        drop(parent);

        let seq = self.next_seq();
        self.answers.insert(id, Entry { seq, doc: answer });
        Ok(id)
    }

    pub fn insert_tag(&self, mut tag: TagDoc) -> ObjectId {
        let id = *tag._id.get_or_insert_with(ObjectId::new);
        let seq = self.next_seq();
        self.tags.insert(id, Entry { seq, doc: tag });
        id
    }

    pub fn insert_interaction(&self, mut interaction: InteractionDoc) -> ObjectId {
        let id = *interaction._id.get_or_insert_with(ObjectId::new);
        self.lock_interactions().push(interaction);
        id
    }

    pub fn user(&self, id: &ObjectId) -> Option<UserDoc> {
        self.users.get(id).map(|e| e.doc.clone())
    }

    pub fn question(&self, id: &ObjectId) -> Option<QuestionDoc> {
        self.questions.get(id).map(|e| e.doc.clone())
    }

    pub fn answer(&self, id: &ObjectId) -> Option<AnswerDoc> {
        self.answers.get(id).map(|e| e.doc.clone())
    }

    pub fn interaction_count(&self) -> usize {
        self.lock_interactions().len()
    }

    fn lock_interactions(&self) -> std::sync::MutexGuard<'_, Vec<InteractionDoc>> {
        // A poisoned lock only means another test thread panicked mid-push
        self.interactions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn add_to_set(set: &mut Vec<ObjectId>, id: ObjectId) {
    if !set.contains(&id) {
        set.push(id);
    }
}

fn pull(set: &mut Vec<ObjectId>, id: &ObjectId) {
    set.retain(|member| member != id);
}

/// Apply a vote change to a pair of vote sets
fn apply_change(up: &mut Vec<ObjectId>, down: &mut Vec<ObjectId>, voter: ObjectId, change: VoteChange) {
    match change {
        VoteChange::Cast(VoteDirection::Up) => {
            pull(down, &voter);
            add_to_set(up, voter);
        }
        VoteChange::Cast(VoteDirection::Down) => {
            pull(up, &voter);
            add_to_set(down, voter);
        }
        VoteChange::Retract(VoteDirection::Up) => pull(up, &voter),
        VoteChange::Retract(VoteDirection::Down) => pull(down, &voter),
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Live documents passing `predicate`, in insertion order, at most `limit`
fn matching<T: Clone>(
    map: &DashMap<ObjectId, Entry<T>>,
    limit: usize,
    predicate: impl Fn(&T) -> bool,
) -> Vec<T> {
    let mut hits: Vec<(u64, T)> = map
        .iter()
        .filter(|e| predicate(&e.doc))
        .map(|e| (e.seq, e.doc.clone()))
        .collect();
    hits.sort_by_key(|(seq, _)| *seq);
    hits.into_iter().take(limit).map(|(_, doc)| doc).collect()
}

#[async_trait::async_trait]
impl ForumStore for MemoryStore {
    async fn find_user(&self, id: &ObjectId) -> Result<Option<UserDoc>> {
        Ok(self
            .users
            .get(id)
            .filter(|e| !e.doc.metadata.is_deleted)
            .map(|e| e.doc.clone()))
    }

    async fn find_user_by_clerk_id(&self, clerk_id: &str) -> Result<Option<UserDoc>> {
        Ok(self
            .users
            .iter()
            .find(|e| !e.doc.metadata.is_deleted && e.doc.clerk_id == clerk_id)
            .map(|e| e.doc.clone()))
    }

    async fn vote_state(&self, target: &VoteTarget, voter: &ObjectId) -> Result<VoteState> {
        let (up, down) = match target.kind {
            TargetKind::Question => {
                let q = self
                    .questions
                    .get(&target.id)
                    .filter(|e| !e.doc.metadata.is_deleted)
                    .ok_or_else(|| ColloquyError::not_found("question", target.id.to_hex()))?;
                (q.doc.upvotes.contains(voter), q.doc.downvotes.contains(voter))
            }
            TargetKind::Answer => {
                let a = self
                    .answers
                    .get(&target.id)
                    .filter(|e| !e.doc.metadata.is_deleted)
                    .ok_or_else(|| ColloquyError::not_found("answer", target.id.to_hex()))?;
                (a.doc.upvotes.contains(voter), a.doc.downvotes.contains(voter))
            }
        };
        Ok(VoteState {
            has_upvoted: up,
            has_downvoted: down,
        })
    }

    async fn update_votes(
        &self,
        target: &VoteTarget,
        voter: &ObjectId,
        change: VoteChange,
    ) -> Result<()> {
        match target.kind {
            TargetKind::Question => {
                let mut entry = self
                    .questions
                    .get_mut(&target.id)
                    .filter(|e| !e.doc.metadata.is_deleted)
                    .ok_or_else(|| ColloquyError::not_found("question", target.id.to_hex()))?;
                let doc = &mut entry.doc;
                apply_change(&mut doc.upvotes, &mut doc.downvotes, *voter, change);
            }
            TargetKind::Answer => {
                let mut entry = self
                    .answers
                    .get_mut(&target.id)
                    .filter(|e| !e.doc.metadata.is_deleted)
                    .ok_or_else(|| ColloquyError::not_found("answer", target.id.to_hex()))?;
                let doc = &mut entry.doc;
                apply_change(&mut doc.upvotes, &mut doc.downvotes, *voter, change);
            }
        }
        debug!(target = %target, ?change, "memory store vote update");
        Ok(())
    }

    async fn toggle_saved(&self, user: &ObjectId, question: &ObjectId) -> Result<bool> {
        let mut entry = self
            .users
            .get_mut(user)
            .filter(|e| !e.doc.metadata.is_deleted)
            .ok_or_else(|| ColloquyError::not_found("user", user.to_hex()))?;
        let saved = &mut entry.doc.saved;
        if saved.contains(question) {
            pull(saved, question);
            Ok(false)
        } else {
            saved.push(*question);
            Ok(true)
        }
    }

    async fn count_questions_by(&self, author: &ObjectId) -> Result<u64> {
        Ok(self
            .questions
            .iter()
            .filter(|e| !e.doc.metadata.is_deleted && e.doc.author == *author)
            .count() as u64)
    }

    async fn count_answers_by(&self, author: &ObjectId) -> Result<u64> {
        Ok(self
            .answers
            .iter()
            .filter(|e| !e.doc.metadata.is_deleted && e.doc.author == *author)
            .count() as u64)
    }

    async fn sum_question_upvotes(&self, author: &ObjectId) -> Result<u64> {
        Ok(self
            .questions
            .iter()
            .filter(|e| !e.doc.metadata.is_deleted && e.doc.author == *author)
            .map(|e| e.doc.upvotes.len() as u64)
            .sum())
    }

    async fn sum_answer_upvotes(&self, author: &ObjectId) -> Result<u64> {
        Ok(self
            .answers
            .iter()
            .filter(|e| !e.doc.metadata.is_deleted && e.doc.author == *author)
            .map(|e| e.doc.upvotes.len() as u64)
            .sum())
    }

    async fn sum_answer_views(&self, author: &ObjectId) -> Result<u64> {
        Ok(self
            .answers
            .iter()
            .filter(|e| !e.doc.metadata.is_deleted && e.doc.author == *author)
            .map(|e| e.doc.views.max(0) as u64)
            .sum())
    }

    async fn find_matching(
        &self,
        kind: SearchKind,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchHit>> {
        let hits = match kind {
            SearchKind::Question => matching(&self.questions, limit, |q: &QuestionDoc| {
                !q.metadata.is_deleted && contains_ignore_case(&q.title, query)
            })
            .into_iter()
            .map(SearchHit::Question)
            .collect(),
            SearchKind::User => matching(&self.users, limit, |u: &UserDoc| {
                !u.metadata.is_deleted && contains_ignore_case(&u.name, query)
            })
            .into_iter()
            .map(SearchHit::User)
            .collect(),
            SearchKind::Answer => matching(&self.answers, limit, |a: &AnswerDoc| {
                !a.metadata.is_deleted && contains_ignore_case(&a.content, query)
            })
            .into_iter()
            .map(SearchHit::Answer)
            .collect(),
            SearchKind::Tag => matching(&self.tags, limit, |t: &TagDoc| {
                !t.metadata.is_deleted && contains_ignore_case(&t.name, query)
            })
            .into_iter()
            .map(SearchHit::Tag)
            .collect(),
        };
        Ok(hits)
    }

    async fn increment_question_views(&self, question: &ObjectId) -> Result<()> {
        let mut entry = self
            .questions
            .get_mut(question)
            .filter(|e| !e.doc.metadata.is_deleted)
            .ok_or_else(|| ColloquyError::not_found("question", question.to_hex()))?;
        entry.doc.views += 1;
        Ok(())
    }

    async fn record_interaction_once(&self, mut interaction: InteractionDoc) -> Result<bool> {
        let mut interactions = self.lock_interactions();
        let exists = interactions.iter().any(|i| {
            i.user == interaction.user
                && i.action == interaction.action
                && i.question == interaction.question
        });
        if exists {
            return Ok(false);
        }
        interaction._id.get_or_insert_with(ObjectId::new);
        interactions.push(interaction);
        Ok(true)
    }

    async fn interaction_tag_names(
        &self,
        user: &ObjectId,
        action: InteractionAction,
    ) -> Result<Vec<String>> {
        let tag_ids: Vec<ObjectId> = self
            .lock_interactions()
            .iter()
            .filter(|i| i.user == *user && i.action == action && !i.metadata.is_deleted)
            .flat_map(|i| i.tags.iter().copied())
            .collect();

        Ok(tag_ids
            .iter()
            .filter_map(|id| self.tags.get(id).map(|t| t.doc.name.clone()))
            .collect())
    }

    async fn popular_tags(&self, limit: usize) -> Result<Vec<TagPopularity>> {
        let mut tags: Vec<(u64, TagPopularity)> = self
            .tags
            .iter()
            .filter(|e| !e.doc.metadata.is_deleted)
            .map(|e| {
                (
                    e.seq,
                    TagPopularity {
                        id: *e.key(),
                        name: e.doc.name.clone(),
                        question_count: e.doc.questions.len() as u64,
                    },
                )
            })
            .collect();
        tags.sort_by(|(a_seq, a), (b_seq, b)| {
            b.question_count
                .cmp(&a.question_count)
                .then(a_seq.cmp(b_seq))
        });
        Ok(tags.into_iter().take(limit).map(|(_, t)| t).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_question() -> (MemoryStore, ObjectId, ObjectId) {
        let store = MemoryStore::new();
        let author = store.insert_user(UserDoc::new("clerk_a", "Ada", "ada"));
        let tag = store.insert_tag(TagDoc::new("rust"));
        let question = store
            .insert_question(QuestionDoc::new("Lifetimes?", author, vec![tag]))
            .unwrap();
        (store, author, question)
    }

    #[test]
    fn test_apply_change_cast_clears_opposite() {
        let voter = ObjectId::new();
        let mut up = vec![];
        let mut down = vec![voter];
        apply_change(&mut up, &mut down, voter, VoteChange::Cast(VoteDirection::Up));
        assert_eq!(up, vec![voter]);
        assert!(down.is_empty());

        // casting again does not duplicate
        apply_change(&mut up, &mut down, voter, VoteChange::Cast(VoteDirection::Up));
        assert_eq!(up.len(), 1);
    }

    #[test]
    fn test_insert_question_registers_tag() {
        let (store, _, question) = store_with_question();
        let tag = store.tags.iter().next().unwrap();
        assert_eq!(tag.doc.questions, vec![question]);
    }

    #[test]
    fn test_insert_answer_requires_question() {
        let store = MemoryStore::new();
        let result = store.insert_answer(AnswerDoc::new(ObjectId::new(), ObjectId::new(), "hi"));
        assert!(matches!(result, Err(ColloquyError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_update_votes_missing_target() {
        let store = MemoryStore::new();
        let result = store
            .update_votes(
                &VoteTarget::answer(ObjectId::new()),
                &ObjectId::new(),
                VoteChange::Cast(VoteDirection::Up),
            )
            .await;
        assert!(matches!(result, Err(ColloquyError::NotFound { entity: "answer", .. })));
    }

    #[tokio::test]
    async fn test_vote_state_hides_deleted_targets() {
        let (store, author, question) = store_with_question();
        let voter = ObjectId::new();

        let tag = store.insert_tag(TagDoc::new("archived"));
        let mut deleted_question = QuestionDoc::new("Gone", author, vec![tag]);
        deleted_question.metadata.is_deleted = true;
        let deleted_question = store.insert_question(deleted_question).unwrap();

        let mut deleted_answer = AnswerDoc::new(author, question, "retracted");
        deleted_answer.metadata.is_deleted = true;
        let deleted_answer = store.insert_answer(deleted_answer).unwrap();

        let result = store
            .vote_state(&VoteTarget::question(deleted_question), &voter)
            .await;
        assert!(matches!(result, Err(ColloquyError::NotFound { entity: "question", .. })));

        let result = store.vote_state(&VoteTarget::answer(deleted_answer), &voter).await;
        assert!(matches!(result, Err(ColloquyError::NotFound { entity: "answer", .. })));

        assert!(store.vote_state(&VoteTarget::question(question), &voter).await.is_ok());
    }

    #[tokio::test]
    async fn test_find_matching_keeps_insertion_order() {
        let (store, author, _) = store_with_question();
        let tag = store.insert_tag(TagDoc::new("async"));
        let second = store
            .insert_question(QuestionDoc::new("More lifetimes", author, vec![tag]))
            .unwrap();

        let hits = store
            .find_matching(SearchKind::Question, "LIFETIMES", 10)
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        match &hits[1] {
            SearchHit::Question(q) => assert_eq!(q._id, Some(second)),
            other => panic!("unexpected hit {:?}", other),
        }

        let capped = store
            .find_matching(SearchKind::Question, "lifetimes", 1)
            .await
            .unwrap();
        assert_eq!(capped.len(), 1);
    }

    #[tokio::test]
    async fn test_record_interaction_once() {
        let (store, author, question) = store_with_question();
        let view = InteractionDoc::new(author, InteractionAction::View).with_question(question);

        assert!(store.record_interaction_once(view.clone()).await.unwrap());
        assert!(!store.record_interaction_once(view).await.unwrap());
        assert_eq!(store.interaction_count(), 1);
    }
}

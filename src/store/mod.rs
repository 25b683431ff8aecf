//! Persistent store collaborator
//!
//! Every service reads and writes through [`ForumStore`]. Implementations own
//! the query syntax, including the read-side joins that hydrate documents, so
//! the services never see store-specific traversal.
//!
//! - [`MongoStore`]: MongoDB collections, used in production
//! - [`MemoryStore`]: in-process maps, used in dev mode and tests

mod memory;
mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

use bson::oid::ObjectId;

use crate::db::schemas::{InteractionAction, InteractionDoc, UserDoc};
use crate::model::{SearchHit, SearchKind, TagPopularity, VoteChange, VoteState, VoteTarget};
use crate::types::Result;

#[async_trait::async_trait]
pub trait ForumStore: Send + Sync {
    /// Look a user up by internal store key
    async fn find_user(&self, id: &ObjectId) -> Result<Option<UserDoc>>;

    /// Look a user up by external identity key
    async fn find_user_by_clerk_id(&self, clerk_id: &str) -> Result<Option<UserDoc>>;

    /// Current vote membership of `voter` on `target`
    async fn vote_state(&self, target: &VoteTarget, voter: &ObjectId) -> Result<VoteState>;

    /// Apply one change to the target's vote sets as a single atomic update
    ///
    /// Fails with `NotFound` when the target does not exist.
    async fn update_votes(
        &self,
        target: &VoteTarget,
        voter: &ObjectId,
        change: VoteChange,
    ) -> Result<()>;

    /// Flip membership of `question` in the user's saved set
    ///
    /// Returns whether the question is saved afterwards. Fails with
    /// `NotFound` when the user does not exist.
    async fn toggle_saved(&self, user: &ObjectId, question: &ObjectId) -> Result<bool>;

    async fn count_questions_by(&self, author: &ObjectId) -> Result<u64>;

    async fn count_answers_by(&self, author: &ObjectId) -> Result<u64>;

    /// Total upvoter-set size across the author's questions, zero when none
    async fn sum_question_upvotes(&self, author: &ObjectId) -> Result<u64>;

    /// Total upvoter-set size across the author's answers, zero when none
    async fn sum_answer_upvotes(&self, author: &ObjectId) -> Result<u64>;

    /// Total view counter across the author's answers, zero when none
    async fn sum_answer_views(&self, author: &ObjectId) -> Result<u64>;

    /// Documents of `kind` whose search field contains `query`, ignoring
    /// case, in natural order, at most `limit`
    async fn find_matching(
        &self,
        kind: SearchKind,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchHit>>;

    /// Increment a question's view counter; `NotFound` when absent
    async fn increment_question_views(&self, question: &ObjectId) -> Result<()>;

    /// Store the interaction unless one with the same user, action and
    /// question exists. Returns whether it was stored.
    async fn record_interaction_once(&self, interaction: InteractionDoc) -> Result<bool>;

    /// Names of the tags attached to the user's interactions of `action`,
    /// one entry per occurrence
    async fn interaction_tag_names(
        &self,
        user: &ObjectId,
        action: InteractionAction,
    ) -> Result<Vec<String>>;

    /// Tags ordered by question count, descending
    async fn popular_tags(&self, limit: usize) -> Result<Vec<TagPopularity>>;
}

//! Reputation and badge aggregation for profile pages

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use super::badges::{BadgeCounts, BadgeCriteriaType, BadgeCriterion, BadgeTable};
use crate::db::schemas::UserDoc;
use crate::store::ForumStore;
use crate::types::{ColloquyError, Result};

/// Profile statistics, recomputed on every request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub user: UserDoc,
    pub total_questions: u64,
    pub total_answers: u64,
    pub badge_counts: BadgeCounts,
    pub reputation: i64,
}

pub struct ReputationAggregator {
    store: Arc<dyn ForumStore>,
    badges: Arc<BadgeTable>,
}

impl ReputationAggregator {
    pub fn new(store: Arc<dyn ForumStore>, badges: Arc<BadgeTable>) -> Self {
        Self { store, badges }
    }

    pub fn badge_table(&self) -> &BadgeTable {
        &self.badges
    }

    /// Aggregate authored content, votes and views for the user with the
    /// given external identity key
    pub async fn compute_user_stats(&self, clerk_id: &str) -> Result<UserStats> {
        let user = self
            .store
            .find_user_by_clerk_id(clerk_id)
            .await?
            .ok_or_else(|| ColloquyError::not_found("user", clerk_id))?;
        let user_id = user
            ._id
            .ok_or_else(|| ColloquyError::not_found("user", clerk_id))?;

        let (total_questions, total_answers, question_upvotes, answer_upvotes, answer_views) = tokio::try_join!(
            self.store.count_questions_by(&user_id),
            self.store.count_answers_by(&user_id),
            self.store.sum_question_upvotes(&user_id),
            self.store.sum_answer_upvotes(&user_id),
            self.store.sum_answer_views(&user_id),
        )?;

        // Views come from the user's answers, not their questions
        let criteria = [
            BadgeCriterion::new(BadgeCriteriaType::QuestionCount, total_questions),
            BadgeCriterion::new(BadgeCriteriaType::AnswerCount, total_answers),
            BadgeCriterion::new(BadgeCriteriaType::QuestionUpvotes, question_upvotes),
            BadgeCriterion::new(BadgeCriteriaType::AnswerUpvotes, answer_upvotes),
            BadgeCriterion::new(BadgeCriteriaType::TotalViews, answer_views),
        ];
        debug!(clerk_id, ?criteria, "Badge criteria computed");

        let badge_counts = self.badges.assign_badges(&criteria);
        let reputation = user.reputation;

        info!(
            clerk_id,
            total_questions,
            total_answers,
            bronze = badge_counts.bronze,
            silver = badge_counts.silver,
            gold = badge_counts.gold,
            "User stats computed"
        );

        Ok(UserStats {
            user,
            total_questions,
            total_answers,
            badge_counts,
            reputation,
        })
    }
}

//! Question view counting

use bson::oid::ObjectId;
use std::sync::Arc;
use tracing::debug;

use crate::db::schemas::{InteractionAction, InteractionDoc};
use crate::store::ForumStore;
use crate::types::Result;

pub struct ViewTracker {
    store: Arc<dyn ForumStore>,
}

impl ViewTracker {
    pub fn new(store: Arc<dyn ForumStore>) -> Self {
        Self { store }
    }

    /// Count a view of `question`
    ///
    /// The counter always increments. A signed-in viewer additionally gets a
    /// `view` interaction, recorded at most once per question. Returns whether
    /// that interaction was newly recorded.
    pub async fn view_question(&self, question: &ObjectId, viewer: Option<&ObjectId>) -> Result<bool> {
        self.store.increment_question_views(question).await?;

        let Some(viewer) = viewer else {
            return Ok(false);
        };

        let interaction = InteractionDoc::new(*viewer, InteractionAction::View).with_question(*question);
        let recorded = self.store.record_interaction_once(interaction).await?;

        debug!(
            question = %question.to_hex(),
            viewer = %viewer.to_hex(),
            recorded,
            "Question viewed"
        );
        Ok(recorded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schemas::{QuestionDoc, TagDoc, UserDoc};
    use crate::store::MemoryStore;
    use crate::types::ColloquyError;

    fn setup() -> (Arc<MemoryStore>, ViewTracker, ObjectId, ObjectId) {
        let store = Arc::new(MemoryStore::new());
        let user = store.insert_user(UserDoc::new("clerk_w", "Wes", "wes"));
        let tag = store.insert_tag(TagDoc::new("views"));
        let question = store
            .insert_question(QuestionDoc::new("Seen?", user, vec![tag]))
            .unwrap();
        let tracker = ViewTracker::new(store.clone());
        (store, tracker, user, question)
    }

    #[tokio::test]
    async fn test_views_always_increment() {
        let (store, tracker, user, question) = setup();

        assert!(tracker.view_question(&question, Some(&user)).await.unwrap());
        assert!(!tracker.view_question(&question, Some(&user)).await.unwrap());
        assert!(!tracker.view_question(&question, None).await.unwrap());

        assert_eq!(store.question(&question).unwrap().views, 3);
        assert_eq!(store.interaction_count(), 1);
    }

    #[tokio::test]
    async fn test_distinct_viewers_each_recorded() {
        let (store, tracker, user, question) = setup();
        let other = ObjectId::new();

        tracker.view_question(&question, Some(&user)).await.unwrap();
        tracker.view_question(&question, Some(&other)).await.unwrap();

        assert_eq!(store.interaction_count(), 2);
    }

    #[tokio::test]
    async fn test_missing_question() {
        let (store, tracker, user, _) = setup();
        let result = tracker.view_question(&ObjectId::new(), Some(&user)).await;

        assert!(matches!(result, Err(ColloquyError::NotFound { entity: "question", .. })));
        assert_eq!(store.interaction_count(), 0);
    }
}

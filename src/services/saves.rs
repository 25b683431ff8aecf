//! Saved-question toggling

use bson::oid::ObjectId;
use std::sync::Arc;
use tracing::info;

use crate::cache::PathInvalidator;
use crate::store::ForumStore;
use crate::types::Result;

pub struct SaveSet {
    store: Arc<dyn ForumStore>,
    invalidator: Arc<dyn PathInvalidator>,
}

impl SaveSet {
    pub fn new(store: Arc<dyn ForumStore>, invalidator: Arc<dyn PathInvalidator>) -> Self {
        Self { store, invalidator }
    }

    /// Save the question if it is not saved, unsave it otherwise
    ///
    /// Returns the saved state after the toggle.
    pub async fn toggle_save(&self, user: &ObjectId, question: &ObjectId, path: &str) -> Result<bool> {
        let saved = self.store.toggle_saved(user, question).await?;
        self.invalidator.invalidate(path);

        info!(
            user = %user.to_hex(),
            question = %question.to_hex(),
            saved,
            "Saved questions toggled"
        );
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::RevalidationRegistry;
    use crate::db::schemas::UserDoc;
    use crate::store::MemoryStore;
    use crate::types::ColloquyError;

    fn setup() -> (Arc<MemoryStore>, Arc<RevalidationRegistry>, SaveSet, ObjectId) {
        let store = Arc::new(MemoryStore::new());
        let user = store.insert_user(UserDoc::new("clerk_s", "Sam", "sam"));
        let registry = Arc::new(RevalidationRegistry::new());
        let saves = SaveSet::new(store.clone(), registry.clone());
        (store, registry, saves, user)
    }

    #[tokio::test]
    async fn test_toggle_parity() {
        let (store, _, saves, user) = setup();
        let question = ObjectId::new();

        for n in 1..=5 {
            let saved = saves.toggle_save(&user, &question, "/q").await.unwrap();
            assert_eq!(saved, n % 2 == 1);
            assert_eq!(store.user(&user).unwrap().has_saved(&question), n % 2 == 1);
        }
    }

    #[tokio::test]
    async fn test_toggle_never_duplicates() {
        let (store, _, saves, user) = setup();
        let first = ObjectId::new();
        let second = ObjectId::new();

        saves.toggle_save(&user, &first, "/q").await.unwrap();
        saves.toggle_save(&user, &second, "/q").await.unwrap();
        saves.toggle_save(&user, &first, "/q").await.unwrap();
        saves.toggle_save(&user, &first, "/q").await.unwrap();

        let saved = store.user(&user).unwrap().saved;
        assert_eq!(saved.len(), 2);
        assert!(saved.contains(&first) && saved.contains(&second));
    }

    #[tokio::test]
    async fn test_missing_user() {
        let (_, registry, saves, _) = setup();
        let result = saves.toggle_save(&ObjectId::new(), &ObjectId::new(), "/q").await;
        assert!(matches!(result, Err(ColloquyError::NotFound { entity: "user", .. })));
        assert_eq!(registry.generation("/q"), 0);
    }

    #[tokio::test]
    async fn test_toggle_invalidates_path() {
        let (_, registry, saves, user) = setup();
        saves.toggle_save(&user, &ObjectId::new(), "/collection").await.unwrap();
        assert_eq!(registry.generation("/collection"), 1);
    }
}

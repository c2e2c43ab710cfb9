//! In-memory challenge store.
//!
//! Backs the test suite and ephemeral deployments. Evaluates the same
//! `ChallengeFilter` predicates as the Mongo store, and counts saves so
//! tests can assert that a failed mutation wrote nothing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use bson::oid::ObjectId;

use crate::db::schemas::Challenge;
use crate::store::{ChallengeFilter, ChallengeStore, SortOrder};
use crate::types::{GauntletError, Result};

/// Challenge store holding aggregates in a map
#[derive(Default)]
pub struct MemoryChallengeStore {
    items: RwLock<HashMap<ObjectId, Challenge>>,
    save_count: AtomicU64,
}

impl MemoryChallengeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of saves performed since construction
    pub fn save_count(&self) -> u64 {
        self.save_count.load(Ordering::Relaxed)
    }

    fn lock_poisoned() -> GauntletError {
        GauntletError::Database("memory store lock poisoned".to_string())
    }
}

#[async_trait]
impl ChallengeStore for MemoryChallengeStore {
    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Challenge>> {
        let items = self.items.read().map_err(|_| Self::lock_poisoned())?;
        Ok(items.get(&id).cloned())
    }

    async fn find_many(
        &self,
        filter: ChallengeFilter,
        sort: SortOrder,
        limit: usize,
    ) -> Result<Vec<Challenge>> {
        let items = self.items.read().map_err(|_| Self::lock_poisoned())?;
        let mut matched: Vec<Challenge> = items
            .values()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect();

        match sort {
            SortOrder::BoostDesc => {
                matched.sort_by(|a, b| b.boost.total_cmp(&a.boost).then(a.id.cmp(&b.id)))
            }
            SortOrder::ViewsDesc => {
                matched.sort_by(|a, b| b.views.cmp(&a.views).then(a.id.cmp(&b.id)))
            }
        }

        matched.truncate(limit);
        Ok(matched)
    }

    async fn exists(&self, filter: ChallengeFilter) -> Result<bool> {
        let items = self.items.read().map_err(|_| Self::lock_poisoned())?;
        Ok(items.values().any(|c| filter.matches(c)))
    }

    async fn save(&self, challenge: &Challenge) -> Result<()> {
        let mut items = self.items.write().map_err(|_| Self::lock_poisoned())?;
        items.insert(challenge.id, challenge.clone());
        self.save_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(tag: &str, boost: f64, views: i64) -> Challenge {
        let mut c = Challenge::new(tag, ObjectId::new());
        c.boost = boost;
        c.views = views;
        c
    }

    #[tokio::test]
    async fn test_save_and_reload() {
        let store = MemoryChallengeStore::new();
        let challenge = seeded("x", 0.0, 3);
        store.save(&challenge).await.unwrap();

        let loaded = store.find_by_id(challenge.id).await.unwrap().unwrap();
        assert_eq!(loaded.tag, "x");
        assert_eq!(store.save_count(), 1);

        // Save replaces the whole aggregate
        let mut updated = loaded;
        updated.views = 9;
        store.save(&updated).await.unwrap();
        let reloaded = store.find_by_id(challenge.id).await.unwrap().unwrap();
        assert_eq!(reloaded.views, 9);
        assert_eq!(store.save_count(), 2);
    }

    #[tokio::test]
    async fn test_find_many_sorts_and_limits() {
        let store = MemoryChallengeStore::new();
        for (boost, views) in [(0.0, 7), (5.0, 0), (3.0, 0), (0.0, 10)] {
            store.save(&seeded("x", boost, views)).await.unwrap();
        }

        let boosted = store
            .find_many(
                ChallengeFilter::by_tags(&["x".to_string()]).with_boost_gt(0.0),
                SortOrder::BoostDesc,
                10,
            )
            .await
            .unwrap();
        let boosts: Vec<f64> = boosted.iter().map(|c| c.boost).collect();
        assert_eq!(boosts, vec![5.0, 3.0]);

        let standard = store
            .find_many(
                ChallengeFilter::by_tags(&["x".to_string()]).with_boost_eq(0.0),
                SortOrder::ViewsDesc,
                1,
            )
            .await
            .unwrap();
        assert_eq!(standard.len(), 1);
        assert_eq!(standard[0].views, 10);
    }

    #[tokio::test]
    async fn test_exists_respects_filter() {
        let store = MemoryChallengeStore::new();
        store.save(&seeded("x", 2.0, 0)).await.unwrap();

        assert!(store
            .exists(ChallengeFilter::by_tags(&["x".to_string()]).with_boost_gt(0.0))
            .await
            .unwrap());
        assert!(!store
            .exists(ChallengeFilter::by_tags(&["x".to_string()]).with_boost_eq(0.0))
            .await
            .unwrap());
    }
}

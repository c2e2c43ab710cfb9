//! MongoDB-backed challenge store.

use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use tracing::debug;

use crate::db::mongo::{MongoClient, MongoCollection};
use crate::db::schemas::{Challenge, CHALLENGE_COLLECTION};
use crate::store::{ChallengeFilter, ChallengeStore, SortOrder};
use crate::types::Result;

/// Challenge store over a MongoDB collection
#[derive(Clone)]
pub struct MongoChallengeStore {
    collection: MongoCollection<Challenge>,
}

impl MongoChallengeStore {
    /// Open the challenge collection and apply its indexes
    pub async fn new(client: &MongoClient) -> Result<Self> {
        let collection = client.collection::<Challenge>(CHALLENGE_COLLECTION).await?;
        Ok(Self { collection })
    }
}

#[async_trait]
impl ChallengeStore for MongoChallengeStore {
    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Challenge>> {
        self.collection.find_one(doc! { "_id": id }).await
    }

    async fn find_many(
        &self,
        filter: ChallengeFilter,
        sort: SortOrder,
        limit: usize,
    ) -> Result<Vec<Challenge>> {
        let filter_doc = filter.to_document();
        debug!(?sort, limit, "challenge query: {}", filter_doc);
        self.collection
            .find_sorted(filter_doc, sort.to_document(), limit as i64)
            .await
    }

    async fn exists(&self, filter: ChallengeFilter) -> Result<bool> {
        self.collection.exists(filter.to_document()).await
    }

    async fn save(&self, challenge: &Challenge) -> Result<()> {
        self.collection
            .upsert(doc! { "_id": challenge.id }, challenge)
            .await
    }
}

#[cfg(test)]
mod tests {
    // Integration tests require a running MongoDB instance; filter
    // rendering and store semantics are covered against the in-memory
    // implementation, which evaluates the same predicates.
}

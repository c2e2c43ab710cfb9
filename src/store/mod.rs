//! Persistence collaborator for challenge aggregates.
//!
//! The read paths and the mutation layer consume this minimal interface;
//! the storage engine behind it is interchangeable. `MongoChallengeStore`
//! backs production, `MemoryChallengeStore` backs tests and ephemeral
//! deployments.

pub mod filter;
pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Document};

use crate::db::schemas::Challenge;
use crate::types::Result;

pub use filter::ChallengeFilter;
pub use memory::MemoryChallengeStore;
pub use mongo::MongoChallengeStore;

/// Sort order for `find_many`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Boost descending, id ascending within equal boosts
    BoostDesc,
    /// Views descending, id ascending within equal view counts
    ViewsDesc,
}

impl SortOrder {
    /// Render as a MongoDB sort document. The id tie-breaker keeps the
    /// order total, which cursor pagination depends on.
    pub fn to_document(self) -> Document {
        match self {
            SortOrder::BoostDesc => doc! { "boost": -1, "_id": 1 },
            SortOrder::ViewsDesc => doc! { "views": -1, "_id": 1 },
        }
    }
}

/// Query interface over the challenge collection.
///
/// One aggregate per challenge; loads and saves are whole-document.
/// Implementations do not retry failures; a failed call surfaces as
/// `GauntletError::Database` and the retry decision stays with the
/// caller.
#[async_trait]
pub trait ChallengeStore: Send + Sync {
    /// Load one aggregate by root id
    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Challenge>>;

    /// Find aggregates matching the filter, sorted and limited
    async fn find_many(
        &self,
        filter: ChallengeFilter,
        sort: SortOrder,
        limit: usize,
    ) -> Result<Vec<Challenge>>;

    /// Whether any aggregate matches the filter
    async fn exists(&self, filter: ChallengeFilter) -> Result<bool>;

    /// Persist a whole aggregate (insert or replace)
    async fn save(&self, challenge: &Challenge) -> Result<()>;
}

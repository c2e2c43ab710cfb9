//! Boost-prioritized cursor pagination.
//!
//! Lists challenges for a tag set as a two-tier page: editorially
//! boosted challenges first (boost descending), then standard ones
//! (views descending) backfilling the remainder. Cursors carry the last
//! edge's `{id, boost, views}` and are resubmitted verbatim; the id
//! lower bound breaks ties within a rank value, assuming ids are
//! monotonic with insertion.

use bson::oid::ObjectId;
use futures::join;
use tracing::debug;

use crate::db::schemas::Challenge;
use crate::store::{ChallengeFilter, ChallengeStore, SortOrder};
use crate::types::{GauntletError, Result};

/// Opaque pagination token: the last seen edge's ranking fields
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cursor {
    pub id: ObjectId,
    pub boost: f64,
    pub views: i64,
}

impl Cursor {
    fn of(challenge: &Challenge) -> Self {
        Self {
            id: challenge.id,
            boost: challenge.boost,
            views: challenge.views,
        }
    }
}

/// One page entry
#[derive(Debug, Clone)]
pub struct ChallengeEdge {
    pub cursor: Cursor,
    pub node: Challenge,
}

/// Forward-paging metadata.
///
/// `has_next_page_boosted_results` reports whether the boosted tier
/// specifically has more entries; it is `None` when the request did not
/// prioritize boosted results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    pub has_next_page: bool,
    pub has_next_page_boosted_results: Option<bool>,
}

/// A page of challenges plus paging metadata
#[derive(Debug, Clone)]
pub struct ChallengeConnection {
    pub edges: Vec<ChallengeEdge>,
    pub page_info: PageInfo,
}

/// Parameters for one `list_by_tags` call
#[derive(Debug, Clone)]
pub struct ListByTags {
    /// Tag set; a challenge matches when its tag is in the set
    pub tags: Vec<String>,
    /// Requested page size; clamped to the engine's maximum
    pub first: usize,
    /// Resume after this edge
    pub after: Option<Cursor>,
    /// Rank boosted challenges ahead of the views ordering
    pub prioritize_boosted: bool,
}

/// Cursor-paginated challenge listing over a store
pub struct PaginationEngine<'a> {
    store: &'a dyn ChallengeStore,
    max_page_size: usize,
}

impl<'a> PaginationEngine<'a> {
    pub fn new(store: &'a dyn ChallengeStore, max_page_size: usize) -> Self {
        Self {
            store,
            max_page_size,
        }
    }

    /// List challenges matching `request.tags` as one page.
    ///
    /// The page is the concatenation of the boosted tier (when
    /// prioritized) and the standard tier, each keeping its own order.
    /// Deactivated challenges are not filtered here; visibility is the
    /// caller's concern.
    pub async fn list_by_tags(&self, request: ListByTags) -> Result<ChallengeConnection> {
        validate(&request)?;
        let first = request.first.min(self.max_page_size);
        let tags = &request.tags;
        debug!(
            ?tags,
            first,
            prioritized = request.prioritize_boosted,
            has_cursor = request.after.is_some(),
            "listing challenges"
        );

        let mut page = if request.prioritize_boosted {
            // Both tiers are queried concurrently with the full page
            // size; the standard tier is truncated to the shortfall
            // after the merge point is known.
            let (boosted, standard) = join!(
                self.store
                    .find_many(boosted_tier(tags, request.after), SortOrder::BoostDesc, first),
                self.store.find_many(
                    standard_tier(tags, request.after, true),
                    SortOrder::ViewsDesc,
                    first,
                ),
            );
            let mut page = boosted?;
            let mut standard = standard?;
            standard.truncate(first - page.len());
            page.append(&mut standard);
            page
        } else {
            self.store
                .find_many(
                    standard_tier(tags, request.after, false),
                    SortOrder::ViewsDesc,
                    first,
                )
                .await?
        };

        page.truncate(first);
        let full = page.len() == first;
        let page_info = self.page_info(&request, full, page.last()).await?;
        let edges = page
            .into_iter()
            .map(|node| ChallengeEdge {
                cursor: Cursor::of(&node),
                node,
            })
            .collect::<Vec<_>>();

        Ok(ChallengeConnection { edges, page_info })
    }

    /// Decide the paging metadata from the page's last entry.
    ///
    /// Only a full page can have a next page; the standard tier
    /// backfills every shortfall, so a short page means both tiers ran
    /// dry.
    async fn page_info(
        &self,
        request: &ListByTags,
        full: bool,
        last: Option<&Challenge>,
    ) -> Result<PageInfo> {
        let last = match last {
            Some(last) if full => last,
            _ => {
                return Ok(PageInfo {
                    has_next_page: false,
                    has_next_page_boosted_results: request.prioritize_boosted.then_some(false),
                })
            }
        };

        if !request.prioritize_boosted {
            let has_next = self
                .store
                .exists(
                    ChallengeFilter::by_tags(&request.tags)
                        .with_views_lte(last.views)
                        .with_id_gt(last.id),
                )
                .await?;
            return Ok(PageInfo {
                has_next_page: has_next,
                has_next_page_boosted_results: None,
            });
        }

        if last.boost > 0.0 {
            // Still inside the boosted tier: more boosted entries, or
            // any standard entries at all, mean another page.
            let boosted_remaining = self
                .store
                .exists(
                    ChallengeFilter::by_tags(&request.tags)
                        .with_boost_gt(0.0)
                        .with_boost_lte(last.boost)
                        .with_id_gt(last.id),
                )
                .await?;
            let has_next = boosted_remaining
                || self
                    .store
                    .exists(ChallengeFilter::by_tags(&request.tags).with_boost_eq(0.0))
                    .await?;
            Ok(PageInfo {
                has_next_page: has_next,
                has_next_page_boosted_results: Some(boosted_remaining),
            })
        } else {
            // The page ended in the standard tier; the boosted tier is
            // behind the cursor for good.
            let has_next = self
                .store
                .exists(
                    ChallengeFilter::by_tags(&request.tags)
                        .with_boost_eq(0.0)
                        .with_id_gt(last.id),
                )
                .await?;
            Ok(PageInfo {
                has_next_page: has_next,
                has_next_page_boosted_results: Some(false),
            })
        }
    }
}

/// Boosted-tier predicate: boosted challenges at or below the cursor's
/// boost, after the cursor's id. A cursor taken in the standard tier
/// has boost 0, which leaves this tier empty.
fn boosted_tier(tags: &[String], after: Option<Cursor>) -> ChallengeFilter {
    let mut filter = ChallengeFilter::by_tags(tags).with_boost_gt(0.0);
    if let Some(cursor) = after {
        filter = filter.with_boost_lte(cursor.boost).with_id_gt(cursor.id);
    }
    filter
}

/// Standard-tier predicate. The cursor bounds apply only once paging
/// has crossed into this tier (cursor boost 0); a cursor still in the
/// boosted tier must not constrain the backfill, or high-view standard
/// entries would be skipped.
fn standard_tier(tags: &[String], after: Option<Cursor>, prioritized: bool) -> ChallengeFilter {
    let mut filter = ChallengeFilter::by_tags(tags);
    if prioritized {
        filter = filter.with_boost_eq(0.0);
    }
    match after {
        Some(cursor) if !prioritized || cursor.boost == 0.0 => {
            filter.with_views_lte(cursor.views).with_id_gt(cursor.id)
        }
        _ => filter,
    }
}

fn validate(request: &ListByTags) -> Result<()> {
    if request.first == 0 {
        return Err(GauntletError::InvalidPageRequest(
            "page size must be at least 1".to_string(),
        ));
    }
    if request.tags.is_empty() {
        return Err(GauntletError::InvalidPageRequest(
            "tag set must not be empty".to_string(),
        ));
    }
    if request.tags.iter().any(|t| t.is_empty()) {
        return Err(GauntletError::InvalidPageRequest(
            "tags must not be empty strings".to_string(),
        ));
    }
    if let Some(cursor) = &request.after {
        if !cursor.boost.is_finite() || cursor.boost < 0.0 {
            return Err(GauntletError::InvalidPageRequest(
                "cursor boost must be a non-negative number".to_string(),
            ));
        }
        if cursor.views < 0 {
            return Err(GauntletError::InvalidPageRequest(
                "cursor views must be non-negative".to_string(),
            ));
        }
    }
    Ok(())
}

//! Query predicate over challenge aggregates.
//!
//! Captures exactly the operator shapes the read paths need: tag
//! set-membership, open/closed bounds on boost and views, an id lower
//! bound, and a disjunction of sub-predicates. Renders to a MongoDB
//! filter document and evaluates directly against in-memory aggregates,
//! so both store implementations answer identically.

use bson::{doc, oid::ObjectId, Document};

use crate::db::schemas::Challenge;

/// Conjunctive filter with an optional `$or` arm.
///
/// All set fields must hold; `any_of`, when present, additionally
/// requires at least one sub-filter to hold.
#[derive(Debug, Clone, Default)]
pub struct ChallengeFilter {
    /// `tag $in` the given set
    pub tags: Option<Vec<String>>,

    /// `boost >` bound (exclusive)
    pub boost_gt: Option<f64>,

    /// `boost <=` bound (inclusive)
    pub boost_lte: Option<f64>,

    /// Exact boost value
    pub boost_eq: Option<f64>,

    /// `views <=` bound (inclusive)
    pub views_lte: Option<i64>,

    /// `_id >` bound (exclusive); the pagination tie-breaker
    pub id_gt: Option<ObjectId>,

    /// `$or` of sub-filters
    pub any_of: Option<Vec<ChallengeFilter>>,
}

impl ChallengeFilter {
    /// Filter by tag membership
    pub fn by_tags(tags: &[String]) -> Self {
        Self {
            tags: Some(tags.to_vec()),
            ..Default::default()
        }
    }

    /// Require boost strictly greater than `bound`
    pub fn with_boost_gt(mut self, bound: f64) -> Self {
        self.boost_gt = Some(bound);
        self
    }

    /// Require boost at most `bound`
    pub fn with_boost_lte(mut self, bound: f64) -> Self {
        self.boost_lte = Some(bound);
        self
    }

    /// Require an exact boost value
    pub fn with_boost_eq(mut self, value: f64) -> Self {
        self.boost_eq = Some(value);
        self
    }

    /// Require views at most `bound`
    pub fn with_views_lte(mut self, bound: i64) -> Self {
        self.views_lte = Some(bound);
        self
    }

    /// Require id strictly greater than `id`
    pub fn with_id_gt(mut self, id: ObjectId) -> Self {
        self.id_gt = Some(id);
        self
    }

    /// Disjunction of sub-filters
    pub fn any_of(filters: Vec<ChallengeFilter>) -> Self {
        Self {
            any_of: Some(filters),
            ..Default::default()
        }
    }

    /// Convert to a MongoDB filter document
    pub fn to_document(&self) -> Document {
        let mut filter = doc! {};

        if let Some(ref tags) = self.tags {
            filter.insert("tag", doc! { "$in": tags });
        }

        let mut boost = doc! {};
        if let Some(gt) = self.boost_gt {
            boost.insert("$gt", gt);
        }
        if let Some(lte) = self.boost_lte {
            boost.insert("$lte", lte);
        }
        if !boost.is_empty() {
            filter.insert("boost", boost);
        }
        if let Some(eq) = self.boost_eq {
            filter.insert("boost", eq);
        }

        if let Some(lte) = self.views_lte {
            filter.insert("views", doc! { "$lte": lte });
        }

        if let Some(id) = self.id_gt {
            filter.insert("_id", doc! { "$gt": id });
        }

        if let Some(ref arms) = self.any_of {
            let sub: Vec<Document> = arms.iter().map(|f| f.to_document()).collect();
            filter.insert("$or", sub);
        }

        filter
    }

    /// Evaluate against an in-memory aggregate
    pub fn matches(&self, challenge: &Challenge) -> bool {
        if let Some(ref tags) = self.tags {
            if !tags.iter().any(|t| *t == challenge.tag) {
                return false;
            }
        }
        if let Some(gt) = self.boost_gt {
            if challenge.boost <= gt {
                return false;
            }
        }
        if let Some(lte) = self.boost_lte {
            if challenge.boost > lte {
                return false;
            }
        }
        if let Some(eq) = self.boost_eq {
            if challenge.boost != eq {
                return false;
            }
        }
        if let Some(lte) = self.views_lte {
            if challenge.views > lte {
                return false;
            }
        }
        if let Some(id) = self.id_gt {
            if challenge.id <= id {
                return false;
            }
        }
        if let Some(ref arms) = self.any_of {
            if !arms.iter().any(|f| f.matches(challenge)) {
                return false;
            }
        }
        true
    }
}

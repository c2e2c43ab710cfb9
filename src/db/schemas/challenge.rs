//! Challenge aggregate schema.
//!
//! The four-level tree: Challenge -> Submission -> Reply, with Edits
//! hanging off every post level. All of it is embedded in one document.
//! Child ids are generated at append time and are unique within their
//! containing list, not globally.

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::IntoIndexes;
use crate::db::schemas::content::Content;
use crate::types::{GauntletError, Result};

/// Collection name for challenge aggregates
pub const CHALLENGE_COLLECTION: &str = "challenges";

fn default_true() -> bool {
    true
}

/// Fields shared by every post level (challenge, submission, reply),
/// embedded as a `post` subdocument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostFields {
    /// Authoring user; immutable after creation
    pub poster_id: ObjectId,

    /// Soft-delete flag; posts are deactivated, never removed
    #[serde(default = "default_true")]
    pub is_active: bool,

    /// Set once at creation
    pub created_at: DateTime,

    /// Append-only content list
    #[serde(default)]
    pub content: Vec<Content>,

    /// Edits posted against this post
    #[serde(default)]
    pub edits: Vec<Edit>,
}

impl PostFields {
    /// New post fields for the given author
    pub fn new(poster_id: ObjectId) -> Self {
        Self {
            poster_id,
            is_active: true,
            created_at: DateTime::now(),
            content: Vec::new(),
            edits: Vec::new(),
        }
    }
}

/// An edit of a post. Same shape as a post minus author and child
/// posts; its content list follows the same append-only rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edit {
    pub id: ObjectId,

    #[serde(default = "default_true")]
    pub is_active: bool,

    pub created_at: DateTime,

    #[serde(default)]
    pub content: Vec<Content>,
}

impl Edit {
    pub fn new() -> Self {
        Self {
            id: ObjectId::new(),
            is_active: true,
            created_at: DateTime::now(),
            content: Vec::new(),
        }
    }
}

impl Default for Edit {
    fn default() -> Self {
        Self::new()
    }
}

/// A reply to a submission; leaf post level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    pub id: ObjectId,
    pub post: PostFields,
}

impl Reply {
    pub fn new(poster_id: ObjectId) -> Self {
        Self {
            id: ObjectId::new(),
            post: PostFields::new(poster_id),
        }
    }
}

/// A submission answering a challenge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: ObjectId,
    pub post: PostFields,

    #[serde(default)]
    pub replies: Vec<Reply>,
}

impl Submission {
    pub fn new(poster_id: ObjectId) -> Self {
        Self {
            id: ObjectId::new(),
            post: PostFields::new(poster_id),
            replies: Vec::new(),
        }
    }

    /// Find a reply by id
    pub fn reply(&self, id: ObjectId) -> Option<&Reply> {
        self.replies.iter().find(|r| r.id == id)
    }
}

/// Root of the tree and the unit of load/save.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Challenge {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    /// Filtering label; set once
    pub tag: String,

    /// Popularity counter, incremented by the view-tracking
    /// collaborator; never decreases
    pub views: i64,

    /// Editorial ranking weight; 0 means not boosted
    pub boost: f64,

    pub post: PostFields,

    #[serde(default)]
    pub submissions: Vec<Submission>,
}

impl Challenge {
    /// New challenge with zero views and no boost
    pub fn new(tag: impl Into<String>, poster_id: ObjectId) -> Self {
        Self {
            id: ObjectId::new(),
            tag: tag.into(),
            views: 0,
            boost: 0.0,
            post: PostFields::new(poster_id),
            submissions: Vec::new(),
        }
    }

    /// Find a submission by id
    pub fn submission(&self, id: ObjectId) -> Option<&Submission> {
        self.submissions.iter().find(|s| s.id == id)
    }
}

impl IntoIndexes for Challenge {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Index by tag
            (doc! { "tag": 1 }, None),
            // Compound indexes backing the two pagination tiers
            (doc! { "tag": 1, "boost": -1, "_id": 1 }, None),
            (doc! { "tag": 1, "views": -1, "_id": 1 }, None),
        ]
    }
}

/// Append a content item, enforcing the per-post cap.
///
/// The cap applies on append only; a list already over a lowered cap is
/// left as it is.
pub fn append_content(list: &mut Vec<Content>, item: Content, limit: usize) -> Result<ObjectId> {
    if list.len() >= limit {
        return Err(GauntletError::ContentLimitExceeded { limit });
    }
    let id = item.id();
    list.push(item);
    Ok(id)
}

/// Soft-delete a content item by id. Returns the deactivated id, or
/// `None` when the id is absent (the caller builds the path-specific
/// not-found error).
pub fn deactivate_content(list: &mut [Content], content_id: ObjectId) -> Option<ObjectId> {
    let item = list.iter_mut().find(|c| c.id() == content_id)?;
    item.deactivate();
    Some(content_id)
}

/// Append a fresh edit to a post and return its id
pub fn append_edit(post: &mut PostFields) -> ObjectId {
    let edit = Edit::new();
    let id = edit.id;
    post.edits.push(edit);
    id
}

/// Find an edit by id within a post's edit list
pub fn find_edit(edits: &[Edit], id: ObjectId) -> Option<&Edit> {
    edits.iter().find(|e| e.id == id)
}

//! Crate-wide error type and result alias.

use bson::oid::ObjectId;
use thiserror::Error;

use crate::path::PathKind;

/// Error type for all gauntlet operations.
///
/// Every variant is recoverable; the transport layer maps them to
/// structured user-facing errors. The not-found variants carry every id
/// that was already consumed while walking the tree, so callers can see
/// exactly which level failed.
#[derive(Debug, Error)]
pub enum GauntletError {
    /// Root aggregate absent
    #[error("challenge not found: {0}")]
    ChallengeNotFound(ObjectId),

    /// Submission id absent in the loaded challenge
    #[error("submission {submission_id} not found in challenge {challenge_id}")]
    SubmissionNotFound {
        challenge_id: ObjectId,
        submission_id: ObjectId,
    },

    /// Reply id absent in the resolved submission
    #[error(
        "reply {reply_id} not found in challenge {challenge_id}, submission {submission_id}"
    )]
    ReplyNotFound {
        challenge_id: ObjectId,
        submission_id: ObjectId,
        reply_id: ObjectId,
    },

    /// Edit id absent on the resolved post
    #[error(
        "edit {edit_id} not found in challenge {challenge_id} (submission: {submission_id:?}, reply: {reply_id:?})"
    )]
    EditNotFound {
        challenge_id: ObjectId,
        submission_id: Option<ObjectId>,
        reply_id: Option<ObjectId>,
        edit_id: ObjectId,
    },

    /// Content id absent on the resolved post
    #[error(
        "content {content_id} not found in challenge {challenge_id} (submission: {submission_id:?}, reply: {reply_id:?}, edit: {edit_id:?})"
    )]
    ContentNotFound {
        challenge_id: ObjectId,
        submission_id: Option<ObjectId>,
        reply_id: Option<ObjectId>,
        edit_id: Option<ObjectId>,
        content_id: ObjectId,
    },

    /// Caller contract violation: the requested path kind needs an id
    /// that was not supplied. Not a user-facing not-found.
    #[error("invalid path for {kind:?}: missing {missing}")]
    InvalidPath {
        kind: PathKind,
        missing: &'static str,
    },

    /// A user may not submit on their own challenge
    #[error("user {poster_id} cannot submit on own challenge {challenge_id}")]
    SelfSubmissionForbidden {
        poster_id: ObjectId,
        challenge_id: ObjectId,
    },

    /// Append would exceed the configured per-post content cap
    #[error("content limit exceeded: at most {limit} items per post")]
    ContentLimitExceeded { limit: usize },

    /// Pagination input validation failure
    #[error("invalid page request: {0}")]
    InvalidPageRequest(String),

    /// Persistence collaborator unavailable (connection loss, timeout).
    /// Never retried here; the retry decision belongs to the caller.
    #[error("database error: {0}")]
    Database(String),
}

impl From<mongodb::error::Error> for GauntletError {
    fn from(e: mongodb::error::Error) -> Self {
        GauntletError::Database(e.to_string())
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, GauntletError>;

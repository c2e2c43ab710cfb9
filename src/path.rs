//! Tree-path resolution.
//!
//! Resolves a chain of ids (challenge, then optionally submission,
//! reply, edit) to the exact node in one loaded aggregate. The walk
//! loads exactly one document and never mutates; at each level a missing
//! child fails with an error carrying every id consumed so far, so the
//! transport layer can report precisely where the path broke.

use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::db::schemas::{Challenge, Content, Edit, PostFields, Reply, Submission};
use crate::store::ChallengeStore;
use crate::types::{GauntletError, Result};

/// Which node kind the caller expects the path to address.
///
/// The kind decides which ids of the path bind: ids the kind does not
/// need are ignored, ids it needs but that are absent are a caller
/// contract violation (`InvalidPath`), not a not-found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PathKind {
    Challenge,
    ChallengeEdit,
    Submission,
    SubmissionEdit,
    Reply,
    ReplyEdit,
}

/// Ordered partial id chain into a challenge tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostPath {
    pub challenge_id: ObjectId,
    pub submission_id: Option<ObjectId>,
    pub reply_id: Option<ObjectId>,
    pub edit_id: Option<ObjectId>,
}

impl PostPath {
    /// Path addressing the challenge root
    pub fn challenge(challenge_id: ObjectId) -> Self {
        Self {
            challenge_id,
            submission_id: None,
            reply_id: None,
            edit_id: None,
        }
    }

    pub fn with_submission(mut self, submission_id: ObjectId) -> Self {
        self.submission_id = Some(submission_id);
        self
    }

    pub fn with_reply(mut self, reply_id: ObjectId) -> Self {
        self.reply_id = Some(reply_id);
        self
    }

    pub fn with_edit(mut self, edit_id: ObjectId) -> Self {
        self.edit_id = Some(edit_id);
        self
    }
}

/// Position of a resolved node inside its aggregate.
///
/// Indices are only valid for the aggregate the resolution was built
/// from; `Resolution` keeps the two together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeLocator {
    Challenge,
    ChallengeEdit { edit: usize },
    Submission { submission: usize },
    SubmissionEdit { submission: usize, edit: usize },
    Reply { submission: usize, reply: usize },
    ReplyEdit { submission: usize, reply: usize, edit: usize },
}

/// Borrowed view of a resolved node
#[derive(Debug)]
pub enum PostNode<'a> {
    Challenge(&'a Challenge),
    Submission(&'a Submission),
    Reply(&'a Reply),
    Edit(&'a Edit),
}

impl NodeLocator {
    /// View the located node within `challenge`
    pub fn node<'a>(&self, challenge: &'a Challenge) -> PostNode<'a> {
        match *self {
            NodeLocator::Challenge => PostNode::Challenge(challenge),
            NodeLocator::ChallengeEdit { edit } => PostNode::Edit(&challenge.post.edits[edit]),
            NodeLocator::Submission { submission } => {
                PostNode::Submission(&challenge.submissions[submission])
            }
            NodeLocator::SubmissionEdit { submission, edit } => {
                PostNode::Edit(&challenge.submissions[submission].post.edits[edit])
            }
            NodeLocator::Reply { submission, reply } => {
                PostNode::Reply(&challenge.submissions[submission].replies[reply])
            }
            NodeLocator::ReplyEdit {
                submission,
                reply,
                edit,
            } => PostNode::Edit(&challenge.submissions[submission].replies[reply].post.edits[edit]),
        }
    }

    /// Mutable access to the located node's content list
    pub fn content_mut<'a>(&self, challenge: &'a mut Challenge) -> &'a mut Vec<Content> {
        match *self {
            NodeLocator::Challenge => &mut challenge.post.content,
            NodeLocator::ChallengeEdit { edit } => &mut challenge.post.edits[edit].content,
            NodeLocator::Submission { submission } => {
                &mut challenge.submissions[submission].post.content
            }
            NodeLocator::SubmissionEdit { submission, edit } => {
                &mut challenge.submissions[submission].post.edits[edit].content
            }
            NodeLocator::Reply { submission, reply } => {
                &mut challenge.submissions[submission].replies[reply].post.content
            }
            NodeLocator::ReplyEdit {
                submission,
                reply,
                edit,
            } => &mut challenge.submissions[submission].replies[reply].post.edits[edit].content,
        }
    }

    /// Mutable access to the located post's shared fields. `None` for
    /// edit locators; edits carry no edits of their own.
    pub fn post_fields_mut<'a>(&self, challenge: &'a mut Challenge) -> Option<&'a mut PostFields> {
        match *self {
            NodeLocator::Challenge => Some(&mut challenge.post),
            NodeLocator::Submission { submission } => {
                Some(&mut challenge.submissions[submission].post)
            }
            NodeLocator::Reply { submission, reply } => {
                Some(&mut challenge.submissions[submission].replies[reply].post)
            }
            NodeLocator::ChallengeEdit { .. }
            | NodeLocator::SubmissionEdit { .. }
            | NodeLocator::ReplyEdit { .. } => None,
        }
    }

    /// Set the located node's active flag
    pub fn set_active(&self, challenge: &mut Challenge, active: bool) {
        match *self {
            NodeLocator::Challenge => challenge.post.is_active = active,
            NodeLocator::ChallengeEdit { edit } => challenge.post.edits[edit].is_active = active,
            NodeLocator::Submission { submission } => {
                challenge.submissions[submission].post.is_active = active
            }
            NodeLocator::SubmissionEdit { submission, edit } => {
                challenge.submissions[submission].post.edits[edit].is_active = active
            }
            NodeLocator::Reply { submission, reply } => {
                challenge.submissions[submission].replies[reply].post.is_active = active
            }
            NodeLocator::ReplyEdit {
                submission,
                reply,
                edit,
            } => {
                challenge.submissions[submission].replies[reply].post.edits[edit].is_active = active
            }
        }
    }
}

/// A resolved path: the loaded aggregate plus the located node.
///
/// The whole aggregate is returned so the mutation layer can change the
/// node in place and save the document back as a single write.
#[derive(Debug)]
pub struct Resolution {
    pub challenge: Challenge,
    pub locator: NodeLocator,
}

impl Resolution {
    /// Borrow the resolved node
    pub fn node(&self) -> PostNode<'_> {
        self.locator.node(&self.challenge)
    }
}

/// Read-only resolver over a challenge store
pub struct PathResolver<'a> {
    store: &'a dyn ChallengeStore,
}

impl<'a> PathResolver<'a> {
    pub fn new(store: &'a dyn ChallengeStore) -> Self {
        Self { store }
    }

    /// Resolve `path` to the node kind the caller expects.
    ///
    /// Loads the aggregate with a single query, then walks embedded
    /// sequences by exact id equality (the sequences are small; a
    /// linear scan is fine).
    pub async fn resolve(&self, kind: PathKind, path: PostPath) -> Result<Resolution> {
        let challenge = self
            .store
            .find_by_id(path.challenge_id)
            .await?
            .ok_or(GauntletError::ChallengeNotFound(path.challenge_id))?;

        debug!(?kind, challenge = %path.challenge_id, "resolving post path");
        let locator = locate(kind, &challenge, path)?;
        Ok(Resolution { challenge, locator })
    }
}

fn require(id: Option<ObjectId>, kind: PathKind, name: &'static str) -> Result<ObjectId> {
    id.ok_or(GauntletError::InvalidPath {
        kind,
        missing: name,
    })
}

/// Walk the aggregate level by level and build the node locator
fn locate(kind: PathKind, challenge: &Challenge, path: PostPath) -> Result<NodeLocator> {
    match kind {
        PathKind::Challenge => Ok(NodeLocator::Challenge),

        PathKind::ChallengeEdit => {
            let edit_id = require(path.edit_id, kind, "editId")?;
            let edit = edit_index(&challenge.post.edits, edit_id).ok_or({
                GauntletError::EditNotFound {
                    challenge_id: challenge.id,
                    submission_id: None,
                    reply_id: None,
                    edit_id,
                }
            })?;
            Ok(NodeLocator::ChallengeEdit { edit })
        }

        PathKind::Submission => {
            let submission = submission_index(challenge, path, kind)?;
            Ok(NodeLocator::Submission { submission })
        }

        PathKind::SubmissionEdit => {
            let submission = submission_index(challenge, path, kind)?;
            let edit_id = require(path.edit_id, kind, "editId")?;
            let edits = &challenge.submissions[submission].post.edits;
            let edit = edit_index(edits, edit_id).ok_or(GauntletError::EditNotFound {
                challenge_id: challenge.id,
                submission_id: path.submission_id,
                reply_id: None,
                edit_id,
            })?;
            Ok(NodeLocator::SubmissionEdit { submission, edit })
        }

        PathKind::Reply => {
            let submission = submission_index(challenge, path, kind)?;
            let reply = reply_index(challenge, submission, path, kind)?;
            Ok(NodeLocator::Reply { submission, reply })
        }

        PathKind::ReplyEdit => {
            let submission = submission_index(challenge, path, kind)?;
            let reply = reply_index(challenge, submission, path, kind)?;
            let edit_id = require(path.edit_id, kind, "editId")?;
            let edits = &challenge.submissions[submission].replies[reply].post.edits;
            let edit = edit_index(edits, edit_id).ok_or(GauntletError::EditNotFound {
                challenge_id: challenge.id,
                submission_id: path.submission_id,
                reply_id: path.reply_id,
                edit_id,
            })?;
            Ok(NodeLocator::ReplyEdit {
                submission,
                reply,
                edit,
            })
        }
    }
}

fn submission_index(challenge: &Challenge, path: PostPath, kind: PathKind) -> Result<usize> {
    let submission_id = require(path.submission_id, kind, "submissionId")?;
    challenge
        .submissions
        .iter()
        .position(|s| s.id == submission_id)
        .ok_or(GauntletError::SubmissionNotFound {
            challenge_id: challenge.id,
            submission_id,
        })
}

fn reply_index(
    challenge: &Challenge,
    submission: usize,
    path: PostPath,
    kind: PathKind,
) -> Result<usize> {
    let reply_id = require(path.reply_id, kind, "replyId")?;
    challenge.submissions[submission]
        .replies
        .iter()
        .position(|r| r.id == reply_id)
        .ok_or(GauntletError::ReplyNotFound {
            challenge_id: challenge.id,
            submission_id: challenge.submissions[submission].id,
            reply_id,
        })
}

fn edit_index(edits: &[Edit], id: ObjectId) -> Option<usize> {
    edits.iter().position(|e| e.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schemas::append_edit;
    use crate::store::MemoryChallengeStore;

    struct Tree {
        store: MemoryChallengeStore,
        challenge_id: ObjectId,
        submission_id: ObjectId,
        reply_id: ObjectId,
        edit_id: ObjectId,
    }

    /// Challenge -> submission -> reply -> edit, saved to a fresh store
    async fn seeded_tree() -> Tree {
        let store = MemoryChallengeStore::new();
        let mut challenge = Challenge::new("x", ObjectId::new());
        let mut submission = Submission::new(ObjectId::new());
        let mut reply = crate::db::schemas::Reply::new(ObjectId::new());
        let edit_id = append_edit(&mut reply.post);
        let reply_id = reply.id;
        submission.replies.push(reply);
        let submission_id = submission.id;
        challenge.submissions.push(submission);
        let challenge_id = challenge.id;
        store.save(&challenge).await.unwrap();
        Tree {
            store,
            challenge_id,
            submission_id,
            reply_id,
            edit_id,
        }
    }

    #[tokio::test]
    async fn test_resolves_reply_edit() {
        let tree = seeded_tree().await;
        let resolver = PathResolver::new(&tree.store);
        let path = PostPath::challenge(tree.challenge_id)
            .with_submission(tree.submission_id)
            .with_reply(tree.reply_id)
            .with_edit(tree.edit_id);

        let resolution = resolver.resolve(PathKind::ReplyEdit, path).await.unwrap();
        assert_eq!(resolution.challenge.id, tree.challenge_id);
        match resolution.node() {
            PostNode::Edit(edit) => assert_eq!(edit.id, tree.edit_id),
            other => panic!("expected edit, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_each_level_reports_its_own_not_found() {
        let tree = seeded_tree().await;
        let resolver = PathResolver::new(&tree.store);
        let bogus = ObjectId::new();

        let err = resolver
            .resolve(
                PathKind::ReplyEdit,
                PostPath::challenge(bogus)
                    .with_submission(tree.submission_id)
                    .with_reply(tree.reply_id)
                    .with_edit(tree.edit_id),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, GauntletError::ChallengeNotFound(id) if id == bogus));

        let err = resolver
            .resolve(
                PathKind::ReplyEdit,
                PostPath::challenge(tree.challenge_id)
                    .with_submission(bogus)
                    .with_reply(tree.reply_id)
                    .with_edit(tree.edit_id),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GauntletError::SubmissionNotFound { submission_id, .. } if submission_id == bogus
        ));

        let err = resolver
            .resolve(
                PathKind::ReplyEdit,
                PostPath::challenge(tree.challenge_id)
                    .with_submission(tree.submission_id)
                    .with_reply(bogus)
                    .with_edit(tree.edit_id),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GauntletError::ReplyNotFound { reply_id, .. } if reply_id == bogus
        ));

        let err = resolver
            .resolve(
                PathKind::ReplyEdit,
                PostPath::challenge(tree.challenge_id)
                    .with_submission(tree.submission_id)
                    .with_reply(tree.reply_id)
                    .with_edit(bogus),
            )
            .await
            .unwrap_err();
        match err {
            GauntletError::EditNotFound {
                challenge_id,
                submission_id,
                reply_id,
                edit_id,
            } => {
                assert_eq!(challenge_id, tree.challenge_id);
                assert_eq!(submission_id, Some(tree.submission_id));
                assert_eq!(reply_id, Some(tree.reply_id));
                assert_eq!(edit_id, bogus);
            }
            other => panic!("expected EditNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_required_id_fails_fast() {
        let tree = seeded_tree().await;
        let resolver = PathResolver::new(&tree.store);

        let err = resolver
            .resolve(PathKind::Reply, PostPath::challenge(tree.challenge_id))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GauntletError::InvalidPath {
                kind: PathKind::Reply,
                missing: "submissionId"
            }
        ));

        let err = resolver
            .resolve(
                PathKind::ReplyEdit,
                PostPath::challenge(tree.challenge_id)
                    .with_submission(tree.submission_id)
                    .with_reply(tree.reply_id),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GauntletError::InvalidPath {
                missing: "editId",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_surplus_ids_are_ignored() {
        let tree = seeded_tree().await;
        let resolver = PathResolver::new(&tree.store);

        // A bogus edit id is irrelevant when resolving a submission
        let path = PostPath::challenge(tree.challenge_id)
            .with_submission(tree.submission_id)
            .with_edit(ObjectId::new());
        let resolution = resolver.resolve(PathKind::Submission, path).await.unwrap();
        match resolution.node() {
            PostNode::Submission(s) => assert_eq!(s.id, tree.submission_id),
            other => panic!("expected submission, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_resolve_challenge_root() {
        let tree = seeded_tree().await;
        let resolver = PathResolver::new(&tree.store);
        let resolution = resolver
            .resolve(PathKind::Challenge, PostPath::challenge(tree.challenge_id))
            .await
            .unwrap();
        assert!(matches!(resolution.node(), PostNode::Challenge(_)));
        assert!(matches!(resolution.locator, NodeLocator::Challenge));
    }
}

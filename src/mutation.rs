//! Mutation layer over challenge aggregates.
//!
//! Every mutation follows the same shape: resolve the target node with
//! the path resolver, apply exactly one change in memory, and persist
//! the whole aggregate as a single write. Checks run before any write,
//! so a rejected mutation leaves the store untouched. No optimistic
//! concurrency control here; last write wins at the aggregate boundary.

use bson::oid::ObjectId;
use tracing::info;

use crate::config::Limits;
use crate::db::schemas::{
    append_content, append_edit, deactivate_content, Challenge, Content, Reply, Submission,
};
use crate::path::{NodeLocator, PathKind, PathResolver, PostPath, Resolution};
use crate::store::ChallengeStore;
use crate::types::{GauntletError, Result};

/// Write operations on the challenge tree
pub struct Mutations<'a> {
    store: &'a dyn ChallengeStore,
    limits: Limits,
}

impl<'a> Mutations<'a> {
    pub fn new(store: &'a dyn ChallengeStore, limits: Limits) -> Self {
        Self { store, limits }
    }

    /// Create and persist a new challenge
    pub async fn post_challenge(
        &self,
        tag: impl Into<String>,
        poster_id: ObjectId,
    ) -> Result<Challenge> {
        let challenge = Challenge::new(tag, poster_id);
        self.store.save(&challenge).await?;
        info!(challenge = %challenge.id, tag = %challenge.tag, "challenge posted");
        Ok(challenge)
    }

    /// Post a submission on a challenge. Submitting on one's own
    /// challenge is forbidden; the check runs before any write.
    pub async fn post_submission(
        &self,
        challenge_id: ObjectId,
        poster_id: ObjectId,
    ) -> Result<ObjectId> {
        let Resolution { mut challenge, .. } = self
            .resolver()
            .resolve(PathKind::Challenge, PostPath::challenge(challenge_id))
            .await?;

        if challenge.post.poster_id == poster_id {
            return Err(GauntletError::SelfSubmissionForbidden {
                poster_id,
                challenge_id,
            });
        }

        let submission = Submission::new(poster_id);
        let id = submission.id;
        challenge.submissions.push(submission);
        self.store.save(&challenge).await?;
        info!(challenge = %challenge_id, submission = %id, "submission posted");
        Ok(id)
    }

    /// Post a reply on a submission
    pub async fn post_reply(
        &self,
        challenge_id: ObjectId,
        submission_id: ObjectId,
        poster_id: ObjectId,
    ) -> Result<ObjectId> {
        let path = PostPath::challenge(challenge_id).with_submission(submission_id);
        let resolution = self.resolver().resolve(PathKind::Submission, path).await?;
        let Resolution {
            mut challenge,
            locator,
        } = resolution;

        let reply = Reply::new(poster_id);
        let id = reply.id;
        match locator {
            NodeLocator::Submission { submission } => {
                challenge.submissions[submission].replies.push(reply)
            }
            _ => unreachable!("resolved kind was Submission"),
        }
        self.store.save(&challenge).await?;
        info!(challenge = %challenge_id, submission = %submission_id, reply = %id, "reply posted");
        Ok(id)
    }

    /// Post a fresh edit against a post-level node. `kind` must address
    /// a post (challenge, submission, reply); edits of edits do not
    /// exist.
    pub async fn post_edit(&self, kind: PathKind, path: PostPath) -> Result<ObjectId> {
        if matches!(
            kind,
            PathKind::ChallengeEdit | PathKind::SubmissionEdit | PathKind::ReplyEdit
        ) {
            return Err(GauntletError::InvalidPath {
                kind,
                missing: "a post-level kind",
            });
        }

        let Resolution {
            mut challenge,
            locator,
        } = self.resolver().resolve(kind, path).await?;
        let post = locator
            .post_fields_mut(&mut challenge)
            .ok_or(GauntletError::InvalidPath {
                kind,
                missing: "a post-level kind",
            })?;
        let id = append_edit(post);
        self.store.save(&challenge).await?;
        info!(challenge = %path.challenge_id, edit = %id, "edit posted");
        Ok(id)
    }

    /// Append a text content item to the addressed post or edit
    pub async fn add_text_content(
        &self,
        kind: PathKind,
        path: PostPath,
        text: impl Into<String>,
    ) -> Result<ObjectId> {
        self.add_content(kind, path, Content::text(text)).await
    }

    /// Append an uploaded-file content item to the addressed post or
    /// edit. Only the metadata is stored here; the bytes live in the
    /// file storage collaborator.
    pub async fn add_uploaded_content(
        &self,
        kind: PathKind,
        path: PostPath,
        filename: impl Into<String>,
        mimetype: impl Into<String>,
    ) -> Result<ObjectId> {
        self.add_content(kind, path, Content::upload(filename, mimetype))
            .await
    }

    /// Soft-delete a content item on the addressed post or edit. The
    /// item stays in the sequence with its active flag cleared.
    pub async fn remove_content(
        &self,
        kind: PathKind,
        path: PostPath,
        content_id: ObjectId,
    ) -> Result<ObjectId> {
        let Resolution {
            mut challenge,
            locator,
        } = self.resolver().resolve(kind, path).await?;

        let content = locator.content_mut(&mut challenge);
        let (submission_id, reply_id, edit_id) = consumed_ids(kind, path);
        deactivate_content(content, content_id).ok_or(GauntletError::ContentNotFound {
            challenge_id: path.challenge_id,
            submission_id,
            reply_id,
            edit_id,
            content_id,
        })?;
        self.store.save(&challenge).await?;
        info!(challenge = %path.challenge_id, content = %content_id, "content removed");
        Ok(content_id)
    }

    /// Reactivate the addressed node
    pub async fn publish(&self, kind: PathKind, path: PostPath) -> Result<()> {
        self.set_active(kind, path, true).await
    }

    /// Soft-delete the addressed node
    pub async fn unpublish(&self, kind: PathKind, path: PostPath) -> Result<()> {
        self.set_active(kind, path, false).await
    }

    async fn add_content(
        &self,
        kind: PathKind,
        path: PostPath,
        item: Content,
    ) -> Result<ObjectId> {
        let Resolution {
            mut challenge,
            locator,
        } = self.resolver().resolve(kind, path).await?;

        let content = locator.content_mut(&mut challenge);
        let id = append_content(content, item, self.limits.max_content_per_post)?;
        self.store.save(&challenge).await?;
        info!(challenge = %path.challenge_id, content = %id, "content added");
        Ok(id)
    }

    async fn set_active(&self, kind: PathKind, path: PostPath, active: bool) -> Result<()> {
        let Resolution {
            mut challenge,
            locator,
        } = self.resolver().resolve(kind, path).await?;
        locator.set_active(&mut challenge, active);
        self.store.save(&challenge).await?;
        info!(challenge = %path.challenge_id, ?kind, active, "active flag set");
        Ok(())
    }

    fn resolver(&self) -> PathResolver<'a> {
        PathResolver::new(self.store)
    }
}

/// The path ids a kind actually binds, for not-found diagnostics
fn consumed_ids(
    kind: PathKind,
    path: PostPath,
) -> (Option<ObjectId>, Option<ObjectId>, Option<ObjectId>) {
    let submission_id = match kind {
        PathKind::Challenge | PathKind::ChallengeEdit => None,
        _ => path.submission_id,
    };
    let reply_id = match kind {
        PathKind::Reply | PathKind::ReplyEdit => path.reply_id,
        _ => None,
    };
    let edit_id = match kind {
        PathKind::ChallengeEdit | PathKind::SubmissionEdit | PathKind::ReplyEdit => path.edit_id,
        _ => None,
    };
    (submission_id, reply_id, edit_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryChallengeStore;

    fn limits() -> Limits {
        Limits {
            max_content_per_post: 8,
            max_page_size: 50,
        }
    }

    #[tokio::test]
    async fn test_post_challenge_and_submission() {
        let store = MemoryChallengeStore::new();
        let mutations = Mutations::new(&store, limits());

        let owner = ObjectId::new();
        let challenge = mutations.post_challenge("rust", owner).await.unwrap();

        let submitter = ObjectId::new();
        let submission_id = mutations
            .post_submission(challenge.id, submitter)
            .await
            .unwrap();

        let stored = store.find_by_id(challenge.id).await.unwrap().unwrap();
        assert_eq!(stored.submissions.len(), 1);
        assert_eq!(stored.submissions[0].id, submission_id);
        assert_eq!(stored.submissions[0].post.poster_id, submitter);
    }

    #[tokio::test]
    async fn test_self_submission_rejected_without_write() {
        let store = MemoryChallengeStore::new();
        let mutations = Mutations::new(&store, limits());

        let owner = ObjectId::new();
        let challenge = mutations.post_challenge("rust", owner).await.unwrap();
        let saves_before = store.save_count();

        let err = mutations
            .post_submission(challenge.id, owner)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GauntletError::SelfSubmissionForbidden { poster_id, challenge_id }
                if poster_id == owner && challenge_id == challenge.id
        ));
        assert_eq!(store.save_count(), saves_before);
    }

    #[tokio::test]
    async fn test_post_reply_and_edit() {
        let store = MemoryChallengeStore::new();
        let mutations = Mutations::new(&store, limits());

        let challenge = mutations
            .post_challenge("rust", ObjectId::new())
            .await
            .unwrap();
        let submission_id = mutations
            .post_submission(challenge.id, ObjectId::new())
            .await
            .unwrap();
        let reply_id = mutations
            .post_reply(challenge.id, submission_id, ObjectId::new())
            .await
            .unwrap();

        let path = PostPath::challenge(challenge.id)
            .with_submission(submission_id)
            .with_reply(reply_id);
        let edit_id = mutations.post_edit(PathKind::Reply, path).await.unwrap();

        let stored = store.find_by_id(challenge.id).await.unwrap().unwrap();
        let reply = stored.submissions[0].reply(reply_id).unwrap();
        assert_eq!(reply.post.edits.len(), 1);
        assert_eq!(reply.post.edits[0].id, edit_id);
    }

    #[tokio::test]
    async fn test_post_edit_rejects_edit_kinds() {
        let store = MemoryChallengeStore::new();
        let mutations = Mutations::new(&store, limits());
        let challenge = mutations
            .post_challenge("rust", ObjectId::new())
            .await
            .unwrap();

        let path = PostPath::challenge(challenge.id).with_edit(ObjectId::new());
        let err = mutations
            .post_edit(PathKind::ChallengeEdit, path)
            .await
            .unwrap_err();
        assert!(matches!(err, GauntletError::InvalidPath { .. }));
    }

    #[tokio::test]
    async fn test_content_cap_enforced_on_append() {
        let store = MemoryChallengeStore::new();
        let small = Limits {
            max_content_per_post: 2,
            max_page_size: 50,
        };
        let mutations = Mutations::new(&store, small);
        let challenge = mutations
            .post_challenge("rust", ObjectId::new())
            .await
            .unwrap();
        let path = PostPath::challenge(challenge.id);

        mutations
            .add_text_content(PathKind::Challenge, path, "one")
            .await
            .unwrap();
        mutations
            .add_text_content(PathKind::Challenge, path, "two")
            .await
            .unwrap();

        let saves_before = store.save_count();
        let err = mutations
            .add_text_content(PathKind::Challenge, path, "three")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GauntletError::ContentLimitExceeded { limit: 2 }
        ));
        assert_eq!(store.save_count(), saves_before);
    }

    #[tokio::test]
    async fn test_remove_content_is_soft_delete() {
        let store = MemoryChallengeStore::new();
        let mutations = Mutations::new(&store, limits());
        let challenge = mutations
            .post_challenge("rust", ObjectId::new())
            .await
            .unwrap();
        let path = PostPath::challenge(challenge.id);

        let kept = mutations
            .add_uploaded_content(PathKind::Challenge, path, "a.png", "image/png")
            .await
            .unwrap();
        let removed = mutations
            .add_text_content(PathKind::Challenge, path, "bye")
            .await
            .unwrap();

        mutations
            .remove_content(PathKind::Challenge, path, removed)
            .await
            .unwrap();

        let stored = store.find_by_id(challenge.id).await.unwrap().unwrap();
        assert_eq!(stored.post.content.len(), 2);
        assert!(stored.post.content.iter().any(|c| c.id() == kept && c.is_active()));
        assert!(stored
            .post
            .content
            .iter()
            .any(|c| c.id() == removed && !c.is_active()));
    }

    #[tokio::test]
    async fn test_remove_missing_content_reports_path() {
        let store = MemoryChallengeStore::new();
        let mutations = Mutations::new(&store, limits());
        let challenge = mutations
            .post_challenge("rust", ObjectId::new())
            .await
            .unwrap();
        let submission_id = mutations
            .post_submission(challenge.id, ObjectId::new())
            .await
            .unwrap();

        let path = PostPath::challenge(challenge.id).with_submission(submission_id);
        let bogus = ObjectId::new();
        let err = mutations
            .remove_content(PathKind::Submission, path, bogus)
            .await
            .unwrap_err();
        match err {
            GauntletError::ContentNotFound {
                challenge_id,
                submission_id: sub,
                reply_id,
                edit_id,
                content_id,
            } => {
                assert_eq!(challenge_id, challenge.id);
                assert_eq!(sub, Some(submission_id));
                assert_eq!(reply_id, None);
                assert_eq!(edit_id, None);
                assert_eq!(content_id, bogus);
            }
            other => panic!("expected ContentNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_content_on_edit() {
        let store = MemoryChallengeStore::new();
        let mutations = Mutations::new(&store, limits());
        let challenge = mutations
            .post_challenge("rust", ObjectId::new())
            .await
            .unwrap();

        let root = PostPath::challenge(challenge.id);
        let edit_id = mutations
            .post_edit(PathKind::Challenge, root)
            .await
            .unwrap();

        let edit_path = root.with_edit(edit_id);
        let content_id = mutations
            .add_text_content(PathKind::ChallengeEdit, edit_path, "revised")
            .await
            .unwrap();

        let stored = store.find_by_id(challenge.id).await.unwrap().unwrap();
        assert_eq!(stored.post.edits[0].content.len(), 1);
        assert_eq!(stored.post.edits[0].content[0].id(), content_id);
    }

    #[tokio::test]
    async fn test_publish_and_unpublish_toggle_active() {
        let store = MemoryChallengeStore::new();
        let mutations = Mutations::new(&store, limits());
        let challenge = mutations
            .post_challenge("rust", ObjectId::new())
            .await
            .unwrap();
        let submission_id = mutations
            .post_submission(challenge.id, ObjectId::new())
            .await
            .unwrap();

        let path = PostPath::challenge(challenge.id).with_submission(submission_id);
        mutations
            .unpublish(PathKind::Submission, path)
            .await
            .unwrap();
        let stored = store.find_by_id(challenge.id).await.unwrap().unwrap();
        assert!(!stored.submissions[0].post.is_active);

        mutations.publish(PathKind::Submission, path).await.unwrap();
        let stored = store.find_by_id(challenge.id).await.unwrap().unwrap();
        assert!(stored.submissions[0].post.is_active);
    }
}

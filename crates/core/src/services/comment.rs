//! Comment service: adding, deleting and liking comments.

use myblog_common::{AppResult, IdGenerator};
use myblog_db::{
    entities::{comment, comment_like},
    repositories::{CommentLikeRepository, CommentRepository, PostRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: CommentRepository,
    post_repo: PostRepository,
    like_repo: CommentLikeRepository,
    id_gen: IdGenerator,
}

/// Input for adding a comment.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CommentInput {
    #[validate(length(min = 1, max = 5000))]
    pub body: String,
}

/// Outcome of a delete request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentDeletion {
    /// Post the comment belonged to.
    pub post_id: String,
    /// `false` when the requester was not the author.
    pub deleted: bool,
}

/// Like state after a toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikeToggle {
    pub post_id: String,
    pub liked: bool,
    pub like_count: u64,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub fn new(
        comment_repo: CommentRepository,
        post_repo: PostRepository,
        like_repo: CommentLikeRepository,
    ) -> Self {
        Self {
            comment_repo,
            post_repo,
            like_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Add a comment to a post.
    pub async fn create(
        &self,
        post_id: &str,
        user_id: &str,
        input: CommentInput,
    ) -> AppResult<comment::Model> {
        let input = CommentInput {
            body: input.body.trim().to_string(),
        };
        input.validate()?;

        let post = self.post_repo.get_by_id(post_id).await?;

        let model = comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            post_id: Set(post.id),
            user_id: Set(user_id.to_string()),
            body: Set(input.body),
            created_at: Set(chrono::Utc::now().into()),
        };

        let comment = self.comment_repo.create(model).await?;
        tracing::info!(comment_id = %comment.id, post_id = %comment.post_id, "Comment added");

        Ok(comment)
    }

    /// Delete a comment if `user_id` wrote it; anyone else gets a no-op.
    pub async fn delete(&self, user_id: &str, comment_id: &str) -> AppResult<CommentDeletion> {
        let comment = self.comment_repo.get_by_id(comment_id).await?;

        if comment.user_id != user_id {
            tracing::warn!(
                comment_id = %comment.id,
                user_id = %user_id,
                "Rejected comment delete by non-author"
            );
            return Ok(CommentDeletion {
                post_id: comment.post_id,
                deleted: false,
            });
        }

        self.comment_repo.delete(&comment.id).await?;
        tracing::info!(comment_id = %comment.id, "Comment deleted");

        Ok(CommentDeletion {
            post_id: comment.post_id,
            deleted: true,
        })
    }

    /// Like the comment, or remove the like if `user_id` already likes it.
    pub async fn toggle_like(&self, user_id: &str, comment_id: &str) -> AppResult<LikeToggle> {
        let comment = self.comment_repo.get_by_id(comment_id).await?;

        let liked = if self.like_repo.has_liked(&comment.id, user_id).await? {
            self.like_repo.delete_by_pair(&comment.id, user_id).await?;
            false
        } else {
            let model = comment_like::ActiveModel {
                comment_id: Set(comment.id.clone()),
                user_id: Set(user_id.to_string()),
                created_at: Set(chrono::Utc::now().into()),
            };
            if self.like_repo.create_if_absent(model).await?.is_none() {
                tracing::debug!(comment_id = %comment.id, user_id, "Like already recorded");
            }
            true
        };

        let like_count = self.like_repo.count_by_comment(&comment.id).await?;
        tracing::debug!(comment_id = %comment.id, liked, like_count, "Comment like toggled");

        Ok(LikeToggle {
            post_id: comment.post_id,
            liked,
            like_count,
        })
    }

    /// Get a comment by ID.
    pub async fn get(&self, id: &str) -> AppResult<comment::Model> {
        self.comment_repo.get_by_id(id).await
    }
}

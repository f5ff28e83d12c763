//! Comment like repository.

use std::sync::Arc;

use super::is_unique_violation;
use crate::entities::{comment_like, CommentLike};
use myblog_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
};

/// Comment like repository for database operations.
#[derive(Clone)]
pub struct CommentLikeRepository {
    db: Arc<DatabaseConnection>,
}

impl CommentLikeRepository {
    /// Create a new comment like repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a like by comment and user.
    pub async fn find_by_pair(
        &self,
        comment_id: &str,
        user_id: &str,
    ) -> AppResult<Option<comment_like::Model>> {
        CommentLike::find_by_id((comment_id.to_string(), user_id.to_string()))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check if a user likes a comment.
    pub async fn has_liked(&self, comment_id: &str, user_id: &str) -> AppResult<bool> {
        Ok(self.find_by_pair(comment_id, user_id).await?.is_some())
    }

    /// Insert a like, returning `None` if the pair already exists.
    pub async fn create_if_absent(
        &self,
        model: comment_like::ActiveModel,
    ) -> AppResult<Option<comment_like::Model>> {
        match model.insert(self.db.as_ref()).await {
            Ok(created) => Ok(Some(created)),
            Err(e) if is_unique_violation(&e) => {
                tracing::debug!(error = %e, "Comment already liked");
                Ok(None)
            }
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    /// Delete a like by pair. Returns whether a row was removed.
    pub async fn delete_by_pair(&self, comment_id: &str, user_id: &str) -> AppResult<bool> {
        let result = CommentLike::delete_many()
            .filter(comment_like::Column::CommentId.eq(comment_id))
            .filter(comment_like::Column::UserId.eq(user_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }

    /// Count likes on a comment.
    pub async fn count_by_comment(&self, comment_id: &str) -> AppResult<u64> {
        CommentLike::find()
            .filter(comment_like::Column::CommentId.eq(comment_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All likes on a set of comments.
    pub async fn find_by_comments(
        &self,
        comment_ids: &[String],
    ) -> AppResult<Vec<comment_like::Model>> {
        if comment_ids.is_empty() {
            return Ok(vec![]);
        }

        CommentLike::find()
            .filter(comment_like::Column::CommentId.is_in(comment_ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

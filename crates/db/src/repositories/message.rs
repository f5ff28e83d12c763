//! Message repository.

use std::sync::Arc;

use crate::entities::message::{self, Column, Entity as Message};
use myblog_common::{AppError, AppResult};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder,
};

/// Message repository for database operations.
#[derive(Clone)]
pub struct MessageRepository {
    db: Arc<DatabaseConnection>,
}

impl MessageRepository {
    /// Create a new message repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Create a new message.
    pub async fn create(&self, model: message::ActiveModel) -> AppResult<message::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Messages between two users in both directions, oldest first.
    pub async fn find_conversation(
        &self,
        user_id: &str,
        partner_id: &str,
    ) -> AppResult<Vec<message::Model>> {
        Message::find()
            .filter(
                Condition::any()
                    .add(
                        Condition::all()
                            .add(Column::SenderId.eq(user_id))
                            .add(Column::RecipientId.eq(partner_id)),
                    )
                    .add(
                        Condition::all()
                            .add(Column::SenderId.eq(partner_id))
                            .add(Column::RecipientId.eq(user_id)),
                    ),
            )
            .order_by_asc(Column::CreatedAt)
            .order_by_asc(Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Mark everything `partner_id` sent to `user_id` as read.
    pub async fn mark_as_read(&self, user_id: &str, partner_id: &str) -> AppResult<u64> {
        let result = Message::update_many()
            .col_expr(Column::IsRead, Expr::value(true))
            .filter(Column::SenderId.eq(partner_id))
            .filter(Column::RecipientId.eq(user_id))
            .filter(Column::IsRead.eq(false))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Count unread messages addressed to a user.
    pub async fn count_unread(&self, user_id: &str) -> AppResult<u64> {
        Message::find()
            .filter(Column::RecipientId.eq(user_id))
            .filter(Column::IsRead.eq(false))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

//! Contact repository (directed follow edges).

use std::sync::Arc;

use super::is_unique_violation;
use crate::entities::{contact, notification, Contact};
use myblog_common::{AppError, AppResult};
use sea_orm::{
    sea_query::Query, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};

/// Contact repository for database operations.
#[derive(Clone)]
pub struct ContactRepository {
    db: Arc<DatabaseConnection>,
}

impl ContactRepository {
    /// Create a new contact repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the edge `from -> to`.
    pub async fn find_by_pair(
        &self,
        user_from_id: &str,
        user_to_id: &str,
    ) -> AppResult<Option<contact::Model>> {
        Contact::find()
            .filter(contact::Column::UserFromId.eq(user_from_id))
            .filter(contact::Column::UserToId.eq(user_to_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check if a user is following another user.
    pub async fn is_following(&self, user_from_id: &str, user_to_id: &str) -> AppResult<bool> {
        Ok(self.find_by_pair(user_from_id, user_to_id).await?.is_some())
    }

    /// Insert an edge together with the follow notification it triggers.
    ///
    /// Both rows commit or neither does. Returns `None` when the pair
    /// already exists, which is how a lost race against a concurrent follow
    /// shows up.
    pub async fn create_with_notification(
        &self,
        edge: contact::ActiveModel,
        notification: notification::ActiveModel,
    ) -> AppResult<Option<(contact::Model, notification::Model)>> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let edge = match edge.insert(&txn).await {
            Ok(created) => created,
            Err(e) if is_unique_violation(&e) => {
                tracing::debug!(error = %e, "Contact already exists");
                txn.rollback()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                return Ok(None);
            }
            Err(e) => return Err(AppError::Database(e.to_string())),
        };

        let notification = notification
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(Some((edge, notification)))
    }

    /// Delete the edge `from -> to`. Returns whether a row was removed.
    pub async fn delete_by_pair(&self, user_from_id: &str, user_to_id: &str) -> AppResult<bool> {
        let result = Contact::delete_many()
            .filter(contact::Column::UserFromId.eq(user_from_id))
            .filter(contact::Column::UserToId.eq(user_to_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }

    /// Users that follow `user_id` and are followed back, oldest edge first.
    pub async fn find_mutual(&self, user_id: &str) -> AppResult<Vec<contact::Model>> {
        let followers = Query::select()
            .column(contact::Column::UserFromId)
            .from(Contact)
            .and_where(contact::Column::UserToId.eq(user_id))
            .to_owned();

        Contact::find()
            .filter(contact::Column::UserFromId.eq(user_id))
            .filter(contact::Column::UserToId.in_subquery(followers))
            .order_by_asc(contact::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count followers of a user.
    pub async fn count_followers(&self, user_id: &str) -> AppResult<u64> {
        Contact::find()
            .filter(contact::Column::UserToId.eq(user_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count users a user is following.
    pub async fn count_following(&self, user_id: &str) -> AppResult<u64> {
        Contact::find()
            .filter(contact::Column::UserFromId.eq(user_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

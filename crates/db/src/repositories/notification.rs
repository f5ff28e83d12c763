//! Notification repository.

use std::sync::Arc;

use crate::entities::{notification, Notification};
use myblog_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    UpdateResult,
};

/// Notification repository for database operations.
#[derive(Clone)]
pub struct NotificationRepository {
    db: Arc<DatabaseConnection>,
}

impl NotificationRepository {
    /// Create a new notification repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Notifications for a user, newest first.
    pub async fn find_by_recipient(&self, user_id: &str) -> AppResult<Vec<notification::Model>> {
        Notification::find()
            .filter(notification::Column::RecipientId.eq(user_id))
            .order_by_desc(notification::Column::CreatedAt)
            .order_by_desc(notification::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Mark the given notifications of a user as read.
    ///
    /// Rows created after `ids` was read are left alone.
    pub async fn mark_as_read(&self, user_id: &str, ids: &[String]) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result: UpdateResult = Notification::update_many()
            .filter(notification::Column::RecipientId.eq(user_id))
            .filter(notification::Column::Id.is_in(ids.iter().cloned()))
            .filter(notification::Column::IsRead.eq(false))
            .col_expr(notification::Column::IsRead, true.into())
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Count unread notifications for a user.
    pub async fn count_unread(&self, user_id: &str) -> AppResult<u64> {
        Notification::find()
            .filter(notification::Column::RecipientId.eq(user_id))
            .filter(notification::Column::IsRead.eq(false))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Transaction};

    fn create_test_notification(id: &str, recipient: &str, actor: &str) -> notification::Model {
        notification::Model {
            id: id.to_string(),
            recipient_id: recipient.to_string(),
            actor_id: actor.to_string(),
            verb: notification::VERB_FOLLOW.to_string(),
            is_read: false,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_recipient() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![
                    create_test_notification("n2", "u1", "u3"),
                    create_test_notification("n1", "u1", "u2"),
                ]])
                .into_connection(),
        );

        let repo = NotificationRepository::new(db);
        let result = repo.find_by_recipient("u1").await.unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].id, "n2");
    }

    #[tokio::test]
    async fn test_mark_as_read_is_bounded_by_ids() {
        let conn = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 2,
            }])
            .into_connection();

        let conn = Arc::new(conn);
        let repo = NotificationRepository::new(Arc::clone(&conn));
        let ids = vec!["n1".to_string(), "n2".to_string()];
        assert_eq!(repo.mark_as_read("u1", &ids).await.unwrap(), 2);

        drop(repo);
        let conn = Arc::try_unwrap(conn).expect("repository released the connection");
        assert_eq!(
            conn.into_transaction_log(),
            [Transaction::from_sql_and_values(
                DatabaseBackend::Postgres,
                r#"UPDATE "notification" SET "is_read" = $1 WHERE "notification"."recipient_id" = $2 AND "notification"."id" IN ($3, $4) AND "notification"."is_read" = $5"#,
                [true.into(), "u1".into(), "n1".into(), "n2".into(), false.into()],
            )]
        );
    }

    #[tokio::test]
    async fn test_mark_as_read_without_ids_skips_query() {
        let conn = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let conn = Arc::new(conn);
        let repo = NotificationRepository::new(Arc::clone(&conn));
        assert_eq!(repo.mark_as_read("u1", &[]).await.unwrap(), 0);
        drop(repo);
        let conn = Arc::try_unwrap(conn).expect("repository released the connection");
        assert!(conn.into_transaction_log().is_empty());
    }

    #[tokio::test]
    async fn test_count_unread() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(0))
                }]])
                .into_connection(),
        );

        let repo = NotificationRepository::new(db);
        assert_eq!(repo.count_unread("u1").await.unwrap(), 0);
    }
}

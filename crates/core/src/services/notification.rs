//! Notification service.

use std::collections::HashMap;

use myblog_common::{AppResult, IdGenerator};
use myblog_db::{
    entities::{notification, user},
    repositories::{MessageRepository, NotificationRepository, UserRepository},
};
use sea_orm::Set;

/// Notification service for business logic.
#[derive(Clone)]
pub struct NotificationService {
    notification_repo: NotificationRepository,
    message_repo: MessageRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

/// A notification with the user who caused it.
#[derive(Debug, Clone)]
pub struct NotificationView {
    pub notification: notification::Model,
    pub actor: user::Model,
}

/// Unread counters shown next to the navigation links.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnreadCounts {
    pub notifications: u64,
    pub messages: u64,
}

impl UnreadCounts {
    /// Sum of unread notifications and messages.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.notifications + self.messages
    }
}

impl NotificationService {
    /// Create a new notification service.
    #[must_use]
    pub fn new(
        notification_repo: NotificationRepository,
        message_repo: MessageRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            notification_repo,
            message_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Build the row telling `recipient_id` that `actor_id` started
    /// following them. The caller inserts it alongside the follow edge.
    #[must_use]
    pub fn follow_notification(&self, recipient_id: &str, actor_id: &str) -> notification::ActiveModel {
        notification::ActiveModel {
            id: Set(self.id_gen.generate()),
            recipient_id: Set(recipient_id.to_string()),
            actor_id: Set(actor_id.to_string()),
            verb: Set(notification::VERB_FOLLOW.to_string()),
            is_read: Set(false),
            created_at: Set(chrono::Utc::now().into()),
        }
    }

    /// All notifications for a user, newest first, then mark them read.
    ///
    /// The returned items keep the read state they had before this call.
    pub async fn list_and_mark_read(&self, user_id: &str) -> AppResult<Vec<NotificationView>> {
        let notifications = self.notification_repo.find_by_recipient(user_id).await?;

        let mut actor_ids: Vec<String> = notifications.iter().map(|n| n.actor_id.clone()).collect();
        actor_ids.sort();
        actor_ids.dedup();

        let actors: HashMap<String, user::Model> = self
            .user_repo
            .find_by_ids(&actor_ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();

        let unread: Vec<String> = notifications
            .iter()
            .filter(|n| !n.is_read)
            .map(|n| n.id.clone())
            .collect();
        if !unread.is_empty() {
            let marked = self.notification_repo.mark_as_read(user_id, &unread).await?;
            tracing::debug!(user_id = %user_id, marked, "Marked notifications as read");
        }

        Ok(notifications
            .into_iter()
            .filter_map(|notification| {
                let actor = actors.get(&notification.actor_id)?.clone();
                Some(NotificationView {
                    notification,
                    actor,
                })
            })
            .collect())
    }

    /// Unread notification and message counts for a user.
    pub async fn unread_counts(&self, user_id: &str) -> AppResult<UnreadCounts> {
        Ok(UnreadCounts {
            notifications: self.notification_repo.count_unread(user_id).await?,
            messages: self.message_repo.count_unread(user_id).await?,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn create_test_user(id: &str, username: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: username.to_string(),
            username_lower: username.to_lowercase(),
            email: format!("{username}@example.com"),
            password_hash: "hash".to_string(),
            token: None,
            avatar: Some("avatars/avatar2.png".to_string()),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_notification(id: &str, actor: &str, is_read: bool, mins_ago: i64) -> notification::Model {
        notification::Model {
            id: id.to_string(),
            recipient_id: "u1".to_string(),
            actor_id: actor.to_string(),
            verb: notification::VERB_FOLLOW.to_string(),
            is_read,
            created_at: (Utc::now() - Duration::minutes(mins_ago)).into(),
        }
    }

    fn empty_db() -> Arc<DatabaseConnection> {
        Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection())
    }

    #[test]
    fn test_follow_notification() {
        let service = NotificationService::new(
            NotificationRepository::new(empty_db()),
            MessageRepository::new(empty_db()),
            UserRepository::new(empty_db()),
        );

        let model = service.follow_notification("u1", "u2");
        assert_eq!(model.recipient_id, Set("u1".to_string()));
        assert_eq!(model.actor_id, Set("u2".to_string()));
        assert_eq!(model.verb, Set("follow".to_string()));
        assert_eq!(model.is_read, Set(false));
    }

    #[tokio::test]
    async fn test_list_and_mark_read() {
        let notification_conn = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![
                create_test_notification("n2", "u3", false, 1),
                create_test_notification("n1", "u2", true, 10),
            ]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();
        let notification_db = Arc::new(notification_conn);
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![
                    create_test_user("u2", "bob"),
                    create_test_user("u3", "carol"),
                ]])
                .into_connection(),
        );

        let service = NotificationService::new(
            NotificationRepository::new(Arc::clone(&notification_db)),
            MessageRepository::new(empty_db()),
            UserRepository::new(user_db),
        );

        let list = service.list_and_mark_read("u1").await.unwrap();

        assert_eq!(list.len(), 2);
        assert_eq!(list[0].actor.username, "carol");
        assert!(!list[0].notification.is_read);
        assert_eq!(list[1].actor.username, "bob");

        // Only the unread row that was listed gets marked.
        drop(service);
        let notification_conn =
            Arc::try_unwrap(notification_db).expect("service released the connection");
        let log = notification_conn.into_transaction_log();
        let update = &log[1].statements()[0];
        assert!(update.sql.starts_with(r#"UPDATE "notification""#));
        assert!(update.sql.contains(r#""notification"."id" IN ($3)"#));
    }

    #[tokio::test]
    async fn test_unread_counts() {
        let notification_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(2))
                }]])
                .into_connection(),
        );
        let message_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(3))
                }]])
                .into_connection(),
        );

        let service = NotificationService::new(
            NotificationRepository::new(notification_db),
            MessageRepository::new(message_db),
            UserRepository::new(empty_db()),
        );

        let counts = service.unread_counts("u1").await.unwrap();
        assert_eq!(counts.notifications, 2);
        assert_eq!(counts.messages, 3);
        assert_eq!(counts.total(), 5);
    }
}

//! Following service: the follow graph between users.

use myblog_common::{AppError, AppResult, IdGenerator};
use myblog_db::{
    entities::{contact, user},
    repositories::{ContactRepository, UserRepository},
};
use sea_orm::Set;

use super::notification::NotificationService;

/// Following service for business logic.
#[derive(Clone)]
pub struct FollowingService {
    contact_repo: ContactRepository,
    user_repo: UserRepository,
    notification_service: NotificationService,
    id_gen: IdGenerator,
}

impl FollowingService {
    /// Create a new following service.
    #[must_use]
    pub fn new(
        contact_repo: ContactRepository,
        user_repo: UserRepository,
        notification_service: NotificationService,
    ) -> Self {
        Self {
            contact_repo,
            user_repo,
            notification_service,
            id_gen: IdGenerator::new(),
        }
    }

    /// Follow `target_id`. Returns `false` when the edge already existed.
    ///
    /// Only a newly created edge notifies the target, and the edge and its
    /// notification are written together.
    pub async fn follow(&self, actor_id: &str, target_id: &str) -> AppResult<bool> {
        if actor_id == target_id {
            return Err(AppError::BadRequest("Cannot follow yourself".to_string()));
        }

        let target = self.user_repo.get_by_id(target_id).await?;

        if self.contact_repo.is_following(actor_id, &target.id).await? {
            tracing::debug!(actor_id = %actor_id, target_id = %target.id, "Already following");
            return Ok(false);
        }

        let edge = contact::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_from_id: Set(actor_id.to_string()),
            user_to_id: Set(target.id.clone()),
            created_at: Set(chrono::Utc::now().into()),
        };

        let notification = self
            .notification_service
            .follow_notification(&target.id, actor_id);

        if self
            .contact_repo
            .create_with_notification(edge, notification)
            .await?
            .is_none()
        {
            tracing::debug!(actor_id = %actor_id, target_id = %target.id, "Lost follow race");
            return Ok(false);
        }

        tracing::info!(actor_id = %actor_id, target_id = %target.id, "Followed");

        Ok(true)
    }

    /// Unfollow `target_id`. Returns `false` when there was no edge.
    pub async fn unfollow(&self, actor_id: &str, target_id: &str) -> AppResult<bool> {
        let removed = self.contact_repo.delete_by_pair(actor_id, target_id).await?;

        if removed {
            tracing::info!(actor_id = %actor_id, target_id = %target_id, "Unfollowed");
        } else {
            tracing::debug!(actor_id = %actor_id, target_id = %target_id, "Unfollow without edge");
        }

        Ok(removed)
    }

    /// Check if `follower_id` follows `followee_id`.
    pub async fn is_following(&self, follower_id: &str, followee_id: &str) -> AppResult<bool> {
        self.contact_repo.is_following(follower_id, followee_id).await
    }

    /// Both users follow each other.
    pub async fn is_mutual(&self, a: &str, b: &str) -> AppResult<bool> {
        if a == b {
            return Ok(false);
        }
        Ok(self.contact_repo.is_following(a, b).await?
            && self.contact_repo.is_following(b, a).await?)
    }

    /// Users who follow `user_id` and are followed back, i.e. chat partners.
    pub async fn mutual_contacts(&self, user_id: &str) -> AppResult<Vec<user::Model>> {
        let edges = self.contact_repo.find_mutual(user_id).await?;
        let ids: Vec<String> = edges.iter().map(|e| e.user_to_id.clone()).collect();

        let mut users = self.user_repo.find_by_ids(&ids).await?;
        users.sort_by(|a, b| a.username_lower.cmp(&b.username_lower));

        Ok(users)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use myblog_db::{
        entities::notification,
        repositories::{MessageRepository, NotificationRepository},
    };
    use sea_orm::{DatabaseBackend, DatabaseConnection, DbErr, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn create_test_user(id: &str, username: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: username.to_string(),
            username_lower: username.to_lowercase(),
            email: format!("{username}@example.com"),
            password_hash: "hash".to_string(),
            token: None,
            avatar: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_contact(id: &str, from: &str, to: &str) -> contact::Model {
        contact::Model {
            id: id.to_string(),
            user_from_id: from.to_string(),
            user_to_id: to.to_string(),
            created_at: Utc::now().into(),
        }
    }

    fn create_test_notification() -> notification::Model {
        notification::Model {
            id: "n1".to_string(),
            recipient_id: "u2".to_string(),
            actor_id: "u1".to_string(),
            verb: notification::VERB_FOLLOW.to_string(),
            is_read: false,
            created_at: Utc::now().into(),
        }
    }

    fn empty_db() -> Arc<DatabaseConnection> {
        Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection())
    }

    fn service(
        contact_db: Arc<DatabaseConnection>,
        user_db: Arc<DatabaseConnection>,
        notification_db: Arc<DatabaseConnection>,
    ) -> FollowingService {
        let notification_service = NotificationService::new(
            NotificationRepository::new(notification_db),
            MessageRepository::new(empty_db()),
            UserRepository::new(empty_db()),
        );
        FollowingService::new(
            ContactRepository::new(contact_db),
            UserRepository::new(user_db),
            notification_service,
        )
    }

    #[tokio::test]
    async fn test_follow_yourself_returns_error() {
        let service = service(empty_db(), empty_db(), empty_db());
        let result = service.follow("u1", "u1").await;

        match result {
            Err(AppError::BadRequest(msg)) => assert!(msg.contains("Cannot follow yourself")),
            other => panic!("Expected BadRequest error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_follow_unknown_user() {
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );

        let service = service(empty_db(), user_db, empty_db());
        let result = service.follow("u1", "ghost").await;

        assert!(matches!(result, Err(AppError::UserNotFound(_))));
    }

    #[tokio::test]
    async fn test_first_follow_creates_edge_and_notification() {
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user("u2", "bob")]])
                .into_connection(),
        );
        let contact_conn = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<contact::Model>::new()])
            .append_query_results([[create_test_contact("c1", "u1", "u2")]])
            .append_query_results([[create_test_notification()]])
            .into_connection();
        let contact_conn = Arc::new(contact_conn);

        let service = service(Arc::clone(&contact_conn), user_db, empty_db());

        assert!(service.follow("u1", "u2").await.unwrap());

        // Edge and notification land in the same transaction.
        drop(service);
        let contact_conn = Arc::try_unwrap(contact_conn).expect("service released the connection");
        let log = contact_conn.into_transaction_log();
        assert!(log.iter().any(|txn| {
            let inserts: Vec<&str> = txn
                .statements()
                .iter()
                .filter(|stmt| stmt.sql.starts_with("INSERT"))
                .map(|stmt| stmt.sql.as_str())
                .collect();
            inserts.len() == 2
                && inserts[0].starts_with(r#"INSERT INTO "contact""#)
                && inserts[1].starts_with(r#"INSERT INTO "notification""#)
        }));
    }

    #[tokio::test]
    async fn test_follow_fails_when_notification_cannot_be_written() {
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user("u2", "bob")]])
                .into_connection(),
        );
        let contact_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<contact::Model>::new()])
                .append_query_results([[create_test_contact("c1", "u1", "u2")]])
                .append_query_errors([DbErr::Custom("disk full".to_string())])
                .into_connection(),
        );

        let service = service(contact_db, user_db, empty_db());
        let result = service.follow("u1", "u2").await;

        assert!(matches!(result, Err(AppError::Database(_))));
    }

    #[tokio::test]
    async fn test_repeat_follow_is_a_no_op() {
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user("u2", "bob")]])
                .into_connection(),
        );
        let contact_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_contact("c1", "u1", "u2")]])
                .into_connection(),
        );

        // Nothing queued past the lookup: a second insert would fail the call
        let service = service(contact_db, user_db, empty_db());

        assert!(!service.follow("u1", "u2").await.unwrap());
    }

    #[tokio::test]
    async fn test_unfollow_without_edge() {
        let contact_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let service = service(contact_db, empty_db(), empty_db());

        assert!(!service.unfollow("u1", "u2").await.unwrap());
    }

    #[tokio::test]
    async fn test_is_mutual() {
        let contact_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_contact("c1", "u1", "u2")]])
                .append_query_results([[create_test_contact("c2", "u2", "u1")]])
                .append_query_results([[create_test_contact("c1", "u1", "u2")]])
                .append_query_results([Vec::<contact::Model>::new()])
                .into_connection(),
        );

        let service = service(contact_db, empty_db(), empty_db());

        assert!(service.is_mutual("u1", "u2").await.unwrap());
        assert!(!service.is_mutual("u1", "u3").await.unwrap());
        assert!(!service.is_mutual("u1", "u1").await.unwrap());
    }

    #[tokio::test]
    async fn test_mutual_contacts_sorted_by_username() {
        let contact_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![
                    create_test_contact("c1", "u1", "u3"),
                    create_test_contact("c2", "u1", "u2"),
                ]])
                .into_connection(),
        );
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![
                    create_test_user("u3", "Zed"),
                    create_test_user("u2", "amy"),
                ]])
                .into_connection(),
        );

        let service = service(contact_db, user_db, empty_db());
        let contacts = service.mutual_contacts("u1").await.unwrap();

        let names: Vec<&str> = contacts.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, ["amy", "Zed"]);
    }
}

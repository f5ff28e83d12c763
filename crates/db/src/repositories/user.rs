//! User repository.

use std::sync::Arc;

use super::is_unique_violation;
use crate::entities::{user, user_profile, User};
use myblog_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};

/// User repository for database operations.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<user::Model>> {
        User::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<user::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(id.to_string()))
    }

    /// Find several users at once.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<user::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        User::find()
            .filter(user::Column::Id.is_in(ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by username (case-insensitive).
    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::UsernameLower.eq(username.to_lowercase()))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by username, returning an error if not found.
    pub async fn get_by_username(&self, username: &str) -> AppResult<user::Model> {
        self.find_by_username(username)
            .await?
            .ok_or_else(|| AppError::UserNotFound(username.to_string()))
    }

    /// Find a user by session token.
    pub async fn find_by_token(&self, token: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Token.eq(token))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a user and their profile in one transaction.
    ///
    /// A username collision that slips past the service's pre-check
    /// surfaces as [`AppError::Conflict`].
    pub async fn create_with_profile(
        &self,
        user: user::ActiveModel,
        profile: user_profile::ActiveModel,
    ) -> AppResult<(user::Model, user_profile::Model)> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let user = match user.insert(&txn).await {
            Ok(created) => created,
            Err(e) if is_unique_violation(&e) => {
                tracing::debug!(error = %e, "Username taken during insert");
                txn.rollback()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                return Err(AppError::Conflict(
                    "A user with that username already exists".to_string(),
                ));
            }
            Err(e) => return Err(AppError::Database(e.to_string())),
        };
        let profile = profile
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok((user, profile))
    }

    /// Update a user.
    pub async fn update(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a user. Owned rows go with it through `ON DELETE CASCADE`.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        User::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Case-insensitive username substring search.
    pub async fn search(&self, query: &str) -> AppResult<Vec<user::Model>> {
        let escaped = query
            .to_lowercase()
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");

        User::find()
            .filter(user::Column::UsernameLower.like(format!("%{escaped}%")))
            .order_by_asc(user::Column::UsernameLower)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Set};

    fn create_test_user(id: &str, username: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: username.to_string(),
            username_lower: username.to_lowercase(),
            email: format!("{}@example.com", username.to_lowercase()),
            password_hash: "hash".to_string(),
            token: Some(format!("token_{id}")),
            avatar: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_profile(user_id: &str) -> user_profile::Model {
        user_profile::Model {
            user_id: user_id.to_string(),
            bio: String::new(),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_username_is_case_insensitive() {
        let alice = create_test_user("u1", "Alice");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[alice.clone()]])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let found = repo.find_by_username("ALICE").await.unwrap().unwrap();
        assert_eq!(found.username, "Alice");
        assert_eq!(found.username_lower, "alice");
    }

    #[tokio::test]
    async fn test_get_by_username_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let result = repo.get_by_username("nobody").await;

        assert!(matches!(result, Err(AppError::UserNotFound(_))));
    }

    #[tokio::test]
    async fn test_find_by_token() {
        let alice = create_test_user("u1", "alice");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[alice.clone()]])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let found = repo.find_by_token("token_u1").await.unwrap();

        assert_eq!(found.unwrap().id, "u1");
    }

    #[tokio::test]
    async fn test_find_by_ids_empty_skips_query() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = UserRepository::new(db);
        let users = repo.find_by_ids(&[]).await.unwrap();

        assert!(users.is_empty());
    }

    #[tokio::test]
    async fn test_create_with_profile_inserts_both() {
        let alice = create_test_user("u1", "alice");
        let profile = create_test_profile("u1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[alice.clone()]])
                .append_query_results([[profile.clone()]])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let user_model = user::ActiveModel {
            id: Set("u1".to_string()),
            username: Set("alice".to_string()),
            username_lower: Set("alice".to_string()),
            email: Set("alice@example.com".to_string()),
            password_hash: Set("hash".to_string()),
            token: Set(Some("token_u1".to_string())),
            avatar: Set(None),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };
        let profile_model = user_profile::ActiveModel {
            user_id: Set("u1".to_string()),
            bio: Set(String::new()),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let (user, profile) = repo
            .create_with_profile(user_model, profile_model)
            .await
            .unwrap();

        assert_eq!(user.id, "u1");
        assert_eq!(profile.user_id, user.id);
    }

    #[tokio::test]
    async fn test_search() {
        let users = vec![
            create_test_user("u1", "alice"),
            create_test_user("u2", "malice"),
        ];

        let conn = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([users])
            .into_connection();

        let conn = Arc::new(conn);
        let repo = UserRepository::new(Arc::clone(&conn));
        let result = repo.search("ALI").await.unwrap();

        assert_eq!(result.len(), 2);

        // Every match is returned; the query is not capped.
        drop(repo);
        let conn = Arc::try_unwrap(conn).expect("repository released the connection");
        let log = conn.into_transaction_log();
        let sql = &log[0].statements()[0].sql;
        assert!(sql.contains(r#""user"."username_lower" LIKE"#));
        assert!(!sql.contains("LIMIT"));
    }

    #[tokio::test]
    async fn test_delete() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        assert!(repo.delete("u1").await.is_ok());
    }
}

//! Repository layer.
//!
//! Each repository wraps one table and maps `DbErr` to
//! [`myblog_common::AppError::Database`].

pub mod comment;
pub mod comment_like;
pub mod contact;
pub mod message;
pub mod notification;
pub mod post;
pub mod user;
pub mod user_profile;

pub use comment::CommentRepository;
pub use comment_like::CommentLikeRepository;
pub use contact::ContactRepository;
pub use message::MessageRepository;
pub use notification::NotificationRepository;
pub use post::PostRepository;
pub use user::UserRepository;
pub use user_profile::UserProfileRepository;

use sea_orm::{DbErr, SqlErr};

/// Whether `e` is a unique or primary key collision.
pub(crate) fn is_unique_violation(e: &DbErr) -> bool {
    matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_other_errors_are_not_unique_violations() {
        assert!(!is_unique_violation(&DbErr::RecordNotFound("user".to_string())));
        assert!(!is_unique_violation(&DbErr::Custom("connection reset".to_string())));
    }
}

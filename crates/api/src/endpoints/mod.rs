//! API endpoints.

mod accounts;
mod comments;
mod messaging;
mod notifications;
mod posts;
mod users;

use axum::Router;

use crate::middleware::AppState;

pub use notifications::UnreadResponse;
pub use users::{FollowStatus, UserResponse};

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(posts::router())
        .merge(comments::router())
        .merge(users::router())
        .merge(messaging::router())
        .merge(notifications::router())
        .merge(accounts::router())
}

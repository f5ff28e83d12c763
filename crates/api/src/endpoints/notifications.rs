//! Notification endpoints and unread counters.

use axum::{Router, extract::State, routing::get};
use myblog_common::AppResult;
use myblog_core::{NotificationView, UnreadCounts};
use serde::Serialize;

use super::users::UserResponse;
use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Unread counters shown next to the navigation links.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct UnreadResponse {
    pub unread_notifications_count: u64,
    pub unread_messages_count: u64,
    pub total_unread_count: u64,
}

impl From<UnreadCounts> for UnreadResponse {
    fn from(counts: UnreadCounts) -> Self {
        Self {
            unread_notifications_count: counts.notifications,
            unread_messages_count: counts.messages,
            total_unread_count: counts.total(),
        }
    }
}

/// Unread counters for a logged-in viewer; `None` for anonymous ones.
pub async fn unread_for(state: &AppState, viewer_id: Option<&str>) -> AppResult<Option<UnreadResponse>> {
    match viewer_id {
        Some(id) => Ok(Some(
            state.notification_service.unread_counts(id).await?.into(),
        )),
        None => Ok(None),
    }
}

/// Notification response.
#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    pub id: String,
    pub verb: String,
    pub actor: UserResponse,
    /// Read state before this listing marked it read.
    pub is_read: bool,
    pub created_at: String,
}

impl From<NotificationView> for NotificationResponse {
    fn from(view: NotificationView) -> Self {
        Self {
            id: view.notification.id,
            verb: view.notification.verb,
            actor: view.actor.into(),
            is_read: view.notification.is_read,
            created_at: view.notification.created_at.to_rfc3339(),
        }
    }
}

/// Notification page.
#[derive(Debug, Serialize)]
pub struct NotificationsResponse {
    /// Newest first.
    pub notifications: Vec<NotificationResponse>,
    pub unread: UnreadResponse,
}

/// List notifications and mark them all read.
async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<NotificationsResponse>> {
    let notifications = state.notification_service.list_and_mark_read(&user.id).await?;
    let unread = state.notification_service.unread_counts(&user.id).await?;

    Ok(ApiResponse::ok(NotificationsResponse {
        notifications: notifications
            .into_iter()
            .map(NotificationResponse::from)
            .collect(),
        unread: unread.into(),
    }))
}

/// Create the notifications router.
pub fn router() -> Router<AppState> {
    Router::new().route("/users/notifications/", get(list))
}

//! API middleware.

#![allow(missing_docs)]

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use myblog_common::config::SessionConfig;
use myblog_core::{
    CommentService, FollowingService, MessagingService, NotificationService, PostService,
    UserService,
};
use myblog_db::repositories::{
    CommentLikeRepository, CommentRepository, ContactRepository, MessageRepository,
    NotificationRepository, PostRepository, UserProfileRepository, UserRepository,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub post_service: PostService,
    pub comment_service: CommentService,
    pub following_service: FollowingService,
    pub messaging_service: MessagingService,
    pub notification_service: NotificationService,
    pub session: SessionConfig,
}

impl AppState {
    /// Wire every repository and service onto one connection pool.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, session: SessionConfig) -> Self {
        let user_repo = UserRepository::new(Arc::clone(&db));
        let profile_repo = UserProfileRepository::new(Arc::clone(&db));
        let post_repo = PostRepository::new(Arc::clone(&db));
        let comment_repo = CommentRepository::new(Arc::clone(&db));
        let like_repo = CommentLikeRepository::new(Arc::clone(&db));
        let contact_repo = ContactRepository::new(Arc::clone(&db));
        let message_repo = MessageRepository::new(Arc::clone(&db));
        let notification_repo = NotificationRepository::new(db);

        let notification_service = NotificationService::new(
            notification_repo,
            message_repo.clone(),
            user_repo.clone(),
        );

        Self {
            user_service: UserService::new(
                user_repo.clone(),
                profile_repo,
                post_repo.clone(),
                contact_repo.clone(),
            ),
            post_service: PostService::new(
                post_repo.clone(),
                user_repo.clone(),
                comment_repo.clone(),
                like_repo.clone(),
            ),
            comment_service: CommentService::new(comment_repo, post_repo, like_repo),
            following_service: FollowingService::new(
                contact_repo.clone(),
                user_repo.clone(),
                notification_service.clone(),
            ),
            messaging_service: MessagingService::new(message_repo, contact_repo, user_repo),
            notification_service,
            session,
        }
    }
}

/// Authentication middleware.
///
/// Looks for a session token in the session cookie first, then in an
/// `Authorization: Bearer` header. A valid token puts the user into the
/// request extensions; anything else leaves the request anonymous.
pub async fn auth_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let cookie_token = jar
        .get(&state.session.cookie_name)
        .map(|cookie| cookie.value().to_string());

    let header_token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(ToString::to_string);

    if let Some(token) = cookie_token.or(header_token).filter(|t| !t.is_empty()) {
        match state.user_service.authenticate_by_token(&token).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(e) if e.is_server_error() => {
                tracing::error!(error = %e, "Session lookup failed");
            }
            Err(_) => {
                tracing::debug!("Ignoring unknown session token");
            }
        }
    }

    next.run(req).await
}

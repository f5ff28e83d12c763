//! API response types.

use axum::{
    Json,
    response::{IntoResponse, Redirect, Response},
};
use serde::Serialize;

/// Path of the login page.
pub const LOGIN_PATH: &str = "/accounts/login/";

/// Standard API response wrapper: `{ "data": ... }`.
///
/// Errors are rendered by `AppError` as `{ "error": { "code", "message" } }`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a success response.
    pub const fn ok(data: T) -> Self {
        Self { data }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// `303 See Other` to `path`, as sent after every successful form post.
#[must_use]
pub fn see_other(path: &str) -> Response {
    Redirect::to(path).into_response()
}

/// Login page URL that returns to `next` afterwards.
#[must_use]
pub fn login_url(next: &str) -> String {
    format!("{LOGIN_PATH}?next={}", urlencoding::encode(next))
}

/// Only local absolute paths are honoured as a post-login target.
#[must_use]
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path
        }
        _ => "/",
    }
}

/// Public page of a post.
#[must_use]
pub fn post_path(id: &str) -> String {
    format!("/post/{id}/")
}

/// Public profile page of a user.
#[must_use]
pub fn profile_path(username: &str) -> String {
    format!("/users/{}/", urlencoding::encode(username))
}

/// Chat thread with a user.
#[must_use]
pub fn chat_path(username: &str) -> String {
    format!("/users/{}/chat/", urlencoding::encode(username))
}

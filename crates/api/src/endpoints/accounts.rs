//! Account endpoints: login, logout, registration and deletion.

use axum::{
    Form, Router,
    extract::{Query, State},
    response::Response,
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use myblog_common::AppResult;
use myblog_core::RegisterInput;
use serde::{Deserialize, Serialize};

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, safe_next, see_other},
};

fn session_cookie(state: &AppState, token: String) -> Cookie<'static> {
    Cookie::build((state.session.cookie_name.clone(), token))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.session.secure)
        .path("/")
        .build()
}

fn clear_session(state: &AppState, jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(state.session.cookie_name.clone()).path("/"))
}

/// `?next=` on the login page.
#[derive(Debug, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// Login page data.
#[derive(Debug, Serialize)]
pub struct LoginFormResponse {
    /// Where a successful login will go.
    pub next: String,
}

/// Login form.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub next: Option<String>,
}

/// Show the login form.
async fn login_form(Query(query): Query<NextQuery>) -> ApiResponse<LoginFormResponse> {
    ApiResponse::ok(LoginFormResponse {
        next: safe_next(query.next.as_deref()).to_string(),
    })
}

/// Check credentials, set the session cookie and go to `next`.
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> AppResult<(CookieJar, Response)> {
    let session = state
        .user_service
        .login(&form.username, &form.password)
        .await?;

    let next = safe_next(form.next.as_deref()).to_string();
    let jar = jar.add(session_cookie(&state, session.token));

    Ok((jar, see_other(&next)))
}

/// End the session.
async fn logout(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Response)> {
    state.user_service.logout(&user.id).await?;
    Ok((clear_session(&state, jar), see_other("/")))
}

/// Create an account and log it in.
async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(input): Form<RegisterInput>,
) -> AppResult<(CookieJar, Response)> {
    let session = state.user_service.register(input).await?;
    let jar = jar.add(session_cookie(&state, session.token));

    Ok((jar, see_other("/")))
}

/// Account deletion form.
#[derive(Debug, Deserialize)]
pub struct DeleteAccountForm {
    pub password: String,
}

/// Delete the current account after re-checking the password.
async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<DeleteAccountForm>,
) -> AppResult<(CookieJar, Response)> {
    state
        .user_service
        .delete_account(&user.id, &form.password)
        .await?;

    Ok((clear_session(&state, jar), see_other("/")))
}

/// Create the accounts router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/accounts/login/", get(login_form).post(login))
        .route("/accounts/logout/", post(logout))
        .route("/accounts/register/", post(register))
        .route("/accounts/delete/", post(delete))
}

//! User endpoints: search, profiles, profile editing and follow.

use axum::{
    Form, Json, Router,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use myblog_common::{AppError, AppResult};
use myblog_core::{ProfileView, UpdateProfileInput};
use myblog_db::entities::user::{self, AVATAR_CHOICES};
use serde::{Deserialize, Serialize};

use super::notifications::{UnreadResponse, unread_for};
use super::posts::PostResponse;
use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::{ApiResponse, profile_path, see_other},
};

/// User response.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    /// Avatar path with the default applied.
    pub avatar: String,
    pub created_at: String,
}

impl From<user::Model> for UserResponse {
    fn from(user: user::Model) -> Self {
        Self {
            avatar: user.avatar_or_default().to_string(),
            id: user.id,
            username: user.username,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Public profile page.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: UserResponse,
    pub bio: String,
    /// Newest first.
    pub posts: Vec<PostResponse>,
    pub followers_count: u64,
    pub following_count: u64,
    pub is_following: bool,
    pub is_own_profile: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unread: Option<UnreadResponse>,
}

impl ProfileResponse {
    fn new(view: ProfileView, unread: Option<UnreadResponse>) -> Self {
        Self {
            bio: view.profile.bio,
            posts: view.posts.into_iter().map(PostResponse::from).collect(),
            followers_count: view.followers_count,
            following_count: view.following_count,
            is_following: view.is_following,
            is_own_profile: view.is_own_profile,
            user: view.user.into(),
            unread,
        }
    }
}

/// Search query.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// Search results.
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<UserResponse>,
}

/// Search users by username.
async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<ApiResponse<SearchResponse>> {
    let query = query.q.unwrap_or_default();
    let results = state.user_service.search(&query).await?;

    Ok(ApiResponse::ok(SearchResponse {
        query,
        results: results.into_iter().map(UserResponse::from).collect(),
    }))
}

/// Show a user's public profile.
async fn profile(
    viewer: MaybeAuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<ApiResponse<ProfileResponse>> {
    let view = state.user_service.profile(&username, viewer.id()).await?;
    let unread = unread_for(&state, viewer.id()).await?;

    Ok(ApiResponse::ok(ProfileResponse::new(view, unread)))
}

/// A selectable avatar.
#[derive(Debug, Serialize)]
pub struct AvatarChoice {
    pub path: &'static str,
    pub label: &'static str,
}

/// Initial values of the profile edit form.
#[derive(Debug, Serialize)]
pub struct ProfileFormResponse {
    pub username: String,
    pub email: String,
    pub avatar: String,
    pub bio: String,
    pub avatar_choices: Vec<AvatarChoice>,
}

fn is_own(user: &user::Model, username: &str) -> bool {
    user.username_lower == username.to_lowercase()
}

/// Show the profile edit form. Other users' forms redirect to their profile.
async fn edit_form(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<Response> {
    if !is_own(&user, &username) {
        tracing::warn!(user_id = %user.id, target = %username, "Rejected profile edit by non-owner");
        return Ok(see_other(&profile_path(&username)));
    }

    let profile = state.user_service.get_profile(&user.id).await?;

    let form = ProfileFormResponse {
        avatar: user.avatar_or_default().to_string(),
        username: user.username,
        email: user.email,
        bio: profile.bio,
        avatar_choices: AVATAR_CHOICES
            .iter()
            .map(|&(path, label)| AvatarChoice { path, label })
            .collect(),
    };

    Ok(ApiResponse::ok(form).into_response())
}

/// Apply the profile edit form, then show the (possibly renamed) profile.
async fn edit(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
    Form(mut input): Form<UpdateProfileInput>,
) -> AppResult<Response> {
    if !is_own(&user, &username) {
        tracing::warn!(user_id = %user.id, target = %username, "Rejected profile edit by non-owner");
        return Ok(see_other(&profile_path(&username)));
    }

    // An empty select means "keep the default"
    input.avatar = input.avatar.filter(|avatar| !avatar.is_empty());

    let updated = state.user_service.update_profile(&user.id, input).await?;

    Ok(see_other(&profile_path(&updated.username)))
}

/// Follow form: `id` of the target user and `action`.
#[derive(Debug, Deserialize)]
pub struct FollowForm {
    pub id: Option<String>,
    pub action: Option<String>,
}

/// Follow result: `{"status": "ok" | "error"}`.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct FollowStatus {
    pub status: &'static str,
}

impl FollowStatus {
    const OK: Self = Self { status: "ok" };
    const ERROR: Self = Self { status: "error" };
}

/// Follow or unfollow a user.
async fn follow(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Form(form): Form<FollowForm>,
) -> Json<FollowStatus> {
    let (Some(target_id), Some(action)) = (form.id, form.action) else {
        return Json(FollowStatus::ERROR);
    };

    let result = match action.as_str() {
        "follow" => state.following_service.follow(&user.id, &target_id).await,
        "unfollow" => match state.user_service.get(&target_id).await {
            Ok(target) if target.id != user.id => {
                state.following_service.unfollow(&user.id, &target.id).await
            }
            Ok(_) => Err(AppError::BadRequest("Cannot unfollow yourself".to_string())),
            Err(e) => Err(e),
        },
        other => Err(AppError::BadRequest(format!("Unknown action: {other}"))),
    };

    match result {
        Ok(_) => Json(FollowStatus::OK),
        Err(e) => {
            if e.is_server_error() {
                tracing::error!(error = %e, "Follow request failed");
            } else {
                tracing::debug!(error = %e, "Follow request rejected");
            }
            Json(FollowStatus::ERROR)
        }
    }
}

/// Create the users router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/search/", get(search))
        .route("/users/follow/", post(follow))
        .route("/users/{username}/", get(profile))
        .route("/users/{username}/edit/", get(edit_form).post(edit))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_named(username: &str) -> user::Model {
        user::Model {
            id: "u1".to_string(),
            username: username.to_string(),
            username_lower: username.to_lowercase(),
            email: String::new(),
            password_hash: String::new(),
            token: None,
            avatar: None,
            created_at: chrono::Utc::now().into(),
            updated_at: None,
        }
    }

    #[test]
    fn test_is_own_ignores_case() {
        assert!(is_own(&user_named("Alice"), "alice"));
        assert!(!is_own(&user_named("Alice"), "alicia"));
    }

    #[test]
    fn test_is_own_folds_non_ascii() {
        assert!(is_own(&user_named("Émile"), "émile"));
        assert!(is_own(&user_named("émile"), "ÉMILE"));
    }
}

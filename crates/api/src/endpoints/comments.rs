//! Comment endpoints.

use axum::{
    Router,
    extract::{Path, State},
    response::Response,
    routing::post,
};
use myblog_common::AppResult;

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{post_path, see_other},
};

/// Toggle the current user's like on a comment.
async fn like(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let toggle = state.comment_service.toggle_like(&user.id, &id).await?;
    Ok(see_other(&post_path(&toggle.post_id)))
}

/// Delete a comment. Only its author can; everyone ends up back on the post.
async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let deletion = state.comment_service.delete(&user.id, &id).await?;
    Ok(see_other(&post_path(&deletion.post_id)))
}

/// Create the comments router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/comment/{id}/like/", post(like))
        .route("/comment/{id}/delete/", post(delete))
}

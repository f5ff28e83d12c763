//! Post endpoints: index, detail, comments, create, edit and delete.

use axum::{
    Form, Router,
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use myblog_common::{AppError, AppResult};
use myblog_core::{CommentInput, CommentView, PostDetail, PostInput, PostSummary};
use myblog_db::entities::post;
use serde::Serialize;

use super::users::UserResponse;
use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::{ApiResponse, post_path, see_other},
};

/// Post response.
#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub id: String,
    pub author_id: String,
    pub title: String,
    pub body: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<post::Model> for PostResponse {
    fn from(post: post::Model) -> Self {
        Self {
            id: post.id,
            author_id: post.author_id,
            title: post.title,
            body: post.body,
            created_at: post.created_at.to_rfc3339(),
            updated_at: post.updated_at.to_rfc3339(),
        }
    }
}

/// Post list item.
#[derive(Debug, Serialize)]
pub struct PostSummaryResponse {
    #[serde(flatten)]
    pub post: PostResponse,
    pub author: UserResponse,
}

impl From<PostSummary> for PostSummaryResponse {
    fn from(summary: PostSummary) -> Self {
        Self {
            post: summary.post.into(),
            author: summary.author.into(),
        }
    }
}

/// Comment with author and likes.
#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub id: String,
    pub body: String,
    pub created_at: String,
    pub author: UserResponse,
    pub like_count: usize,
    pub liked_by_me: bool,
}

impl From<CommentView> for CommentResponse {
    fn from(view: CommentView) -> Self {
        Self {
            id: view.comment.id,
            body: view.comment.body,
            created_at: view.comment.created_at.to_rfc3339(),
            author: view.author.into(),
            like_count: view.like_count,
            liked_by_me: view.liked_by_me,
        }
    }
}

/// Table of contents entry.
#[derive(Debug, Serialize)]
pub struct TocEntryResponse {
    pub level: u8,
    pub id: String,
    pub title: String,
}

/// Post detail page.
#[derive(Debug, Serialize)]
pub struct PostDetailResponse {
    #[serde(flatten)]
    pub post: PostResponse,
    pub author: UserResponse,
    /// Body rendered from Markdown.
    pub html: String,
    pub toc: Vec<TocEntryResponse>,
    pub toc_html: String,
    /// Newest first.
    pub comments: Vec<CommentResponse>,
}

impl From<PostDetail> for PostDetailResponse {
    fn from(detail: PostDetail) -> Self {
        let toc_html = detail.rendered.toc_html();
        Self {
            post: detail.post.into(),
            author: detail.author.into(),
            html: detail.rendered.html,
            toc: detail
                .rendered
                .toc
                .into_iter()
                .map(|entry| TocEntryResponse {
                    level: entry.level,
                    id: entry.id,
                    title: entry.title,
                })
                .collect(),
            toc_html,
            comments: detail.comments.into_iter().map(CommentResponse::from).collect(),
        }
    }
}

/// Initial values of the post form.
#[derive(Debug, Default, Serialize)]
pub struct PostFormResponse {
    pub title: String,
    pub body: String,
}

/// All posts, newest first.
async fn index(State(state): State<AppState>) -> AppResult<ApiResponse<Vec<PostSummaryResponse>>> {
    let posts = state.post_service.list().await?;
    Ok(ApiResponse::ok(
        posts.into_iter().map(PostSummaryResponse::from).collect(),
    ))
}

/// Post detail with comments.
async fn detail(
    viewer: MaybeAuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<PostDetailResponse>> {
    let detail = state.post_service.detail(&id, viewer.id()).await?;
    Ok(ApiResponse::ok(detail.into()))
}

/// Add a comment, then return to the post.
async fn comment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(input): Form<CommentInput>,
) -> AppResult<Response> {
    let comment = state.comment_service.create(&id, &user.id, input).await?;
    Ok(see_other(&post_path(&comment.post_id)))
}

/// Empty post form.
async fn new_form(AuthUser(_user): AuthUser) -> ApiResponse<PostFormResponse> {
    ApiResponse::ok(PostFormResponse::default())
}

/// Create a post.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Form(input): Form<PostInput>,
) -> AppResult<Response> {
    let post = state.post_service.create(&user.id, input).await?;
    Ok(see_other(&post_path(&post.id)))
}

/// Post form with current values. Non-authors go back to the post.
async fn edit_form(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    match state.post_service.get_for_edit(&user.id, &id).await {
        Ok(post) => Ok(ApiResponse::ok(PostFormResponse {
            title: post.title,
            body: post.body,
        })
        .into_response()),
        Err(AppError::Forbidden(_)) => Ok(see_other(&post_path(&id))),
        Err(e) => Err(e),
    }
}

/// Update a post.
async fn edit(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(input): Form<PostInput>,
) -> AppResult<Response> {
    match state.post_service.update(&user.id, &id, input).await {
        Ok(post) => Ok(see_other(&post_path(&post.id))),
        Err(AppError::Forbidden(_)) => Ok(see_other(&post_path(&id))),
        Err(e) => Err(e),
    }
}

/// Delete a post.
async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    match state.post_service.delete(&user.id, &id).await {
        Ok(()) => Ok(see_other("/")),
        Err(AppError::Forbidden(_)) => Ok(see_other(&post_path(&id))),
        Err(e) => Err(e),
    }
}

/// Create the posts router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/post/new/", get(new_form).post(create))
        .route("/post/{id}/", get(detail).post(comment))
        .route("/post/{id}/edit/", get(edit_form).post(edit))
        .route("/post/{id}/delete/", post(delete))
}

//! Post service.

use std::collections::{HashMap, HashSet};

use myblog_common::{AppError, AppResult, IdGenerator};
use myblog_db::{
    entities::{comment, post, user},
    repositories::{CommentLikeRepository, CommentRepository, PostRepository, UserRepository},
};
use myblog_markdown::Rendered;
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

/// Post service for business logic.
#[derive(Clone)]
pub struct PostService {
    post_repo: PostRepository,
    user_repo: UserRepository,
    comment_repo: CommentRepository,
    like_repo: CommentLikeRepository,
    id_gen: IdGenerator,
}

/// Input for creating or editing a post.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PostInput {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[validate(length(min = 1))]
    pub body: String,
}

impl PostInput {
    fn normalized(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            body: self.body.trim_end().to_string(),
        }
    }
}

/// A post with its author, for listings.
#[derive(Debug, Clone)]
pub struct PostSummary {
    pub post: post::Model,
    pub author: user::Model,
}

/// A comment with its author and likes.
#[derive(Debug, Clone)]
pub struct CommentView {
    pub comment: comment::Model,
    pub author: user::Model,
    pub like_count: usize,
    pub liked_by_me: bool,
}

/// Everything shown on the post detail page.
#[derive(Debug, Clone)]
pub struct PostDetail {
    pub post: post::Model,
    pub author: user::Model,
    pub rendered: Rendered,
    /// Newest first.
    pub comments: Vec<CommentView>,
}

impl PostService {
    /// Create a new post service.
    #[must_use]
    pub fn new(
        post_repo: PostRepository,
        user_repo: UserRepository,
        comment_repo: CommentRepository,
        like_repo: CommentLikeRepository,
    ) -> Self {
        Self {
            post_repo,
            user_repo,
            comment_repo,
            like_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Get a post by ID.
    pub async fn get(&self, id: &str) -> AppResult<post::Model> {
        self.post_repo.get_by_id(id).await
    }

    /// All posts with their authors, newest first.
    pub async fn list(&self) -> AppResult<Vec<PostSummary>> {
        let posts = self.post_repo.find_all().await?;
        let authors = self
            .users_by_id(posts.iter().map(|p| p.author_id.clone()))
            .await?;

        Ok(posts
            .into_iter()
            .filter_map(|post| {
                let author = authors.get(&post.author_id)?.clone();
                Some(PostSummary { post, author })
            })
            .collect())
    }

    /// Post with rendered body and comments, as seen by `viewer_id`.
    pub async fn detail(&self, id: &str, viewer_id: Option<&str>) -> AppResult<PostDetail> {
        let post = self.post_repo.get_by_id(id).await?;
        let comments = self.comment_repo.find_by_post(&post.id).await?;

        let comment_ids: Vec<String> = comments.iter().map(|c| c.id.clone()).collect();
        let likes = self.like_repo.find_by_comments(&comment_ids).await?;

        let mut like_counts: HashMap<&str, usize> = HashMap::new();
        let mut liked_by_me: HashSet<&str> = HashSet::new();
        for like in &likes {
            *like_counts.entry(like.comment_id.as_str()).or_default() += 1;
            if viewer_id == Some(like.user_id.as_str()) {
                liked_by_me.insert(like.comment_id.as_str());
            }
        }

        let mut users = self
            .users_by_id(
                std::iter::once(post.author_id.clone())
                    .chain(comments.iter().map(|c| c.user_id.clone())),
            )
            .await?;

        let author = users
            .remove(&post.author_id)
            .ok_or_else(|| AppError::UserNotFound(post.author_id.clone()))?;

        let comments = comments
            .into_iter()
            .filter_map(|comment| {
                let comment_author = if comment.user_id == author.id {
                    author.clone()
                } else {
                    users.get(&comment.user_id)?.clone()
                };
                Some(CommentView {
                    like_count: like_counts.get(comment.id.as_str()).copied().unwrap_or(0),
                    liked_by_me: liked_by_me.contains(comment.id.as_str()),
                    author: comment_author,
                    comment,
                })
            })
            .collect();

        let rendered = myblog_markdown::render(&post.body);

        Ok(PostDetail {
            post,
            author,
            rendered,
            comments,
        })
    }

    /// Create a post.
    pub async fn create(&self, author_id: &str, input: PostInput) -> AppResult<post::Model> {
        let input = input.normalized();
        input.validate()?;

        let now = chrono::Utc::now();
        let model = post::ActiveModel {
            id: Set(self.id_gen.generate()),
            author_id: Set(author_id.to_string()),
            title: Set(input.title),
            body: Set(input.body),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let post = self.post_repo.create(model).await?;
        tracing::info!(post_id = %post.id, author_id = %author_id, "Post created");

        Ok(post)
    }

    /// Get a post for its edit form. Only the author may edit.
    pub async fn get_for_edit(&self, user_id: &str, id: &str) -> AppResult<post::Model> {
        let post = self.post_repo.get_by_id(id).await?;
        ensure_author(&post, user_id)?;
        Ok(post)
    }

    /// Update a post. Only the author may edit.
    pub async fn update(&self, user_id: &str, id: &str, input: PostInput) -> AppResult<post::Model> {
        let post = self.post_repo.get_by_id(id).await?;
        ensure_author(&post, user_id)?;

        let input = input.normalized();
        input.validate()?;

        let mut active: post::ActiveModel = post.into();
        active.title = Set(input.title);
        active.body = Set(input.body);
        active.updated_at = Set(chrono::Utc::now().into());

        let post = self.post_repo.update(active).await?;
        tracing::info!(post_id = %post.id, "Post updated");

        Ok(post)
    }

    /// Delete a post. Only the author may delete.
    pub async fn delete(&self, user_id: &str, id: &str) -> AppResult<()> {
        let post = self.post_repo.get_by_id(id).await?;
        ensure_author(&post, user_id)?;

        self.post_repo.delete(&post.id).await?;
        tracing::info!(post_id = %post.id, "Post deleted");

        Ok(())
    }

    async fn users_by_id(
        &self,
        ids: impl Iterator<Item = String>,
    ) -> AppResult<HashMap<String, user::Model>> {
        let mut ids: Vec<String> = ids.collect();
        ids.sort();
        ids.dedup();

        Ok(self
            .user_repo
            .find_by_ids(&ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect())
    }
}

fn ensure_author(post: &post::Model, user_id: &str) -> AppResult<()> {
    if post.author_id == user_id {
        Ok(())
    } else {
        tracing::warn!(post_id = %post.id, user_id = %user_id, "Rejected edit by non-author");
        Err(AppError::Forbidden("Only the author can change this post".to_string()))
    }
}

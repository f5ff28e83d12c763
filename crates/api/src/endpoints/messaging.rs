//! Chat endpoints.

use axum::{
    Form, Router,
    extract::{Path, State},
    response::Response,
    routing::get,
};
use myblog_common::AppResult;
use myblog_db::entities::message;
use serde::{Deserialize, Serialize};

use super::notifications::UnreadResponse;
use super::users::UserResponse;
use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, chat_path, see_other},
};

/// Message response.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub id: String,
    pub sender_id: String,
    pub recipient_id: String,
    pub content: String,
    pub is_read: bool,
    pub created_at: String,
}

impl From<message::Model> for MessageResponse {
    fn from(message: message::Model) -> Self {
        Self {
            id: message.id,
            sender_id: message.sender_id,
            recipient_id: message.recipient_id,
            content: message.content,
            is_read: message.is_read,
            created_at: message.created_at.to_rfc3339(),
        }
    }
}

/// Chat list: everyone the user can message.
#[derive(Debug, Serialize)]
pub struct ChatListResponse {
    pub contacts: Vec<UserResponse>,
    pub unread: UnreadResponse,
}

/// A chat thread, oldest message first.
#[derive(Debug, Serialize)]
pub struct ConversationResponse {
    pub partner: UserResponse,
    pub messages: Vec<MessageResponse>,
    pub unread: UnreadResponse,
}

/// Message form.
#[derive(Debug, Deserialize)]
pub struct MessageForm {
    #[serde(default)]
    pub content: String,
}

/// Mutual followers of the current user.
async fn chat_list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<ChatListResponse>> {
    let contacts = state.following_service.mutual_contacts(&user.id).await?;
    let unread = state.notification_service.unread_counts(&user.id).await?;

    Ok(ApiResponse::ok(ChatListResponse {
        contacts: contacts.into_iter().map(UserResponse::from).collect(),
        unread: unread.into(),
    }))
}

/// Open a thread and mark the partner's messages read.
async fn conversation(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<ApiResponse<ConversationResponse>> {
    let conversation = state
        .messaging_service
        .conversation(&user.id, &username)
        .await?;
    let unread = state.notification_service.unread_counts(&user.id).await?;

    Ok(ApiResponse::ok(ConversationResponse {
        partner: conversation.partner.into(),
        messages: conversation
            .messages
            .into_iter()
            .map(MessageResponse::from)
            .collect(),
        unread: unread.into(),
    }))
}

/// Send a message, then return to the thread.
async fn send(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
    Form(form): Form<MessageForm>,
) -> AppResult<Response> {
    state
        .messaging_service
        .send(&user.id, &username, &form.content)
        .await?;

    Ok(see_other(&chat_path(&username)))
}

/// Create the chat router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/chat/", get(chat_list))
        .route("/users/{username}/chat/", get(conversation).post(send))
}

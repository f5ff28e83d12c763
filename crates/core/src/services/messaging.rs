//! Messaging service: direct messages between mutual followers.

use myblog_common::{AppError, AppResult, IdGenerator};
use myblog_db::{
    entities::{message, user},
    repositories::{ContactRepository, MessageRepository, UserRepository},
};
use sea_orm::Set;

/// Shown to users who try to chat without a mutual follow.
pub const NOT_MUTUAL_MESSAGE: &str = "Only mutual followers can chat";

/// Messaging service for business logic.
#[derive(Clone)]
pub struct MessagingService {
    message_repo: MessageRepository,
    contact_repo: ContactRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

/// A chat thread as seen by one of its participants.
#[derive(Debug, Clone)]
pub struct Conversation {
    pub partner: user::Model,
    pub messages: Vec<message::Model>,
}

impl MessagingService {
    /// Create a new messaging service.
    #[must_use]
    pub fn new(
        message_repo: MessageRepository,
        contact_repo: ContactRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            message_repo,
            contact_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    async fn ensure_mutual(&self, a: &str, b: &str) -> AppResult<()> {
        let mutual = a != b
            && self.contact_repo.is_following(a, b).await?
            && self.contact_repo.is_following(b, a).await?;

        if mutual {
            Ok(())
        } else {
            tracing::warn!(user_id = %a, partner_id = %b, "Chat without mutual follow");
            Err(AppError::Forbidden(NOT_MUTUAL_MESSAGE.to_string()))
        }
    }

    /// Send a message. Blank content is ignored and yields `None`.
    pub async fn send(
        &self,
        sender_id: &str,
        recipient_username: &str,
        content: &str,
    ) -> AppResult<Option<message::Model>> {
        let recipient = self.user_repo.get_by_username(recipient_username).await?;
        self.ensure_mutual(sender_id, &recipient.id).await?;

        let content = content.trim();
        if content.is_empty() {
            tracing::debug!(sender_id = %sender_id, "Ignoring empty message");
            return Ok(None);
        }

        let model = message::ActiveModel {
            id: Set(self.id_gen.generate()),
            sender_id: Set(sender_id.to_string()),
            recipient_id: Set(recipient.id.clone()),
            content: Set(content.to_string()),
            is_read: Set(false),
            created_at: Set(chrono::Utc::now().into()),
        };

        let message = self.message_repo.create(model).await?;

        tracing::info!(
            message_id = %message.id,
            sender_id = %sender_id,
            recipient_id = %recipient.id,
            "Message sent"
        );

        Ok(Some(message))
    }

    /// Open the thread with `partner_username`, oldest message first.
    ///
    /// Everything the partner sent to the viewer is marked read before the
    /// thread is loaded.
    pub async fn conversation(
        &self,
        viewer_id: &str,
        partner_username: &str,
    ) -> AppResult<Conversation> {
        let partner = self.user_repo.get_by_username(partner_username).await?;
        self.ensure_mutual(viewer_id, &partner.id).await?;

        let marked = self.message_repo.mark_as_read(viewer_id, &partner.id).await?;
        if marked > 0 {
            tracing::debug!(viewer_id = %viewer_id, partner_id = %partner.id, marked, "Marked messages as read");
        }

        let messages = self
            .message_repo
            .find_conversation(viewer_id, &partner.id)
            .await?;

        Ok(Conversation { partner, messages })
    }

    /// Number of unread messages addressed to a user.
    pub async fn count_unread(&self, user_id: &str) -> AppResult<u64> {
        self.message_repo.count_unread(user_id).await
    }
}

//! Create message table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

fn create_table() -> TableCreateStatement {
    Table::create()
        .table(Message::Table)
        .if_not_exists()
        .col(
            ColumnDef::new(Message::Id)
                .string_len(32)
                .not_null()
                .primary_key(),
        )
        .col(ColumnDef::new(Message::SenderId).string_len(32).not_null())
        .col(ColumnDef::new(Message::RecipientId).string_len(32).not_null())
        .col(ColumnDef::new(Message::Content).text().not_null())
        .col(
            ColumnDef::new(Message::IsRead)
                .boolean()
                .not_null()
                .default(false),
        )
        .col(
            ColumnDef::new(Message::CreatedAt)
                .timestamp_with_time_zone()
                .not_null()
                .default(Expr::current_timestamp()),
        )
        .foreign_key(
            ForeignKey::create()
                .name("fk_message_sender")
                .from(Message::Table, Message::SenderId)
                .to(User::Table, User::Id)
                .on_delete(ForeignKeyAction::Cascade),
        )
        .foreign_key(
            ForeignKey::create()
                .name("fk_message_recipient")
                .from(Message::Table, Message::RecipientId)
                .to(User::Table, User::Id)
                .on_delete(ForeignKeyAction::Cascade),
        )
        .to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(create_table()).await?;

        // Index: (sender_id, recipient_id, created_at) for threads
        manager
            .create_index(
                Index::create()
                    .name("idx_message_thread")
                    .table(Message::Table)
                    .col(Message::SenderId)
                    .col(Message::RecipientId)
                    .col(Message::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Index: (recipient_id, is_read) for unread counters
        manager
            .create_index(
                Index::create()
                    .name("idx_message_recipient_unread")
                    .table(Message::Table)
                    .col(Message::RecipientId)
                    .col(Message::IsRead)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Message::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Message {
    Table,
    Id,
    SenderId,
    RecipientId,
    Content,
    IsRead,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}

//! Create notification table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

fn create_table() -> TableCreateStatement {
    Table::create()
        .table(Notification::Table)
        .if_not_exists()
        .col(
            ColumnDef::new(Notification::Id)
                .string_len(32)
                .not_null()
                .primary_key(),
        )
        .col(ColumnDef::new(Notification::RecipientId).string_len(32).not_null())
        .col(ColumnDef::new(Notification::ActorId).string_len(32).not_null())
        .col(ColumnDef::new(Notification::Verb).string_len(255).not_null())
        .col(
            ColumnDef::new(Notification::IsRead)
                .boolean()
                .not_null()
                .default(false),
        )
        .col(
            ColumnDef::new(Notification::CreatedAt)
                .timestamp_with_time_zone()
                .not_null()
                .default(Expr::current_timestamp()),
        )
        .foreign_key(
            ForeignKey::create()
                .name("fk_notification_recipient")
                .from(Notification::Table, Notification::RecipientId)
                .to(User::Table, User::Id)
                .on_delete(ForeignKeyAction::Cascade),
        )
        .foreign_key(
            ForeignKey::create()
                .name("fk_notification_actor")
                .from(Notification::Table, Notification::ActorId)
                .to(User::Table, User::Id)
                .on_delete(ForeignKeyAction::Cascade),
        )
        .to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(create_table()).await?;

        // Index: (recipient_id, created_at) for the feed
        manager
            .create_index(
                Index::create()
                    .name("idx_notification_recipient_created")
                    .table(Notification::Table)
                    .col(Notification::RecipientId)
                    .col(Notification::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Notification::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Notification {
    Table,
    Id,
    RecipientId,
    ActorId,
    Verb,
    IsRead,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_cascades_with_recipient_and_actor() {
        let sql = create_table().to_string(PostgresQueryBuilder);

        assert!(sql.contains(r#""verb" varchar(255) NOT NULL"#));
        assert!(sql.contains(r#"FOREIGN KEY ("recipient_id") REFERENCES "user" ("id") ON DELETE CASCADE"#));
        assert!(sql.contains(r#"FOREIGN KEY ("actor_id") REFERENCES "user" ("id") ON DELETE CASCADE"#));
    }
}

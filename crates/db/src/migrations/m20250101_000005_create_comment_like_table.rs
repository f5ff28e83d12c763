//! Create comment like table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

fn create_table() -> TableCreateStatement {
    Table::create()
        .table(CommentLike::Table)
        .if_not_exists()
        .col(ColumnDef::new(CommentLike::CommentId).string_len(32).not_null())
        .col(ColumnDef::new(CommentLike::UserId).string_len(32).not_null())
        .col(
            ColumnDef::new(CommentLike::CreatedAt)
                .timestamp_with_time_zone()
                .not_null()
                .default(Expr::current_timestamp()),
        )
        // One like per (comment, user)
        .primary_key(
            Index::create()
                .name("pk_comment_like")
                .col(CommentLike::CommentId)
                .col(CommentLike::UserId),
        )
        .foreign_key(
            ForeignKey::create()
                .name("fk_comment_like_comment")
                .from(CommentLike::Table, CommentLike::CommentId)
                .to(Comment::Table, Comment::Id)
                .on_delete(ForeignKeyAction::Cascade),
        )
        .foreign_key(
            ForeignKey::create()
                .name("fk_comment_like_user")
                .from(CommentLike::Table, CommentLike::UserId)
                .to(User::Table, User::Id)
                .on_delete(ForeignKeyAction::Cascade),
        )
        .to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(create_table()).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_comment_like_user_id")
                    .table(CommentLike::Table)
                    .col(CommentLike::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CommentLike::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum CommentLike {
    Table,
    CommentId,
    UserId,
    CreatedAt,
}

#[derive(Iden)]
enum Comment {
    Table,
    Id,
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
    fn test_like_pair_is_the_primary_key() {
        let sql = create_table().to_string(PostgresQueryBuilder);

        assert!(sql.contains(r#"PRIMARY KEY ("comment_id", "user_id")"#));
        assert!(sql.contains(r#"REFERENCES "comment" ("id") ON DELETE CASCADE"#));
        assert!(sql.contains(r#"REFERENCES "user" ("id") ON DELETE CASCADE"#));
    }
}

//! Create user profile table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

fn create_table() -> TableCreateStatement {
    Table::create()
        .table(UserProfile::Table)
        .if_not_exists()
        .col(
            ColumnDef::new(UserProfile::UserId)
                .string_len(32)
                .not_null()
                .primary_key(),
        )
        .col(
            ColumnDef::new(UserProfile::Bio)
                .text()
                .not_null()
                .default(""),
        )
        .col(
            ColumnDef::new(UserProfile::CreatedAt)
                .timestamp_with_time_zone()
                .not_null()
                .default(Expr::current_timestamp()),
        )
        .col(ColumnDef::new(UserProfile::UpdatedAt).timestamp_with_time_zone())
        .foreign_key(
            ForeignKey::create()
                .name("fk_user_profile_user")
                .from(UserProfile::Table, UserProfile::UserId)
                .to(User::Table, User::Id)
                .on_delete(ForeignKeyAction::Cascade),
        )
        .to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(create_table()).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserProfile::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum UserProfile {
    Table,
    UserId,
    Bio,
    CreatedAt,
    UpdatedAt,
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
    fn test_profile_cascades_with_user() {
        let sql = create_table().to_string(PostgresQueryBuilder);

        assert!(sql.contains(r#"REFERENCES "user" ("id") ON DELETE CASCADE"#));
    }
}

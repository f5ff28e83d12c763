//! Database migrations.
//!
//! Every owned row references its owner with `ON DELETE CASCADE`, so deleting
//! a user removes their posts, comments, likes, contacts, messages and
//! notifications.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20250101_000001_create_user_table;
mod m20250101_000002_create_user_profile_table;
mod m20250101_000003_create_post_table;
mod m20250101_000004_create_comment_table;
mod m20250101_000005_create_comment_like_table;
mod m20250101_000006_create_contact_table;
mod m20250101_000007_create_message_table;
mod m20250101_000008_create_notification_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_user_table::Migration),
            Box::new(m20250101_000002_create_user_profile_table::Migration),
            Box::new(m20250101_000003_create_post_table::Migration),
            Box::new(m20250101_000004_create_comment_table::Migration),
            Box::new(m20250101_000005_create_comment_like_table::Migration),
            Box::new(m20250101_000006_create_contact_table::Migration),
            Box::new(m20250101_000007_create_message_table::Migration),
            Box::new(m20250101_000008_create_notification_table::Migration),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_ordered() {
        let names: Vec<String> = Migrator::migrations()
            .iter()
            .map(|m| m.name().to_string())
            .collect();
        let mut sorted = names.clone();
        sorted.sort();

        assert_eq!(names.len(), 8);
        assert_eq!(names, sorted);
    }
}

//! User entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Built-in avatar choices as `(path, label)`.
pub const AVATAR_CHOICES: [(&str, &str); 8] = [
    ("avatars/default.png", "Default"),
    ("avatars/avatar1.png", "Reading"),
    ("avatars/avatar2.png", "Daydreaming"),
    ("avatars/avatar3.png", "Rain"),
    ("avatars/avatar4.png", "Fishing"),
    ("avatars/avatar5.png", "Grinning"),
    ("avatars/avatar6.png", "Asleep"),
    ("avatars/avatar7.png", "Cute"),
];

/// Avatar shown when a user has not picked one.
pub const DEFAULT_AVATAR: &str = "avatars/default.png";

/// Returns whether `path` is one of the built-in avatar choices.
#[must_use]
pub fn is_avatar_choice(path: &str) -> bool {
    AVATAR_CHOICES.iter().any(|(choice, _)| *choice == path)
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub username: String,

    #[sea_orm(unique)]
    pub username_lower: String,

    pub email: String,

    /// Argon2 password hash
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Session token
    #[sea_orm(unique, nullable)]
    #[serde(skip_serializing)]
    pub token: Option<String>,

    /// Avatar path, one of [`AVATAR_CHOICES`]
    #[sea_orm(nullable)]
    pub avatar: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

impl Model {
    /// Avatar path with the default applied.
    #[must_use]
    pub fn avatar_or_default(&self) -> &str {
        self.avatar.as_deref().unwrap_or(DEFAULT_AVATAR)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::user_profile::Entity")]
    Profile,

    #[sea_orm(has_many = "super::post::Entity")]
    Posts,

    #[sea_orm(has_many = "super::comment::Entity")]
    Comments,
}

impl Related<super::user_profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Profile.def()
    }
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Posts.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

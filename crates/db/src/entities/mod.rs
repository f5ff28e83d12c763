//! Database entities.

pub mod comment;
pub mod comment_like;
pub mod contact;
pub mod message;
pub mod notification;
pub mod post;
pub mod user;
pub mod user_profile;

pub use comment::Entity as Comment;
pub use comment_like::Entity as CommentLike;
pub use contact::Entity as Contact;
pub use message::Entity as Message;
pub use notification::Entity as Notification;
pub use post::Entity as Post;
pub use user::Entity as User;
pub use user_profile::Entity as UserProfile;

//! Business logic services.

#![allow(missing_docs)]

pub mod comment;
pub mod following;
pub mod messaging;
pub mod notification;
pub mod post;
pub mod user;

pub use comment::{CommentDeletion, CommentInput, CommentService, LikeToggle};
pub use following::FollowingService;
pub use messaging::{Conversation, MessagingService, NOT_MUTUAL_MESSAGE};
pub use notification::{NotificationService, NotificationView, UnreadCounts};
pub use post::{CommentView, PostDetail, PostInput, PostService, PostSummary};
pub use user::{ProfileView, RegisterInput, Session, UpdateProfileInput, UserService};

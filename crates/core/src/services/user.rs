//! User service: registration, sessions, profiles and account deletion.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use myblog_common::{AppError, AppResult, IdGenerator};
use myblog_db::{
    entities::{post, user, user_profile},
    repositories::{ContactRepository, PostRepository, UserProfileRepository, UserRepository},
};
use regex::Regex;
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

/// Usernames that would shadow a fixed `/users/...` route.
pub const RESERVED_USERNAMES: [&str; 4] = ["search", "chat", "notifications", "follow"];

#[allow(clippy::unwrap_used)]
static USERNAME_RE: std::sync::LazyLock<Regex> =
    std::sync::LazyLock::new(|| Regex::new(r"^[\w.@+-]{1,150}$").unwrap());

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    profile_repo: UserProfileRepository,
    post_repo: PostRepository,
    contact_repo: ContactRepository,
    id_gen: IdGenerator,
}

/// Input for registering a new account.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(length(min = 1, max = 150))]
    pub username: String,

    #[validate(email)]
    pub email: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,

    #[validate(must_match(other = "password"))]
    pub password_confirm: String,
}

/// Input for the profile edit form.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileInput {
    #[validate(length(min = 1, max = 150))]
    pub username: String,

    #[validate(email)]
    pub email: String,

    /// One of the built-in avatar paths.
    pub avatar: Option<String>,

    #[validate(length(max = 500))]
    #[serde(default)]
    pub bio: String,
}

/// A logged-in session.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: user::Model,
    pub token: String,
}

/// Everything shown on a public profile page.
#[derive(Debug, Clone)]
pub struct ProfileView {
    pub user: user::Model,
    pub profile: user_profile::Model,
    pub posts: Vec<post::Model>,
    pub followers_count: u64,
    pub following_count: u64,
    /// Whether the viewer follows this user; `false` for anonymous viewers.
    pub is_following: bool,
    pub is_own_profile: bool,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub fn new(
        user_repo: UserRepository,
        profile_repo: UserProfileRepository,
        post_repo: PostRepository,
        contact_repo: ContactRepository,
    ) -> Self {
        Self {
            user_repo,
            profile_repo,
            post_repo,
            contact_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a new account and its (empty) profile, then log it in.
    pub async fn register(&self, input: RegisterInput) -> AppResult<Session> {
        input.validate()?;
        check_username(&input.username)?;

        if self.user_repo.find_by_username(&input.username).await?.is_some() {
            return Err(AppError::Conflict(
                "A user with that username already exists".to_string(),
            ));
        }

        let password_hash = hash_password(&input.password)?;
        let user_id = self.id_gen.generate();
        let token = self.id_gen.generate_token();
        let now = chrono::Utc::now();

        let user_model = user::ActiveModel {
            id: Set(user_id.clone()),
            username: Set(input.username.clone()),
            username_lower: Set(input.username.to_lowercase()),
            email: Set(input.email),
            password_hash: Set(password_hash),
            token: Set(Some(token.clone())),
            avatar: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(None),
        };
        let profile_model = user_profile::ActiveModel {
            user_id: Set(user_id),
            bio: Set(String::new()),
            created_at: Set(now.into()),
            updated_at: Set(None),
        };

        let (user, _) = self
            .user_repo
            .create_with_profile(user_model, profile_model)
            .await?;

        tracing::info!(user_id = %user.id, username = %user.username, "User registered");

        Ok(Session { user, token })
    }

    /// Get a user by ID.
    pub async fn get(&self, id: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_id(id).await
    }

    /// Get a user by username.
    pub async fn get_by_username(&self, username: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_username(username).await
    }

    /// Authenticate a user by token.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Authenticate a user by username and password.
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<user::Model> {
        let user = self
            .user_repo
            .find_by_username(username)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::Unauthorized);
        }

        Ok(user)
    }

    /// Check credentials and return a session token.
    pub async fn login(&self, username: &str, password: &str) -> AppResult<Session> {
        let user = self.authenticate(username, password).await?;

        let token = match user.token.clone() {
            Some(token) => token,
            None => self.regenerate_token(&user.id).await?,
        };

        tracing::info!(user_id = %user.id, "User logged in");

        Ok(Session { user, token })
    }

    /// End the current session by rotating the token.
    pub async fn logout(&self, user_id: &str) -> AppResult<()> {
        self.regenerate_token(user_id).await?;
        tracing::info!(user_id = %user_id, "User logged out");
        Ok(())
    }

    /// Regenerate a user's authentication token.
    pub async fn regenerate_token(&self, user_id: &str) -> AppResult<String> {
        let user = self.user_repo.get_by_id(user_id).await?;
        let new_token = self.id_gen.generate_token();

        let mut active: user::ActiveModel = user.into();
        active.token = Set(Some(new_token.clone()));
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        self.user_repo.update(active).await?;

        Ok(new_token)
    }

    /// Public profile of `username` as seen by `viewer_id`.
    pub async fn profile(&self, username: &str, viewer_id: Option<&str>) -> AppResult<ProfileView> {
        let user = self.user_repo.get_by_username(username).await?;
        let profile = self.profile_repo.get_by_user_id(&user.id).await?;
        let posts = self.post_repo.find_by_author(&user.id).await?;
        let followers_count = self.contact_repo.count_followers(&user.id).await?;
        let following_count = self.contact_repo.count_following(&user.id).await?;

        let is_own_profile = viewer_id == Some(user.id.as_str());
        let is_following = match viewer_id {
            Some(viewer) if !is_own_profile => {
                self.contact_repo.is_following(viewer, &user.id).await?
            }
            _ => false,
        };

        Ok(ProfileView {
            user,
            profile,
            posts,
            followers_count,
            following_count,
            is_following,
            is_own_profile,
        })
    }

    /// Get a user's profile row.
    pub async fn get_profile(&self, user_id: &str) -> AppResult<user_profile::Model> {
        self.profile_repo.get_by_user_id(user_id).await
    }

    /// Apply the profile edit form.
    pub async fn update_profile(
        &self,
        user_id: &str,
        input: UpdateProfileInput,
    ) -> AppResult<user::Model> {
        input.validate()?;
        check_username(&input.username)?;

        if let Some(avatar) = input.avatar.as_deref().filter(|a| !user::is_avatar_choice(a)) {
            return Err(AppError::Validation(format!(
                "avatar: {avatar} is not one of the available choices"
            )));
        }

        let user = self.user_repo.get_by_id(user_id).await?;

        if user.username_lower != input.username.to_lowercase() {
            if let Some(existing) = self.user_repo.find_by_username(&input.username).await? {
                if existing.id != user.id {
                    return Err(AppError::Conflict(
                        "A user with that username already exists".to_string(),
                    ));
                }
            }
        }

        let now = chrono::Utc::now();

        let mut active: user::ActiveModel = user.into();
        active.username = Set(input.username.clone());
        active.username_lower = Set(input.username.to_lowercase());
        active.email = Set(input.email);
        active.avatar = Set(input.avatar);
        active.updated_at = Set(Some(now.into()));
        let user = self.user_repo.update(active).await?;

        let profile = self.profile_repo.get_by_user_id(user_id).await?;
        let mut active: user_profile::ActiveModel = profile.into();
        active.bio = Set(input.bio);
        active.updated_at = Set(Some(now.into()));
        self.profile_repo.update(active).await?;

        tracing::info!(user_id = %user.id, username = %user.username, "Profile updated");

        Ok(user)
    }

    /// Case-insensitive username search. A blank query matches nothing.
    pub async fn search(&self, query: &str) -> AppResult<Vec<user::Model>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(vec![]);
        }
        self.user_repo.search(query).await
    }

    /// Delete an account after re-checking the password.
    pub async fn delete_account(&self, user_id: &str, password: &str) -> AppResult<()> {
        let user = self.user_repo.get_by_id(user_id).await?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::Unauthorized);
        }

        self.user_repo.delete(&user.id).await?;

        tracing::info!(user_id = %user.id, username = %user.username, "Account deleted");

        Ok(())
    }
}

/// Allowed characters and reserved route words.
fn check_username(username: &str) -> AppResult<()> {
    if !USERNAME_RE.is_match(username) {
        return Err(AppError::Validation(
            "username: letters, digits and @/./+/-/_ only".to_string(),
        ));
    }
    if RESERVED_USERNAMES.contains(&username.to_lowercase().as_str()) {
        return Err(AppError::Validation(format!(
            "username: {username} is reserved"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

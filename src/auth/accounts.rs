//! User account service
//!
//! Handles signup, signin, bearer token validation and avatar selection.

use sqlx::sqlite::SqlitePool;
use thiserror::Error;

use super::{generate_token, is_valid_username, PasswordHash, Role};

/// User account data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub username: String,
    pub role: Role,
    pub avatar_id: Option<String>,
    pub created_at: String,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Avatar selection of one user, as reported by the bulk metadata lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAvatar {
    pub user_id: String,
    pub avatar_id: Option<String>,
    pub image_url: Option<String>,
}

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid username")]
    InvalidUsername,

    #[error("password must not be empty")]
    EmptyPassword,

    #[error("username already exists")]
    UsernameExists,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("unknown avatar")]
    UnknownAvatar,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

type UserRow = (String, String, String, Option<String>, String);

fn user_from_row((id, username, role, avatar_id, created_at): UserRow) -> User {
    User {
        id,
        username,
        role: role.parse().unwrap_or_default(),
        avatar_id,
        created_at,
    }
}

/// User service for authentication operations
pub struct UserService {
    pool: SqlitePool,
}

impl UserService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new account
    pub async fn signup(&self, username: &str, password: &str, role: Role) -> Result<User, AuthError> {
        if !is_valid_username(username) {
            return Err(AuthError::InvalidUsername);
        }
        if password.is_empty() {
            return Err(AuthError::EmptyPassword);
        }

        let existing: Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        if existing.is_some() {
            return Err(AuthError::UsernameExists);
        }

        let id = uuid::Uuid::new_v4().to_string();
        let password = PasswordHash::new(password);
        let now = chrono::Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO users (id, username, password_hash, salt, role, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(username)
        .bind(&password.hash)
        .bind(&password.salt)
        .bind(role.as_str())
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(User {
            id,
            username: username.to_string(),
            role,
            avatar_id: None,
            created_at: now,
        })
    }

    /// Check credentials and issue a new bearer token. Earlier tokens stay
    /// valid.
    pub async fn signin(&self, username: &str, password: &str) -> Result<(User, String), AuthError> {
        let row: Option<(String, String, String, String, Option<String>, String)> = sqlx::query_as(
            "SELECT id, password_hash, salt, role, avatar_id, created_at FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        let (id, hash, salt, role, avatar_id, created_at) =
            row.ok_or(AuthError::InvalidCredentials)?;

        let stored = PasswordHash { salt, hash };
        if !stored.verify(password) {
            return Err(AuthError::InvalidCredentials);
        }

        let token = generate_token();
        sqlx::query("INSERT INTO auth_tokens (token, user_id) VALUES (?, ?)")
            .bind(&token)
            .bind(&id)
            .execute(&self.pool)
            .await?;

        let user = user_from_row((id, username.to_string(), role, avatar_id, created_at));
        Ok((user, token))
    }

    /// Validate a token and return the associated user
    pub async fn validate_token(&self, token: &str) -> Result<Option<User>, AuthError> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT u.id, u.username, u.role, u.avatar_id, u.created_at
             FROM auth_tokens t JOIN users u ON u.id = t.user_id
             WHERE t.token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(user_from_row))
    }

    /// Get user by ID
    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AuthError> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, username, role, avatar_id, created_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(user_from_row))
    }

    /// Select an avatar from the catalog
    pub async fn set_avatar(&self, user_id: &str, avatar_id: &str) -> Result<(), AuthError> {
        let avatar: Option<(String,)> = sqlx::query_as("SELECT id FROM avatars WHERE id = ?")
            .bind(avatar_id)
            .fetch_optional(&self.pool)
            .await?;
        if avatar.is_none() {
            return Err(AuthError::UnknownAvatar);
        }

        sqlx::query("UPDATE users SET avatar_id = ? WHERE id = ?")
            .bind(avatar_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Avatar selection for each known user in `user_ids`, in request order
    pub async fn avatars_for(&self, user_ids: &[String]) -> Result<Vec<UserAvatar>, AuthError> {
        let mut out = Vec::with_capacity(user_ids.len());
        for user_id in user_ids {
            let row: Option<(String, Option<String>, Option<String>)> = sqlx::query_as(
                "SELECT u.id, u.avatar_id, a.image_url
                 FROM users u LEFT JOIN avatars a ON a.id = u.avatar_id
                 WHERE u.id = ?",
            )
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

            if let Some((user_id, avatar_id, image_url)) = row {
                out.push(UserAvatar {
                    user_id,
                    avatar_id,
                    image_url,
                });
            }
        }
        Ok(out)
    }
}

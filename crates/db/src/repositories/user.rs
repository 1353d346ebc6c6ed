//! User repository for database operations.
//!
//! Users authenticate with an opaque API token. Only its SHA-256 hash is
//! stored; the raw token is returned once, at creation.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::entities::users;

/// A newly created user and the only copy of their raw token.
#[derive(Debug, Clone)]
pub struct CreatedUser {
    /// The stored user.
    pub user: users::Model,
    /// Raw API token.
    pub token: String,
}

/// User repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Hashes an API token for storage.
    #[must_use]
    pub fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Generates a random URL-safe API token.
    #[must_use]
    pub fn generate_token() -> String {
        let bytes: [u8; 32] = rand::random();
        base64_url::encode(&bytes)
    }

    /// Finds a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(id).one(&self.db).await
    }

    /// Finds a user by username.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_username(&self, username: &str) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.db)
            .await
    }

    /// Finds the user owning a raw API token.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_token(&self, token: &str) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::TokenHash.eq(Self::hash_token(token)))
            .one(&self.db)
            .await
    }

    /// Creates a user with a fresh API token.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails, including when the
    /// username is taken.
    pub async fn create(&self, username: &str) -> Result<CreatedUser, DbErr> {
        let token = Self::generate_token();
        let user = users::ActiveModel {
            id: Set(Uuid::now_v7()),
            username: Set(username.to_string()),
            token_hash: Set(Self::hash_token(&token)),
            created_at: Set(chrono::Utc::now().into()),
        };

        let user = user.insert(&self.db).await?;
        Ok(CreatedUser { user, token })
    }

    /// Returns the user named `username`, creating it if needed.
    ///
    /// The token of a user created here is discarded.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query or insert fails.
    pub async fn ensure(&self, username: &str) -> Result<users::Model, DbErr> {
        if let Some(user) = self.find_by_username(username).await? {
            return Ok(user);
        }
        Ok(self.create(username).await?.user)
    }
}

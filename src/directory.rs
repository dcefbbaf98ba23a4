//! Identity and space lookups for the session engine

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use sqlx::sqlite::SqlitePool;

use crate::auth::accounts::UserService;
use crate::engine::{IdentityLookup, LookupError, SpaceInfo, SpaceLookup, UserId};
use crate::spaces::SpaceStore;

/// Resolves join tokens and spaces against the SQLite store
#[derive(Clone)]
pub struct DbDirectory {
    pool: SqlitePool,
}

impl DbDirectory {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityLookup for DbDirectory {
    async fn verify_token(&self, token: &str) -> Result<UserId, LookupError> {
        UserService::new(self.pool.clone())
            .validate_token(token)
            .await
            .map_err(|e| LookupError::Backend(e.to_string()))?
            .map(|user| user.id)
            .ok_or(LookupError::Unauthorized)
    }
}

#[async_trait]
impl SpaceLookup for DbDirectory {
    async fn get_space(&self, space_id: &str) -> Result<SpaceInfo, LookupError> {
        SpaceStore::new(self.pool.clone())
            .space_info(space_id)
            .await
            .map_err(|e| LookupError::Backend(e.to_string()))?
            .ok_or(LookupError::NotFound)
    }
}

/// Fixed set of tokens and spaces held in memory
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    tokens: RwLock<HashMap<String, UserId>>,
    spaces: RwLock<HashMap<String, SpaceInfo>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_token(&self, token: impl Into<String>, user_id: impl Into<UserId>) {
        self.tokens.write().insert(token.into(), user_id.into());
    }

    pub fn add_space(&self, space: SpaceInfo) {
        self.spaces.write().insert(space.id.clone(), space);
    }
}

#[async_trait]
impl IdentityLookup for MemoryDirectory {
    async fn verify_token(&self, token: &str) -> Result<UserId, LookupError> {
        self.tokens
            .read()
            .get(token)
            .cloned()
            .ok_or(LookupError::Unauthorized)
    }
}

#[async_trait]
impl SpaceLookup for MemoryDirectory {
    async fn get_space(&self, space_id: &str) -> Result<SpaceInfo, LookupError> {
        self.spaces
            .read()
            .get(space_id)
            .cloned()
            .ok_or(LookupError::NotFound)
    }
}

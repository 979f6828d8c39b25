//! Collaborator store contracts and in-memory implementations.
//!
//! The engine only sees these traits; the Postgres implementations live in
//! `postgres.rs` and the in-memory ones below back local development and
//! tests.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::auth::model::{RefreshTokenRecord, User, UserFields};
use crate::token::unix_now;

/// Persistence contract for user records.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn insert(&self, user: User) -> Result<()>;
    async fn update_fields(&self, id: Uuid, fields: UserFields) -> Result<()>;
}

/// Persistence contract for active refresh tokens.
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    async fn insert(&self, record: RefreshTokenRecord) -> Result<()>;

    /// Atomically find and remove the record for `token`.
    ///
    /// Validation and revocation in one step: of two concurrent callers
    /// presenting the same token, at most one observes the record. The other
    /// sees `None`, which is how refresh-token reuse is detected.
    async fn consume_if_present(&self, token: &str) -> Result<Option<RefreshTokenRecord>>;
}

/// In-memory user store keyed by id.
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let users = self.users.lock().await;
        Ok(users.values().find(|user| user.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let users = self.users.lock().await;
        Ok(users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let users = self.users.lock().await;
        Ok(users
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn insert(&self, user: User) -> Result<()> {
        let mut users = self.users.lock().await;
        users.insert(user.id, user);
        Ok(())
    }

    async fn update_fields(&self, id: Uuid, fields: UserFields) -> Result<()> {
        let mut users = self.users.lock().await;
        if let Some(user) = users.get_mut(&id) {
            if let Some(password_hash) = fields.password_hash {
                user.password_hash = password_hash;
            }
            if let Some(verify) = fields.verify {
                user.verify = verify;
            }
            if let Some(email_verify_token) = fields.email_verify_token {
                user.email_verify_token = email_verify_token;
            }
            if let Some(forgot_password_token) = fields.forgot_password_token {
                user.forgot_password_token = forgot_password_token;
            }
            user.updated_at = unix_now();
        }
        Ok(())
    }
}

/// In-memory refresh-token store keyed by the opaque token string.
///
/// `HashMap::remove` under one lock gives the same atomicity the Postgres
/// store gets from `DELETE ... RETURNING`.
#[derive(Default)]
pub struct MemoryRefreshTokenStore {
    records: Mutex<HashMap<String, RefreshTokenRecord>>,
}

impl MemoryRefreshTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live records for a user; used by tests and session listings.
    pub async fn count_for_user(&self, user_id: Uuid) -> usize {
        let records = self.records.lock().await;
        records
            .values()
            .filter(|record| record.user_id == user_id)
            .count()
    }

    /// Whether a specific token still has a live record.
    pub async fn contains(&self, token: &str) -> bool {
        let records = self.records.lock().await;
        records.contains_key(token)
    }
}

#[async_trait]
impl RefreshTokenStore for MemoryRefreshTokenStore {
    async fn insert(&self, record: RefreshTokenRecord) -> Result<()> {
        let mut records = self.records.lock().await;
        records.insert(record.token.clone(), record);
        Ok(())
    }

    async fn consume_if_present(&self, token: &str) -> Result<Option<RefreshTokenRecord>> {
        let mut records = self.records.lock().await;
        Ok(records.remove(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::model::VerifyStatus;

    fn test_user(email: &str) -> User {
        let id = Uuid::new_v4();
        User {
            id,
            name: "Alice".to_string(),
            email: email.to_string(),
            username: format!("user_{}", id.simple()),
            password_hash: "digest".to_string(),
            verify: VerifyStatus::Unverified,
            email_verify_token: String::new(),
            forgot_password_token: String::new(),
            created_at: 0,
            updated_at: 0,
        }
    }

    #[tokio::test]
    async fn user_store_lookups() -> Result<()> {
        let store = MemoryUserStore::new();
        let user = test_user("alice@example.com");
        let id = user.id;
        let username = user.username.clone();
        store.insert(user).await?;

        assert!(store.find_by_email("alice@example.com").await?.is_some());
        assert!(store.find_by_email("bob@example.com").await?.is_none());
        assert!(store.find_by_id(id).await?.is_some());
        assert!(store.find_by_username(&username).await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn update_fields_applies_only_supplied_values() -> Result<()> {
        let store = MemoryUserStore::new();
        let user = test_user("alice@example.com");
        let id = user.id;
        store.insert(user).await?;

        store
            .update_fields(
                id,
                UserFields {
                    verify: Some(VerifyStatus::Verified),
                    email_verify_token: Some(String::new()),
                    ..UserFields::default()
                },
            )
            .await?;

        let updated = store.find_by_id(id).await?.map(|user| user.verify);
        assert_eq!(updated, Some(VerifyStatus::Verified));
        let hash = store.find_by_id(id).await?.map(|user| user.password_hash);
        assert_eq!(hash.as_deref(), Some("digest"));
        Ok(())
    }

    #[tokio::test]
    async fn consume_if_present_removes_exactly_once() -> Result<()> {
        let store = MemoryRefreshTokenStore::new();
        let user_id = Uuid::new_v4();
        store
            .insert(RefreshTokenRecord {
                user_id,
                token: "signed-token".to_string(),
                iat: 1,
                exp: 100,
            })
            .await?;

        let first = store.consume_if_present("signed-token").await?;
        assert!(first.is_some());
        let second = store.consume_if_present("signed-token").await?;
        assert!(second.is_none());
        assert_eq!(store.count_for_user(user_id).await, 0);
        Ok(())
    }
}

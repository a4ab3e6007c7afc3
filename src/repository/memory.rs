use std::collections::hash_map::Entry;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::models::{NewRefreshToken, RefreshTokenRecord, UserCredentials};
use super::{RefreshTokenRepository, UserRepository};
use crate::error::DatabaseError;

/// In-process user table keyed by email
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<String, UserCredentials>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a user; fails if the email is already taken
    pub async fn insert(&self, user: UserCredentials) -> Result<(), DatabaseError> {
        let mut users = self.users.write().await;
        match users.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(DatabaseError::UniqueConstraintViolation(format!(
                "users.email {}",
                user.email
            ))),
            Entry::Vacant(slot) => {
                slot.insert(user);
                Ok(())
            }
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserCredentials>, DatabaseError> {
        Ok(self.users.read().await.get(email).cloned())
    }
}

/// In-process refresh token table with the same uniqueness rule as the SQL schema
#[derive(Default)]
pub struct InMemoryRefreshTokenRepository {
    tokens: RwLock<HashMap<String, RefreshTokenRecord>>,
}

impl InMemoryRefreshTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.tokens.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tokens.read().await.is_empty()
    }
}

#[async_trait]
impl RefreshTokenRepository for InMemoryRefreshTokenRepository {
    async fn insert(&self, token: &NewRefreshToken) -> Result<RefreshTokenRecord, DatabaseError> {
        let mut tokens = self.tokens.write().await;
        match tokens.entry(token.token.clone()) {
            Entry::Occupied(_) => Err(DatabaseError::UniqueConstraintViolation(
                "refresh_tokens.token".to_string(),
            )),
            Entry::Vacant(slot) => {
                let now = Utc::now();
                let record = RefreshTokenRecord {
                    token: token.token.clone(),
                    user_id: token.user_id,
                    created_at: now,
                    updated_at: now,
                    expires_at: token.expires_at,
                    revoked_at: None,
                };
                slot.insert(record.clone());
                Ok(record)
            }
        }
    }

    async fn find(&self, token: &str) -> Result<Option<RefreshTokenRecord>, DatabaseError> {
        Ok(self.tokens.read().await.get(token).cloned())
    }

    async fn revoke(&self, token: &str, revoked_at: DateTime<Utc>) -> Result<bool, DatabaseError> {
        let mut tokens = self.tokens.write().await;
        match tokens.get_mut(token) {
            Some(record) => {
                record.revoked_at = Some(revoked_at);
                record.updated_at = revoked_at;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn new_token(token: &str, user_id: Uuid) -> NewRefreshToken {
        NewRefreshToken {
            token: token.to_string(),
            user_id,
            expires_at: Utc::now() + Duration::days(1),
        }
    }

    #[tokio::test]
    async fn test_duplicate_insert_keeps_original_owner() {
        let repo = InMemoryRefreshTokenRepository::new();
        let owner = Uuid::new_v4();

        repo.insert(&new_token("abc", owner)).await.expect("first insert");
        let err = repo
            .insert(&new_token("abc", Uuid::new_v4()))
            .await
            .expect_err("duplicate insert must fail");

        assert!(matches!(err, DatabaseError::UniqueConstraintViolation(_)));
        let stored = repo.find("abc").await.unwrap().expect("record present");
        assert_eq!(stored.user_id, owner);
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn test_revoke_missing_token() {
        let repo = InMemoryRefreshTokenRepository::new();
        assert!(!repo.revoke("nope", Utc::now()).await.unwrap());
    }

    #[tokio::test]
    async fn test_revoke_stamps_both_timestamps() {
        let repo = InMemoryRefreshTokenRepository::new();
        repo.insert(&new_token("abc", Uuid::new_v4())).await.unwrap();

        let at = Utc::now() + Duration::seconds(5);
        assert!(repo.revoke("abc", at).await.unwrap());

        let stored = repo.find("abc").await.unwrap().unwrap();
        assert_eq!(stored.revoked_at, Some(at));
        assert_eq!(stored.updated_at, at);
    }

    #[tokio::test]
    async fn test_user_lookup() {
        let repo = InMemoryUserRepository::new();
        let now = Utc::now();
        let user = UserCredentials {
            id: Uuid::new_v4(),
            email: "lane@example.com".to_string(),
            hashed_password: "hash".to_string(),
            created_at: now,
            updated_at: now,
        };
        repo.insert(user.clone()).await.unwrap();

        assert!(repo.insert(user.clone()).await.is_err());
        assert_eq!(
            repo.find_by_email("lane@example.com").await.unwrap().map(|u| u.id),
            Some(user.id)
        );
        assert!(repo.find_by_email("LANE@example.com").await.unwrap().is_none());
    }
}

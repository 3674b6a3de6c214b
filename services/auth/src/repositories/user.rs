//! User store backed by the `users` table

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::models::{NewUser, User};

/// Error creating a user
#[derive(Debug, Error)]
pub enum CreateUserError {
    /// The username is already taken. Raised by the unique constraint on
    /// `users.username`, which also closes the check-then-insert race
    /// between concurrent registrations.
    #[error("username already taken")]
    DuplicateUsername,

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Durable store of user accounts
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create a new user.
    ///
    /// The payload carries an already-computed password digest; this layer
    /// never sees plaintext passwords.
    async fn create(&self, new_user: &NewUser) -> Result<User, CreateUserError>;

    /// Find a user by username
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Find a user by ID
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
}

/// PostgreSQL-backed user store
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, new_user: &NewUser) -> Result<User, CreateUserError> {
        info!("Creating new user: {}", new_user.username);

        let result = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, username, password_hash, role, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.username)
        .bind(&new_user.password_hash)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(user) => Ok(user),
            Err(e) if is_unique_violation(&e) => Err(CreateUserError::DuplicateUsername),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, role, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, role, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory stand-in for [`UserStore`], enforcing the same username
    //! uniqueness as the database constraint.

    use super::*;
    use chrono::Utc;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    #[derive(Default)]
    pub struct MemoryUserStore {
        users: Mutex<HashMap<String, User>>,
    }

    #[async_trait]
    impl UserStore for MemoryUserStore {
        async fn create(&self, new_user: &NewUser) -> Result<User, CreateUserError> {
            let mut users = self.users.lock().await;
            if users.contains_key(&new_user.username) {
                return Err(CreateUserError::DuplicateUsername);
            }

            let user = User {
                id: Uuid::new_v4(),
                username: new_user.username.clone(),
                password_hash: new_user.password_hash.clone(),
                role: "user".to_string(),
                created_at: Utc::now(),
            };
            users.insert(user.username.clone(), user.clone());
            Ok(user)
        }

        async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
            Ok(self.users.lock().await.get(username).cloned())
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
            let users = self.users.lock().await;
            Ok(users.values().find(|user| user.id == id).cloned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::MemoryUserStore;
    use super::*;

    #[tokio::test]
    async fn test_duplicate_username_is_rejected() {
        let store = MemoryUserStore::default();
        let new_user = NewUser {
            username: "alice".to_string(),
            password_hash: "digest".to_string(),
        };

        store.create(&new_user).await.unwrap();
        let err = store.create(&new_user).await.unwrap_err();
        assert!(matches!(err, CreateUserError::DuplicateUsername));
    }

    #[tokio::test]
    async fn test_find_by_username_and_id() {
        let store = MemoryUserStore::default();
        let created = store
            .create(&NewUser {
                username: "alice".to_string(),
                password_hash: "digest".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(created.role, "user");

        let by_name = store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(by_name.id, created.id);

        let by_id = store.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_id.username, "alice");

        assert!(store.find_by_username("bob").await.unwrap().is_none());
    }
}

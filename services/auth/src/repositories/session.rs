//! Session store backed by the `user_sessions` table

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::Session;

/// Default session lifetime handed out at login
pub const DEFAULT_SESSION_TTL_DAYS: i64 = 7;

pub fn default_session_ttl() -> Duration {
    Duration::days(DEFAULT_SESSION_TTL_DAYS)
}

/// Durable store of active sessions.
///
/// Lookup must treat an expired row exactly like a missing one: callers
/// cannot tell the two apart, both come back as `None`.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Mint a new session token for a user
    async fn create(&self, user_id: Uuid, ttl: Duration) -> Result<Session>;

    /// Fetch a session that exists and has not expired
    async fn lookup(&self, token: &str) -> Result<Option<Session>>;

    /// Delete a session; unknown tokens are a no-op
    async fn destroy(&self, token: &str) -> Result<()>;
}

/// PostgreSQL-backed session store
#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn create(&self, user_id: Uuid, ttl: Duration) -> Result<Session> {
        // v4 UUID: 122 bits of randomness, collisions are not a practical
        // concern so there is no retry loop
        let token = Uuid::new_v4().to_string();
        let expires_at = Utc::now() + ttl;

        info!("Creating session for user: {}", user_id);

        sqlx::query(
            r#"
            INSERT INTO user_sessions (token, user_id, expires_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(&token)
        .bind(user_id)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(Session {
            token,
            user_id,
            expires_at: Some(expires_at),
        })
    }

    async fn lookup(&self, token: &str) -> Result<Option<Session>> {
        // expiry is filtered in SQL so an expired row never reaches callers,
        // even while it still exists in the table
        let session = sqlx::query_as::<_, Session>(
            r#"
            SELECT token, user_id, expires_at
            FROM user_sessions
            WHERE token = $1
              AND (expires_at IS NULL OR expires_at > now())
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    async fn destroy(&self, token: &str) -> Result<()> {
        info!("Destroying session");

        sqlx::query("DELETE FROM user_sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory stand-in for [`SessionStore`], mirroring the SQL expiry
    //! filtering so resolver tests run without a database.

    use super::*;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    #[derive(Default)]
    pub struct MemorySessionStore {
        sessions: Mutex<HashMap<String, Session>>,
    }

    #[async_trait]
    impl SessionStore for MemorySessionStore {
        async fn create(&self, user_id: Uuid, ttl: Duration) -> Result<Session> {
            let session = Session {
                token: Uuid::new_v4().to_string(),
                user_id,
                expires_at: Some(Utc::now() + ttl),
            };
            self.sessions
                .lock()
                .await
                .insert(session.token.clone(), session.clone());
            Ok(session)
        }

        async fn lookup(&self, token: &str) -> Result<Option<Session>> {
            let sessions = self.sessions.lock().await;
            Ok(sessions
                .get(token)
                .filter(|session| session.is_valid_at(Utc::now()))
                .cloned())
        }

        async fn destroy(&self, token: &str) -> Result<()> {
            self.sessions.lock().await.remove(token);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::MemorySessionStore;
    use super::*;

    #[tokio::test]
    async fn test_create_lookup_destroy_lifecycle() {
        let store = MemorySessionStore::default();
        let user_id = Uuid::new_v4();

        let session = store.create(user_id, default_session_ttl()).await.unwrap();
        assert_eq!(session.user_id, user_id);

        let expires_at = session.expires_at.expect("login sessions carry expiry");
        let expected = Utc::now() + default_session_ttl();
        assert!((expires_at - expected).num_seconds().abs() < 5);

        let found = store.lookup(&session.token).await.unwrap().unwrap();
        assert_eq!(found.user_id, user_id);

        store.destroy(&session.token).await.unwrap();
        assert!(store.lookup(&session.token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_session_is_absent() {
        let store = MemorySessionStore::default();
        let session = store
            .create(Uuid::new_v4(), Duration::seconds(-10))
            .await
            .unwrap();

        // the row still exists, lookup just refuses to return it
        assert!(store.lookup(&session.token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_destroy_unknown_token_is_noop() {
        let store = MemorySessionStore::default();
        store.destroy("no-such-token").await.unwrap();
    }

    #[tokio::test]
    async fn test_tokens_are_unique_per_session() {
        let store = MemorySessionStore::default();
        let user_id = Uuid::new_v4();
        let a = store.create(user_id, default_session_ttl()).await.unwrap();
        let b = store.create(user_id, default_session_ttl()).await.unwrap();
        assert_ne!(a.token, b.token);
    }
}

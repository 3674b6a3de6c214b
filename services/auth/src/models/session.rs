//! Session model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Session entity
///
/// The token is the primary key: an opaque v4 UUID handed to the client at
/// login and resent as `Authorization: Bearer <token>`. A session with
/// `expires_at = None` never expires.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Whether the session is still live at the given instant.
    /// The Postgres store applies this predicate in SQL; this form exists
    /// for the in-memory store used by tests.
    #[cfg(test)]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            None => true,
            Some(expires_at) => expires_at > now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_session_without_expiry_is_valid() {
        let session = Session {
            token: "t".to_string(),
            user_id: Uuid::new_v4(),
            expires_at: None,
        };
        assert!(session.is_valid_at(Utc::now()));
    }

    #[test]
    fn test_session_expiry_is_strict() {
        let now = Utc::now();
        let session = Session {
            token: "t".to_string(),
            user_id: Uuid::new_v4(),
            expires_at: Some(now),
        };
        // expires_at == now is already expired
        assert!(!session.is_valid_at(now));
        assert!(session.is_valid_at(now - Duration::seconds(1)));
    }
}

//! Identity resolution for inbound requests
//!
//! Two separate questions are answered here and must stay separate:
//!
//! - [`IdentityResolver::authorize`] is a coarse pass/fail gate for
//!   machine and legacy-client routes. A passing request carries no user
//!   identity.
//! - [`IdentityResolver::resolve_session`] identifies the logged-in human
//!   behind a bearer session token. A resolved identity carries no
//!   permission-scoping guarantee.

use anyhow::Result;
use axum::http::{HeaderMap, header, request::Parts};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::authcode::AuthCodePolicy;
use crate::config::SecurityConfig;
use crate::repositories::SessionStore;
use crate::token::TokenAuthority;

/// Request-scoped identity resolved from a session token.
/// Never persisted; recomputed on every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    pub user_id: Uuid,
}

/// Composes the token authority, session store, and auth-code policy into
/// per-request authentication decisions
#[derive(Clone)]
pub struct IdentityResolver {
    sessions: Arc<dyn SessionStore>,
    token_authority: Arc<dyn TokenAuthority>,
    policy: AuthCodePolicy,
}

impl IdentityResolver {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        token_authority: Arc<dyn TokenAuthority>,
        security: &SecurityConfig,
    ) -> Self {
        Self {
            sessions,
            token_authority,
            policy: AuthCodePolicy::new(security.auth_code.clone()),
        }
    }

    /// Coarse authorization gate.
    ///
    /// A valid API token authorizes the request outright; the auth-code
    /// policy is only consulted when the token check does not pass. An
    /// unreachable token authority is an upstream failure, not a denial.
    pub async fn authorize(
        &self,
        parts: &Parts,
        required_permission: Option<&str>,
    ) -> Result<bool> {
        let validation = self
            .token_authority
            .validate(parts, required_permission)
            .await?;
        if validation.valid {
            return Ok(true);
        }

        debug!("Token validation failed, falling back to auth-code check");
        Ok(self.policy.check(parts))
    }

    /// Resolve the session behind an `Authorization: Bearer <token>` header.
    ///
    /// Anything other than a well-formed bearer header resolves to `None`,
    /// as does an unknown or expired token.
    pub async fn resolve_session(&self, headers: &HeaderMap) -> Result<Option<SessionIdentity>> {
        let Some(token) = bearer_token(headers) else {
            return Ok(None);
        };

        let session = self.sessions.lookup(token).await?;
        Ok(session.map(|session| SessionIdentity {
            user_id: session.user_id,
        }))
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let rest = value.strip_prefix("Bearer")?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let token = rest.trim();
    if token.is_empty() { None } else { Some(token) }
}

//! API-token validation boundary
//!
//! Machine callers authenticate with API tokens checked by a token
//! authority that lives outside this service. The resolver only needs the
//! yes/no outcome, so the authority is modeled as a trait object and
//! injected at startup.

use anyhow::Result;
use async_trait::async_trait;
use axum::http::request::Parts;

/// Outcome of a token-authority check
#[derive(Debug, Clone)]
pub struct TokenValidation {
    pub valid: bool,
}

/// External token authority.
///
/// `required_permission`, when present, scopes the check to tokens carrying
/// that permission; its interpretation belongs to the authority.
#[async_trait]
pub trait TokenAuthority: Send + Sync {
    async fn validate(
        &self,
        parts: &Parts,
        required_permission: Option<&str>,
    ) -> Result<TokenValidation>;
}

/// Token authority for deployments without an API-token scheme.
/// Reports every token as invalid, so authorization falls through to the
/// auth-code policy.
#[derive(Debug, Clone, Default)]
pub struct NoTokenAuthority;

#[async_trait]
impl TokenAuthority for NoTokenAuthority {
    async fn validate(
        &self,
        _parts: &Parts,
        _required_permission: Option<&str>,
    ) -> Result<TokenValidation> {
        Ok(TokenValidation { valid: false })
    }
}

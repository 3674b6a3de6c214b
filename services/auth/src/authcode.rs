//! Legacy shared-secret auth-code checks
//!
//! Older clients authenticate with a single shared secret (`authCode`)
//! instead of a user session. The secret can arrive in one of four places,
//! tried in order with the first hit winning:
//!
//! 1. `authCode` query parameter of the request URI
//! 2. `authCode` query parameter of the `Referer` URI
//! 3. `authCode` request header
//! 4. `authCode` cookie
//!
//! The expected value comes from [`crate::config::SecurityConfig`] and is
//! injected at construction; when unset (or blank) the check is disabled and
//! passes unconditionally.

use axum::http::{HeaderMap, Uri, header, request::Parts};
use tracing::warn;

const AUTH_CODE_KEY: &str = "authCode";

/// Configured auth-code policy
#[derive(Debug, Clone, Default)]
pub struct AuthCodePolicy {
    expected: Option<String>,
}

impl AuthCodePolicy {
    pub fn new(expected: Option<String>) -> Self {
        Self { expected }
    }

    /// An unset or whitespace-only secret disables the check
    pub fn is_enabled(&self) -> bool {
        self.expected
            .as_deref()
            .is_some_and(|code| !code.trim().is_empty())
    }

    /// Evaluate the policy against a request.
    ///
    /// Disabled policies pass for any (or no) submitted code. Enabled
    /// policies require an extracted code byte-equal to the secret; no
    /// normalization is applied to either side.
    pub fn check(&self, parts: &Parts) -> bool {
        let expected = match self.expected.as_deref() {
            Some(code) if !code.trim().is_empty() => code,
            _ => return true,
        };

        match extract_auth_code(parts) {
            Some(code) => code == expected,
            None => false,
        }
    }
}

/// Pull the auth code out of the request, first source wins
pub fn extract_auth_code(parts: &Parts) -> Option<String> {
    query_param(parts.uri.query(), AUTH_CODE_KEY)
        .or_else(|| referer_query_param(&parts.headers, AUTH_CODE_KEY))
        .or_else(|| header_value(&parts.headers, AUTH_CODE_KEY))
        .or_else(|| cookie_value(&parts.headers, AUTH_CODE_KEY))
}

/// Read a query parameter from a raw query string, percent-decoded.
/// `+` is treated as a space, as browsers encode it.
fn query_param(query: Option<&str>, name: &str) -> Option<String> {
    let query = query?;
    for pair in query.split('&') {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        if key == name {
            let value = value.replace('+', " ");
            return urlencoding::decode(&value).ok().map(|v| v.into_owned());
        }
    }
    None
}

/// Read a query parameter from the Referer URI.
/// An unparseable Referer is logged and treated as carrying no code.
fn referer_query_param(headers: &HeaderMap, name: &str) -> Option<String> {
    let referer = headers.get(header::REFERER)?.to_str().ok()?;
    match referer.parse::<Uri>() {
        Ok(uri) => query_param(uri.query(), name),
        Err(e) => {
            warn!("Invalid Referer URL {:?}: {}", referer, e);
            None
        }
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}

/// Read a cookie value from the `Cookie` header.
/// RFC 6265 `key=value; key=value` pairs, case-sensitive key match,
/// percent-decoded value.
pub(crate) fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    for pair in cookies.split(';') {
        let Some((key, value)) = pair.trim().split_once('=') else {
            continue;
        };
        if key == name {
            return urlencoding::decode(value).ok().map(|v| v.into_owned());
        }
    }
    None
}

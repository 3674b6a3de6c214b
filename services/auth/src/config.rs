//! Security configuration
//!
//! The auth-code secret is read once at startup and injected into the
//! identity resolver, never fetched from ambient state at request time.

use anyhow::Result;

/// Security configuration for the authentication service
#[derive(Debug, Clone, Default)]
pub struct SecurityConfig {
    /// Legacy shared-secret auth code; `None` disables the check
    pub auth_code: Option<String>,
}

impl SecurityConfig {
    /// Create a new SecurityConfig from environment variables
    ///
    /// # Environment Variables
    /// - `AUTH_USER_AUTH_CODE`: expected auth-code secret (optional)
    pub fn from_env() -> Result<Self> {
        let auth_code = std::env::var("AUTH_USER_AUTH_CODE").ok();

        Ok(SecurityConfig { auth_code })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_security_config_unset() {
        unsafe {
            std::env::remove_var("AUTH_USER_AUTH_CODE");
        }

        let config = SecurityConfig::from_env().unwrap();
        assert_eq!(config.auth_code, None);
    }

    #[test]
    #[serial]
    fn test_security_config_set() {
        unsafe {
            std::env::set_var("AUTH_USER_AUTH_CODE", "s3cret");
        }

        let config = SecurityConfig::from_env().unwrap();
        assert_eq!(config.auth_code.as_deref(), Some("s3cret"));

        unsafe {
            std::env::remove_var("AUTH_USER_AUTH_CODE");
        }
    }
}

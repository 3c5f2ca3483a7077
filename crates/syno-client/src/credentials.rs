//! Appliance address and login credentials.
//!
//! The password is redacted in Debug output.

use crate::error::{Error, ErrorKind, Result};

/// Environment variable holding the appliance URL.
pub const ENV_URL: &str = "SYNOLOGY_URL";
/// Environment variable holding the account name.
pub const ENV_USER: &str = "SYNOLOGY_USER";
/// Environment variable holding the account password.
pub const ENV_PASSWORD: &str = "SYNOLOGY_PASSWORD";

/// URL used when none is configured.
pub const DEFAULT_URL: &str = "http://localhost:5000";

/// Where the appliance lives and how to log in to it.
#[derive(Clone)]
pub struct SynoCredentials {
    url: String,
    user: String,
    password: String,
}

impl std::fmt::Debug for SynoCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SynoCredentials")
            .field("url", &self.url)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl SynoCredentials {
    /// Create credentials. An empty URL falls back to [`DEFAULT_URL`];
    /// trailing slashes are removed.
    pub fn new(
        url: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        let url = url.into();
        let url = if url.trim().is_empty() {
            DEFAULT_URL.to_string()
        } else {
            url.trim_end_matches('/').to_string()
        };

        Self {
            url,
            user: user.into(),
            password: password.into(),
        }
    }

    /// Load credentials from environment variables.
    ///
    /// Required environment variables:
    /// - `SYNOLOGY_USER`
    /// - `SYNOLOGY_PASSWORD`
    ///
    /// Optional:
    /// - `SYNOLOGY_URL` (default: `http://localhost:5000`)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load credentials through a custom variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let user = lookup(ENV_USER)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::new(ErrorKind::EnvVar(ENV_USER.to_string())))?;

        let password = lookup(ENV_PASSWORD)
            .ok_or_else(|| Error::new(ErrorKind::EnvVar(ENV_PASSWORD.to_string())))?;

        let url = lookup(ENV_URL).unwrap_or_default();

        Ok(Self::new(url, user, password))
    }

    /// Base URL of the appliance, without trailing slash.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Account name.
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Account password.
    pub fn password(&self) -> &str {
        &self.password
    }
}

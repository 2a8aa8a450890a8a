//! Access-token credentials for the Google APIs.
//!
//! Token acquisition is out of scope here; the token is taken as-is from
//! the environment. The [`Debug`] impl redacts the token to prevent
//! accidental credential exposure in log output.

use reqwest::RequestBuilder;

use crate::error::{CliError, CliResult};

/// Environment variables consulted for the access token, in order.
const TOKEN_ENV_VARS: &[&str] = &["ORGADM_ACCESS_TOKEN", "GOOGLE_OAUTH_ACCESS_TOKEN"];

/// Bearer-token credentials for the IAM and Resource Manager APIs.
#[derive(Clone)]
pub struct Credentials {
    token: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl Credentials {
    /// Create credentials from a raw bearer token.
    #[must_use]
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Read the token from the environment.
    pub fn from_env() -> CliResult<Self> {
        for var in TOKEN_ENV_VARS {
            if let Ok(token) = std::env::var(var) {
                if !token.is_empty() {
                    return Ok(Self::bearer(token));
                }
            }
        }
        Err(CliError::NotAuthenticated)
    }

    /// Attach the bearer token to a request.
    pub fn apply(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.bearer_auth(&self.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_token() {
        let credentials = Credentials::bearer("ya29.secret-token");
        let debug = format!("{credentials:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}

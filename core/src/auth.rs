//! Authentication descriptor for API requests.
//!
//! Only Basic HTTP authentication is sent. The header value is resolved once,
//! when the configuration is set: a complete header wins, otherwise it is
//! computed from the username and password (missing parts count as empty).

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;

use crate::error::ApiError;

pub const BASIC: &str = "BASIC";

/// Raw authentication settings as supplied by the caller.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    /// Defaults to `BASIC`.
    pub method: Option<String>,
    /// Complete `Authorization` header value, used verbatim when present.
    pub header: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl AuthConfig {
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(password.into()),
            ..Self::default()
        }
    }

    pub fn header(value: impl Into<String>) -> Self {
        Self {
            header: Some(value.into()),
            ..Self::default()
        }
    }
}

/// Resolved authentication: a method tag plus the header value to send.
#[derive(Clone, PartialEq, Eq)]
pub struct Auth {
    method: String,
    header: String,
}

impl Auth {
    pub fn resolve(config: &AuthConfig) -> Self {
        let method = config
            .method
            .as_deref()
            .map(str::to_ascii_uppercase)
            .unwrap_or_else(|| BASIC.to_string());

        let header = match &config.header {
            Some(header) => header.clone(),
            None => {
                let username = config.username.as_deref().unwrap_or_default();
                let password = config.password.as_deref().unwrap_or_default();
                format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
            }
        };

        Self { method, header }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// Header value for the `Authorization` header.
    ///
    /// Fails for any method other than `BASIC`.
    pub fn authorization(&self) -> Result<&str, ApiError> {
        if self.method == BASIC {
            Ok(&self.header)
        } else {
            Err(ApiError::UnsupportedAuthMethod(self.method.clone()))
        }
    }
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Auth")
            .field("method", &self.method)
            .field("header", &"<redacted>")
            .finish()
    }
}

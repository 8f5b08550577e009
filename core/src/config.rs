//! Client configuration: API endpoint plus resolved authentication.

use crate::auth::{Auth, AuthConfig};
use crate::error::ConfigError;

pub const ENV_ENDPOINT: &str = "WATERSHED_ENDPOINT";
pub const ENV_AUTH_METHOD: &str = "WATERSHED_AUTH_METHOD";
pub const ENV_AUTH_HEADER: &str = "WATERSHED_AUTH_HEADER";
pub const ENV_USERNAME: &str = "WATERSHED_USERNAME";
pub const ENV_PASSWORD: &str = "WATERSHED_PASSWORD";

/// Where and as whom the client talks to the API.
///
/// The endpoint is the site root, e.g. `https://watershedlrs.com`, without
/// the `api/` segment. It is stored with exactly one trailing slash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    endpoint: String,
    auth: Auth,
}

impl ClientConfig {
    pub fn new(endpoint: &str, auth: &AuthConfig) -> Self {
        Self {
            endpoint: normalize_endpoint(endpoint),
            auth: Auth::resolve(auth),
        }
    }

    /// Build a configuration from `WATERSHED_*` environment variables.
    ///
    /// `WATERSHED_ENDPOINT` is required; the auth variables are optional and
    /// follow the same defaulting rules as `AuthConfig`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let endpoint = lookup(ENV_ENDPOINT).ok_or(ConfigError::MissingVar(ENV_ENDPOINT))?;
        let auth = AuthConfig {
            method: lookup(ENV_AUTH_METHOD),
            header: lookup(ENV_AUTH_HEADER),
            username: lookup(ENV_USERNAME),
            password: lookup(ENV_PASSWORD),
        };
        Ok(Self::new(&endpoint, &auth))
    }

    pub fn set_endpoint(&mut self, endpoint: &str) -> &mut Self {
        self.endpoint = normalize_endpoint(endpoint);
        self
    }

    pub fn set_auth(&mut self, auth: &AuthConfig) -> &mut Self {
        self.auth = Auth::resolve(auth);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn auth(&self) -> &Auth {
        &self.auth
    }

    /// Absolute URL of an API resource path such as `cards`.
    pub fn api_url(&self, path: &str) -> String {
        format!("{}api/{path}", self.endpoint)
    }
}

fn normalize_endpoint(endpoint: &str) -> String {
    if endpoint.ends_with('/') {
        endpoint.to_string()
    } else {
        format!("{endpoint}/")
    }
}

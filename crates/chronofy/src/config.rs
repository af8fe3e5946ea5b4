//! Client options and credentials.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ChronofyError, ChronofyResult};

/// Options controlling a [`Chronofy`](crate::Chronofy) client.
///
/// Unknown keys are rejected when options are deserialized, so a typo in a
/// configuration file fails at construction instead of being ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientOptions {
    /// Base URL of the versioned REST API. Resource paths are appended verbatim.
    pub url: String,

    /// Base URL of the OAuth token endpoint.
    pub oauth_url: String,

    /// Re-authorize and retry once when the token is reported expired or invalid.
    pub token_refresh: bool,

    /// Key the access token is stored under in the token cache.
    pub cache_key: String,

    /// Read the token from the cache before each request and write fresh
    /// tokens back after re-authorization.
    ///
    /// Off by default: the cache is then only used to invalidate the token.
    pub cache_tokens: bool,
}

impl ClientOptions {
    /// Default REST API base URL.
    pub const DEFAULT_URL: &'static str = "https://api.cronofy.com/v1/";

    /// Default OAuth base URL.
    pub const DEFAULT_OAUTH_URL: &'static str = "https://api.cronofy.com/";

    /// Default cache key.
    pub const DEFAULT_CACHE_KEY: &'static str = "token";

    /// Creates options with the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses options from a JSON object, rejecting unknown keys.
    pub fn from_value(value: serde_json::Value) -> ChronofyResult<Self> {
        let options: Self = serde_json::from_value(value).map_err(|e| {
            ChronofyError::configuration(format!("invalid client options: {}", e))
        })?;
        options.validate()?;
        Ok(options)
    }

    /// Parses options from a TOML document, rejecting unknown keys.
    pub fn from_toml_str(content: &str) -> ChronofyResult<Self> {
        let options: Self = toml::from_str(content).map_err(|e| {
            ChronofyError::configuration(format!("invalid client options: {}", e))
        })?;
        options.validate()?;
        Ok(options)
    }

    /// Sets the REST API base URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Sets the OAuth base URL.
    pub fn with_oauth_url(mut self, url: impl Into<String>) -> Self {
        self.oauth_url = url.into();
        self
    }

    /// Enables or disables refresh-and-retry.
    pub fn with_token_refresh(mut self, enabled: bool) -> Self {
        self.token_refresh = enabled;
        self
    }

    /// Sets the cache key.
    pub fn with_cache_key(mut self, key: impl Into<String>) -> Self {
        self.cache_key = key.into();
        self
    }

    /// Enables or disables cache read/write-through.
    pub fn with_cache_tokens(mut self, enabled: bool) -> Self {
        self.cache_tokens = enabled;
        self
    }

    /// Validates the options.
    pub fn validate(&self) -> ChronofyResult<()> {
        validate_base_url("url", &self.url)?;
        validate_base_url("oauth_url", &self.oauth_url)?;

        if self.cache_key.trim().is_empty() {
            return Err(ChronofyError::configuration("cache_key must not be empty"));
        }

        Ok(())
    }
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            url: Self::DEFAULT_URL.to_string(),
            oauth_url: Self::DEFAULT_OAUTH_URL.to_string(),
            token_refresh: true,
            cache_key: Self::DEFAULT_CACHE_KEY.to_string(),
            cache_tokens: false,
        }
    }
}

fn validate_base_url(name: &str, value: &str) -> ChronofyResult<()> {
    let parsed = Url::parse(value).map_err(|e| {
        ChronofyError::configuration(format!("{} is not a valid URL ({}): {}", name, value, e))
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ChronofyError::configuration(format!(
            "{} must use http or https, got {}",
            name,
            parsed.scheme()
        )));
    }

    if !value.ends_with('/') {
        return Err(ChronofyError::configuration(format!(
            "{} must end with '/': {}",
            name, value
        )));
    }

    Ok(())
}

/// OAuth client credentials used by the token exchange.
///
/// Both values are optional until [`authorize`](crate::Chronofy::authorize)
/// actually needs them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// The OAuth client ID.
    pub client_id: Option<String>,
    /// The OAuth client secret.
    pub client_secret: Option<String>,
}

impl Credentials {
    /// Creates credentials with both values set.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: Some(client_id.into()),
            client_secret: Some(client_secret.into()),
        }
    }

    /// Returns `(client_id, client_secret)`, or a configuration error if
    /// either is missing or empty.
    pub fn require(&self) -> ChronofyResult<(&str, &str)> {
        let client_id = self
            .client_id
            .as_deref()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ChronofyError::configuration("client_id is required to authorize"))?;
        let client_secret = self
            .client_secret
            .as_deref()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                ChronofyError::configuration("client_secret is required to authorize")
            })?;
        Ok((client_id, client_secret))
    }
}

//! CLI configuration.
//!
//! Settings live in `~/.config/chronofy/config.toml` by default:
//!
//! ```toml
//! [client]
//! url = "https://api.cronofy.com/v1/"
//! token_refresh = true
//!
//! [credentials]
//! client_id = "env::CRONOFY_CLIENT_ID"
//! client_secret = "pass::cronofy/client-secret"
//! token = "env::CRONOFY_ACCESS_TOKEN"
//! ```
//!
//! Unknown keys are rejected. Credential values support the secret
//! references described in [`crate::secret`].

use std::path::{Path, PathBuf};

use chronofy::{ClientOptions, Credentials};
use serde::{Deserialize, Serialize};

use crate::error::{CliError, CliResult};
use crate::secret::{self, SecretRef};

/// Contents of `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    /// Client options, passed to the API client unchanged.
    pub client: ClientOptions,

    /// OAuth credentials and access token.
    pub credentials: CredentialSettings,
}

/// The `[credentials]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CredentialSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// Access token, used when `--token` and `CHRONOFY_TOKEN` are absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl CredentialSettings {
    /// Resolves the OAuth client credentials.
    ///
    /// Missing values stay missing; the client reports them when
    /// authorization is actually attempted.
    pub fn resolve_credentials(&self) -> Result<Credentials, String> {
        Ok(Credentials {
            client_id: resolve_field("client_id", self.client_id.as_deref())?,
            client_secret: resolve_field("client_secret", self.client_secret.as_deref())?,
        })
    }

    /// Resolves the access token, if one is configured.
    pub fn resolve_token(&self) -> Result<Option<String>, String> {
        resolve_field("token", self.token.as_deref())
    }

    /// Copy with inline secrets replaced; references are kept.
    pub fn redacted(&self) -> Self {
        let redact =
            |value: &Option<String>| value.as_deref().map(|v| SecretRef::parse(v).redacted());
        Self {
            client_id: self.client_id.clone(),
            client_secret: redact(&self.client_secret),
            token: redact(&self.token),
        }
    }
}

fn resolve_field(name: &str, value: Option<&str>) -> Result<Option<String>, String> {
    value
        .map(|v| secret::resolve(v).map_err(|e| format!("failed to resolve {}: {}", name, e)))
        .transpose()
}

impl CliConfig {
    /// Loads configuration from the default path, or defaults if it does
    /// not exist.
    pub fn load() -> CliResult<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> CliResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
            .map_err(|e| CliError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parses and validates a configuration document.
    pub fn from_toml_str(content: &str) -> Result<Self, String> {
        let config: Self =
            toml::from_str(content).map_err(|e| format!("failed to parse config: {}", e))?;
        config.client.validate().map_err(|e| e.to_string())?;
        Ok(config)
    }

    /// Returns the configuration with inline secrets redacted, as TOML.
    pub fn to_redacted_toml(&self) -> Result<String, String> {
        let redacted = Self {
            client: self.client.clone(),
            credentials: self.credentials.redacted(),
        };
        toml::to_string_pretty(&redacted).map_err(|e| format!("failed to serialize config: {}", e))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("chronofy")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secret::REDACTED;
    use std::io::Write;

    #[test]
    fn empty_document_is_default() {
        let config = CliConfig::from_toml_str("").unwrap();
        assert_eq!(config, CliConfig::default());
        assert_eq!(config.client, ClientOptions::default());
    }

    #[test]
    fn client_table_maps_to_options() {
        let config = CliConfig::from_toml_str(
            r#"
[client]
url = "http://localhost:9000/v1/"
token_refresh = false
cache_key = "work"
"#,
        )
        .unwrap();

        assert_eq!(config.client.url, "http://localhost:9000/v1/");
        assert!(!config.client.token_refresh);
        assert_eq!(config.client.cache_key, "work");
        assert_eq!(config.client.oauth_url, ClientOptions::DEFAULT_OAUTH_URL);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = CliConfig::from_toml_str("[client]\nretries = 3\n").unwrap_err();
        assert!(err.contains("retries"));

        let err = CliConfig::from_toml_str("[calendar]\nclient_id = \"x\"\n").unwrap_err();
        assert!(err.contains("calendar"));

        assert!(CliConfig::from_toml_str("[credentials]\npassword = \"x\"\n").is_err());
    }

    #[test]
    fn invalid_client_options_are_rejected() {
        let err = CliConfig::from_toml_str("[client]\nurl = \"https://api.example.com/v1\"\n")
            .unwrap_err();
        assert!(err.contains("must end with '/'"));
    }

    #[test]
    fn credentials_resolve_env_references() {
        unsafe {
            std::env::set_var("_CHRONOFY_CFG_ID", "env-client-id");
            std::env::set_var("_CHRONOFY_CFG_TOKEN", "env-token");
        }

        let config = CliConfig::from_toml_str(
            r#"
[credentials]
client_id = "env::_CHRONOFY_CFG_ID"
client_secret = "plain-secret"
token = "env::_CHRONOFY_CFG_TOKEN"
"#,
        )
        .unwrap();

        let creds = config.credentials.resolve_credentials().unwrap();
        assert_eq!(creds, Credentials::new("env-client-id", "plain-secret"));
        assert_eq!(
            config.credentials.resolve_token().unwrap().as_deref(),
            Some("env-token")
        );

        unsafe {
            std::env::remove_var("_CHRONOFY_CFG_ID");
            std::env::remove_var("_CHRONOFY_CFG_TOKEN");
        }
    }

    #[test]
    fn missing_credentials_stay_missing() {
        let settings = CredentialSettings::default();
        assert_eq!(settings.resolve_credentials().unwrap(), Credentials::default());
        assert_eq!(settings.resolve_token().unwrap(), None);
    }

    #[test]
    fn unresolvable_reference_errors() {
        let settings = CredentialSettings {
            token: Some("env::_CHRONOFY_CFG_UNSET_4242".to_string()),
            ..Default::default()
        };
        let err = settings.resolve_token().unwrap_err();
        assert!(err.starts_with("failed to resolve token"));
    }

    #[test]
    fn dump_redacts_inline_secrets() {
        let config = CliConfig {
            credentials: CredentialSettings {
                client_id: Some("my-client".to_string()),
                client_secret: Some("very-secret".to_string()),
                token: Some("env::CRONOFY_ACCESS_TOKEN".to_string()),
            },
            ..Default::default()
        };

        let dumped = config.to_redacted_toml().unwrap();
        assert!(dumped.contains("my-client"));
        assert!(!dumped.contains("very-secret"));
        assert!(dumped.contains(REDACTED));
        assert!(dumped.contains("env::CRONOFY_ACCESS_TOKEN"));

        // The dump is itself a valid config.
        assert!(CliConfig::from_toml_str(&dumped).is_ok());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[client]\ncache_tokens = true").unwrap();

        let config = CliConfig::load_from(file.path()).unwrap();
        assert!(config.client.cache_tokens);

        let missing = file.path().with_extension("missing");
        assert!(matches!(
            CliConfig::load_from(&missing),
            Err(CliError::Config(_))
        ));
    }

    #[test]
    fn default_path_is_under_chronofy_dir() {
        let path = CliConfig::default_path();
        assert!(path.ends_with("chronofy/config.toml"));
    }
}

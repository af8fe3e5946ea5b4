//! Configuration commands.

use std::path::Path;

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};

/// Dump the configuration to stdout with inline secrets redacted.
pub fn dump(config: &CliConfig, path: &Path) -> CliResult<()> {
    let toml_str = config.to_redacted_toml().map_err(CliError::Config)?;
    println!("# config.toml ({})", path.display());
    println!("{}", toml_str);
    Ok(())
}

/// Validate the configuration, including secret references.
pub fn validate(config: &CliConfig) -> CliResult<()> {
    config
        .client
        .validate()
        .map_err(|e| CliError::Config(e.to_string()))?;

    let credentials = config
        .credentials
        .resolve_credentials()
        .map_err(CliError::Config)?;
    if credentials.client_id.is_some() || credentials.client_secret.is_some() {
        credentials
            .require()
            .map_err(|e| CliError::Config(format!("incomplete credentials: {}", e.message())))?;
        println!("Client credentials resolve.");
    }

    if config
        .credentials
        .resolve_token()
        .map_err(CliError::Config)?
        .is_some()
    {
        println!("Access token resolves.");
    }

    println!("Configuration is valid.");
    Ok(())
}

/// Show the configuration file path.
pub fn path(path: &Path) -> CliResult<()> {
    println!("config: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CredentialSettings;

    #[test]
    fn validate_accepts_defaults() {
        assert!(validate(&CliConfig::default()).is_ok());
    }

    #[test]
    fn validate_rejects_half_credentials() {
        let config = CliConfig {
            credentials: CredentialSettings {
                client_id: Some("id".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };

        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("client_secret"));
    }

    #[test]
    fn validate_rejects_unresolvable_token() {
        let config = CliConfig {
            credentials: CredentialSettings {
                token: Some("env::_CHRONOFY_VALIDATE_UNSET_777".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };

        assert!(matches!(validate(&config), Err(CliError::Config(_))));
    }
}

//! Subcommand implementations.

pub mod api;
pub mod config;

use chronofy::Chronofy;
use tracing::debug;

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};

/// Builds an API client from the `--token` flag and the loaded config.
///
/// The flag (or `CHRONOFY_TOKEN`) wins over `token` in `[credentials]`.
pub fn build_client(token: Option<&str>, config: &CliConfig) -> CliResult<Chronofy> {
    let token = match token.filter(|t| !t.is_empty()) {
        Some(token) => token.to_string(),
        None => config
            .credentials
            .resolve_token()
            .map_err(CliError::Config)?
            .ok_or(CliError::MissingToken)?,
    };
    let credentials = config
        .credentials
        .resolve_credentials()
        .map_err(CliError::Config)?;

    debug!(url = %config.client.url, "creating API client");
    let client = Chronofy::new(token, config.client.clone())?.with_credentials(credentials);
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronofy::ErrorCode;

    #[tokio::test]
    async fn flag_token_wins_over_config() {
        let mut config = CliConfig::default();
        config.credentials.token = Some("from-config".to_string());

        let client = build_client(Some("from-flag"), &config).unwrap();
        let token = client.access_token().await;
        assert_eq!(token, "from-flag");
    }

    #[tokio::test]
    async fn config_token_is_used_without_flag() {
        let mut config = CliConfig::default();
        config.credentials.token = Some("from-config".to_string());

        let client = build_client(None, &config).unwrap();
        let token = client.access_token().await;
        assert_eq!(token, "from-config");
    }

    #[test]
    fn missing_token_is_reported() {
        let err = build_client(None, &CliConfig::default()).unwrap_err();
        assert!(matches!(err, CliError::MissingToken));

        let err = build_client(Some(""), &CliConfig::default()).unwrap_err();
        assert!(matches!(err, CliError::MissingToken));
    }

    #[test]
    fn empty_config_token_is_rejected_by_client() {
        let mut config = CliConfig::default();
        config.credentials.token = Some(String::new());

        let err = build_client(None, &config).unwrap_err();
        assert!(matches!(err, CliError::Api(ref e) if e.code() == ErrorCode::TokenEmpty));
    }
}

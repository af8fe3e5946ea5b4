//! CLI error types.

use std::fmt;

use chronofy::ChronofyError;

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI.
#[derive(Debug)]
pub enum CliError {
    /// Configuration error.
    Config(String),
    /// No access token was found in flags, environment or config.
    MissingToken,
    /// Error returned by the API client.
    Api(ChronofyError),
    /// Output could not be rendered.
    Output(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
            Self::MissingToken => write!(
                f,
                "no access token: pass --token, set CHRONOFY_TOKEN or add `token` to [credentials]"
            ),
            Self::Api(err) => write!(f, "API error: {}", err),
            Self::Output(msg) => write!(f, "output error: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Api(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ChronofyError> for CliError {
    fn from(err: ChronofyError) -> Self {
        Self::Api(err)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::Output(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronofy::ErrorCode;
    use std::error::Error;

    #[test]
    fn api_errors_keep_their_source() {
        let err = CliError::from(ChronofyError::http(500, "boom"));
        assert_eq!(err.to_string(), "API error: http: boom (status 500)");

        let source = err.source().and_then(|s| s.downcast_ref::<ChronofyError>());
        assert_eq!(source.map(|e| e.code()), Some(ErrorCode::Http));
    }

    #[test]
    fn config_and_output_errors_have_no_source() {
        let err = CliError::Config("failed to read config.toml".to_string());
        assert_eq!(err.to_string(), "configuration error: failed to read config.toml");
        assert!(err.source().is_none());

        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = CliError::from(json_err);
        assert!(matches!(err, CliError::Output(_)));
        assert!(err.source().is_none());
    }

    #[test]
    fn missing_token_mentions_all_sources() {
        let msg = CliError::MissingToken.to_string();
        assert!(msg.contains("--token"));
        assert!(msg.contains("CHRONOFY_TOKEN"));
        assert!(msg.contains("[credentials]"));
    }
}

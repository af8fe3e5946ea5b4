//! Error types for chronofy client operations.
//!
//! Every failure carries an [`ErrorCode`] discriminant. The client's retry
//! logic switches on that code rather than on the shape of the error, so the
//! classification of upstream responses lives in one place
//! ([`crate::http::classify_error_body`]).

use std::fmt;

use thiserror::Error;

/// The category of a chronofy error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Non-2xx response that is not an authorization failure.
    Http,
    /// 400/401/403 response carrying an `error` message.
    Unauthorized,
    /// The access token has expired; refreshable.
    TokenExpired,
    /// The access token was rejected as invalid; refreshable.
    TokenInvalid,
    /// The token exchange was refused (`invalid_grant`).
    InvalidGrant,
    /// Transport-level fault: DNS, TLS, timeout, connection reset.
    Adapter,
    /// The token cache could not delete the token.
    Cache,
    /// A byte-stream body was expected but something else was returned.
    FileResource,
    /// No access token was supplied at construction.
    TokenEmpty,
    /// A caller-supplied argument was rejected before any request was made.
    InvalidArgument,
    /// Invalid or unknown client options, or missing credentials.
    Configuration,
    /// The response body could not be decoded in the requested shape.
    InvalidResponse,
}

impl ErrorCode {
    /// Returns true for the unauthorized family of errors.
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized | Self::TokenExpired | Self::TokenInvalid | Self::InvalidGrant
        )
    }

    /// Returns true if re-authorizing may fix the failure.
    pub fn triggers_refresh(&self) -> bool {
        matches!(self, Self::TokenExpired | Self::TokenInvalid)
    }

    /// Returns the snake_case name of this code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Unauthorized => "unauthorized",
            Self::TokenExpired => "token_expired",
            Self::TokenInvalid => "token_invalid",
            Self::InvalidGrant => "invalid_grant",
            Self::Adapter => "adapter",
            Self::Cache => "cache",
            Self::FileResource => "file_resource",
            Self::TokenEmpty => "token_empty",
            Self::InvalidArgument => "invalid_argument",
            Self::Configuration => "configuration",
            Self::InvalidResponse => "invalid_response",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error raised by the chronofy client.
#[derive(Debug, Error)]
pub struct ChronofyError {
    code: ErrorCode,
    message: String,
    /// HTTP status of the exchange that produced this error, if any.
    status: Option<u16>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ChronofyError {
    /// Creates a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status: None,
            source: None,
        }
    }

    /// Creates an HTTP error carrying the response status.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Http, message).with_status(status)
    }

    /// Creates a generic unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// Creates a token-expired error.
    pub fn token_expired(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::TokenExpired, message)
    }

    /// Creates a token-invalid error.
    pub fn token_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::TokenInvalid, message)
    }

    /// Creates an invalid-grant error.
    pub fn invalid_grant() -> Self {
        Self::new(ErrorCode::InvalidGrant, "the authorization grant was refused")
    }

    /// Creates a transport error.
    pub fn adapter(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Adapter, message)
    }

    /// Creates a cache error.
    pub fn cache(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Cache, message)
    }

    /// Creates a file-resource error.
    pub fn file_resource(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::FileResource, message)
    }

    /// Creates the error raised when no access token is supplied.
    pub fn token_empty() -> Self {
        Self::new(ErrorCode::TokenEmpty, "you must provide an access token")
    }

    /// Creates an invalid-argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidArgument, message)
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Configuration, message)
    }

    /// Creates an invalid-response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidResponse, message)
    }

    /// Sets the HTTP status for this error.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the underlying cause.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the HTTP status, if the error came from a response.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Returns true for the unauthorized family of errors.
    pub fn is_unauthorized(&self) -> bool {
        self.code.is_unauthorized()
    }
}

impl fmt::Display for ChronofyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        if let Some(status) = self.status {
            write!(f, " (status {})", status)?;
        }
        Ok(())
    }
}

/// A specialized Result type for chronofy operations.
pub type ChronofyResult<T> = Result<T, ChronofyError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn unauthorized_family() {
        assert!(ErrorCode::Unauthorized.is_unauthorized());
        assert!(ErrorCode::TokenExpired.is_unauthorized());
        assert!(ErrorCode::TokenInvalid.is_unauthorized());
        assert!(ErrorCode::InvalidGrant.is_unauthorized());
        assert!(!ErrorCode::Http.is_unauthorized());
        assert!(!ErrorCode::Adapter.is_unauthorized());
        assert!(!ErrorCode::Cache.is_unauthorized());
    }

    #[test]
    fn only_expired_and_invalid_trigger_refresh() {
        assert!(ErrorCode::TokenExpired.triggers_refresh());
        assert!(ErrorCode::TokenInvalid.triggers_refresh());
        assert!(!ErrorCode::Unauthorized.triggers_refresh());
        assert!(!ErrorCode::InvalidGrant.triggers_refresh());
        assert!(!ErrorCode::Http.triggers_refresh());
    }

    #[test]
    fn http_error_carries_status() {
        let err = ChronofyError::http(404, "not found");
        assert_eq!(err.code(), ErrorCode::Http);
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.to_string(), "http: not found (status 404)");
    }

    #[test]
    fn display_without_status() {
        let err = ChronofyError::token_empty();
        assert_eq!(err.to_string(), "token_empty: you must provide an access token");
        assert!(err.status().is_none());
    }

    #[test]
    fn cache_error_keeps_original_cause() {
        let original = ChronofyError::token_expired("token_expired").with_status(401);
        let err = ChronofyError::cache("could not delete the token").with_source(original);

        assert_eq!(err.code(), ErrorCode::Cache);
        let source = err.source().expect("source");
        let source = source.downcast_ref::<ChronofyError>().expect("chronofy error");
        assert_eq!(source.code(), ErrorCode::TokenExpired);
        assert_eq!(source.status(), Some(401));
    }
}

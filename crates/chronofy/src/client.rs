//! The chronofy API client.
//!
//! [`Chronofy`] owns the client options, a transport adapter and a token
//! cache. Every call funnels through `perform_request`, which attaches the
//! bearer token and handles authorization failures:
//!
//! 1. any unauthorized-family error deletes the cached token first; a failed
//!    delete turns into an [`ErrorCode::Cache`](crate::ErrorCode::Cache) error
//!    wrapping the original
//! 2. `TokenExpired`/`TokenInvalid` with `token_refresh` enabled re-authorize
//!    and retry the same request, at most once
//! 3. everything else propagates unchanged
//!
//! The client does no locking across calls; share one instance between tasks
//! only if the callers serialize their requests.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::cache::{FileTokenCache, TokenCache};
use crate::config::{ClientOptions, Credentials};
use crate::error::{ChronofyError, ChronofyResult};
use crate::http::{HttpAdapter, HttpRequest, Method, Params, ReqwestAdapter, ResponseBody, ReturnShape};

/// Resource of the OAuth token exchange, relative to the OAuth base URL.
pub const OAUTH_TOKEN_RESOURCE: &str = "oauth/token";

/// Grant type sent with the token exchange.
pub const GRANT_TYPE: &str = "authorization_code";

/// Retries allowed per call after a refreshable authorization failure.
const MAX_REFRESH_RETRIES: u32 = 1;

/// Client for the calendar API.
pub struct Chronofy {
    options: ClientOptions,
    credentials: Credentials,
    http: Arc<dyn HttpAdapter>,
    cache: Arc<dyn TokenCache>,
    token: RwLock<String>,
    /// Set once the in-memory token has been rejected and dropped from the
    /// cache; cleared by a successful refresh.
    invalidated: AtomicBool,
}

impl Chronofy {
    /// Creates a client using [`ReqwestAdapter`] and a [`FileTokenCache`] in
    /// the system temporary directory.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorCode::TokenEmpty`](crate::ErrorCode::TokenEmpty) for an empty token and
    /// [`ErrorCode::Configuration`](crate::ErrorCode::Configuration) for invalid options, before any I/O.
    pub fn new(token: impl Into<String>, options: ClientOptions) -> ChronofyResult<Self> {
        let token = token.into();
        ensure_token(&token)?;
        options.validate()?;

        let http = ReqwestAdapter::new()?;
        Self::with_components(
            token,
            options,
            Arc::new(http),
            Arc::new(FileTokenCache::in_temp_dir()),
        )
    }

    /// Creates a client with an explicit adapter and cache.
    pub fn with_components(
        token: impl Into<String>,
        options: ClientOptions,
        http: Arc<dyn HttpAdapter>,
        cache: Arc<dyn TokenCache>,
    ) -> ChronofyResult<Self> {
        let token = token.into();
        ensure_token(&token)?;
        options.validate()?;

        Ok(Self {
            options,
            credentials: Credentials::default(),
            http,
            cache,
            token: RwLock::new(token),
            invalidated: AtomicBool::new(false),
        })
    }

    /// Sets the OAuth client ID used by [`authorize`](Self::authorize).
    pub fn set_client_id(&mut self, client_id: impl Into<String>) {
        self.credentials.client_id = Some(client_id.into());
    }

    /// Sets the OAuth client secret used by [`authorize`](Self::authorize).
    pub fn set_client_secret(&mut self, client_secret: impl Into<String>) {
        self.credentials.client_secret = Some(client_secret.into());
    }

    /// Replaces both credentials.
    pub fn set_credentials(&mut self, credentials: Credentials) {
        self.credentials = credentials;
    }

    /// Builder form of [`set_credentials`](Self::set_credentials).
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Validates `options` and replaces the current options with them.
    ///
    /// On error the current options are left untouched.
    pub fn reconfigure(&mut self, options: ClientOptions) -> ChronofyResult<()> {
        options.validate()?;
        self.options = options;
        Ok(())
    }

    /// Returns the options in effect.
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Returns the transport adapter.
    pub fn http_adapter(&self) -> &Arc<dyn HttpAdapter> {
        &self.http
    }

    /// Returns the token cache.
    pub fn token_cache(&self) -> &Arc<dyn TokenCache> {
        &self.cache
    }

    /// Returns the access token currently held in memory.
    pub async fn access_token(&self) -> String {
        self.token.read().await.clone()
    }

    /// Issues an authenticated GET against the API base URL.
    pub async fn get(
        &self,
        resource: &str,
        params: Params,
        headers: Params,
        shape: ReturnShape,
    ) -> ChronofyResult<ResponseBody> {
        self.perform_request(
            HttpRequest::new(Method::Get, resource)
                .with_params(params)
                .with_headers(headers)
                .with_shape(shape),
        )
        .await
    }

    /// Issues an authenticated POST against the API base URL.
    pub async fn post(
        &self,
        resource: &str,
        params: Params,
        headers: Params,
        shape: ReturnShape,
    ) -> ChronofyResult<ResponseBody> {
        self.perform_request(
            HttpRequest::new(Method::Post, resource)
                .with_params(params)
                .with_headers(headers)
                .with_shape(shape),
        )
        .await
    }

    /// GET returning the parsed JSON body.
    pub(crate) async fn get_json(&self, resource: &str, params: Params) -> ChronofyResult<Value> {
        self.get(resource, params, Vec::new(), ReturnShape::Json)
            .await?
            .into_json()
    }

    async fn perform_request(&self, request: HttpRequest) -> ChronofyResult<ResponseBody> {
        let mut retries = 0;

        loop {
            let token = self.current_token().await;
            let mut outgoing = request.clone();
            outgoing.set_header("Authorization", format!("Bearer {}", token));

            debug!(
                method = %request.method,
                resource = %request.resource,
                retry = retries,
                "performing request"
            );

            let error = match self
                .http
                .with_base_url(&self.options.url)
                .send(outgoing)
                .await
            {
                Ok(body) => return Ok(body),
                Err(e) if e.is_unauthorized() => e,
                Err(e) => return Err(e),
            };

            warn!(
                code = %error.code(),
                resource = %request.resource,
                "request was not authorized, invalidating cached token"
            );

            if !self.cache.delete(&self.options.cache_key).await {
                warn!(key = %self.options.cache_key, "failed to delete token from cache");
                return Err(ChronofyError::cache(
                    "could not delete the token from the cache, check its permissions",
                )
                .with_source(error));
            }
            self.invalidated.store(true, Ordering::SeqCst);

            if !self.options.token_refresh
                || !error.code().triggers_refresh()
                || retries >= MAX_REFRESH_RETRIES
            {
                return Err(error);
            }

            retries += 1;
            self.refresh_token().await?;
        }
    }

    /// Exchanges the client credentials for a new access token.
    ///
    /// The exchange goes to `oauth/token` on the OAuth base URL; the API
    /// base URL is untouched. The token is returned, not stored.
    ///
    /// # Errors
    ///
    /// - [`ErrorCode::Configuration`](crate::ErrorCode::Configuration) if a credential is missing
    /// - [`ErrorCode::Http`](crate::ErrorCode::Http) with the observed status unless the response is
    ///   a 200 carrying `access_token`
    /// - adapter failures such as [`ErrorCode::InvalidGrant`](crate::ErrorCode::InvalidGrant) unchanged
    pub async fn authorize(&self) -> ChronofyResult<String> {
        let (client_id, client_secret) = self.credentials.require()?;

        let params = vec![
            ("client_id".to_string(), client_id.to_string()),
            ("client_secret".to_string(), client_secret.to_string()),
            ("grant_type".to_string(), GRANT_TYPE.to_string()),
        ];

        debug!(url = %self.options.oauth_url, "requesting access token");
        let body = self
            .http
            .with_base_url(&self.options.oauth_url)
            .post(OAUTH_TOKEN_RESOURCE, params, Vec::new(), ReturnShape::String)
            .await?;
        let status = self.http.response_code()?;
        let missing =
            || ChronofyError::http(status, "no access token was provided in the response");

        let value = body.into_json().map_err(|e| missing().with_source(e))?;
        match value.get("access_token").and_then(Value::as_str) {
            Some(token) if status == 200 => Ok(token.to_string()),
            _ => Err(missing()),
        }
    }

    /// Re-authorizes and installs the new token.
    async fn refresh_token(&self) -> ChronofyResult<()> {
        let token = self.authorize().await?;
        *self.token.write().await = token.clone();
        self.invalidated.store(false, Ordering::SeqCst);

        if self.options.cache_tokens && !self.cache.set(&self.options.cache_key, &token).await {
            warn!(key = %self.options.cache_key, "failed to store refreshed token in cache");
        }

        info!("re-authorized after token was rejected");
        Ok(())
    }

    /// Token to send with the next request.
    ///
    /// With `cache_tokens` a cached value wins over the in-memory one; an
    /// empty cache is seeded with the in-memory token unless that token was
    /// rejected since the last refresh.
    async fn current_token(&self) -> String {
        if !self.options.cache_tokens {
            return self.token.read().await.clone();
        }

        let key = &self.options.cache_key;
        match self.cache.get(key).await.filter(|t| !t.is_empty()) {
            Some(cached) => {
                let mut token = self.token.write().await;
                if *token != cached {
                    debug!(key = %key, "using token from cache");
                    *token = cached.clone();
                }
                self.invalidated.store(false, Ordering::SeqCst);
                cached
            }
            None => {
                let token = self.token.read().await.clone();
                if self.invalidated.load(Ordering::SeqCst) {
                    debug!(key = %key, "not seeding cache with a rejected token");
                } else if !self.cache.set(key, &token).await {
                    warn!(key = %key, "failed to seed token cache");
                }
                token
            }
        }
    }
}

impl fmt::Debug for Chronofy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chronofy")
            .field("options", &self.options)
            .field("has_client_id", &self.credentials.client_id.is_some())
            .field("has_client_secret", &self.credentials.client_secret.is_some())
            .field("token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

fn ensure_token(token: &str) -> ChronofyResult<()> {
    if token.trim().is_empty() {
        return Err(ChronofyError::token_empty());
    }
    Ok(())
}

//! [`HttpAdapter`] implementation backed by `reqwest`.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::{debug, trace, warn};

use super::{
    BoxFuture, HttpAdapter, HttpRequest, HttpResponse, Method, Params, ResponseBody,
    classify_error_body,
};
use crate::error::{ChronofyError, ChronofyResult};

/// Longest body excerpt included in an HTTP error message.
const ERROR_BODY_EXCERPT: usize = 200;

/// Adapter that performs exchanges with a shared `reqwest::Client`.
///
/// Connection pooling, TLS, redirects and timeouts are all left to the
/// underlying client.
#[derive(Debug)]
pub struct ReqwestAdapter {
    client: Client,
    last: Mutex<Option<HttpResponse>>,
}

impl ReqwestAdapter {
    /// Default request timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Creates an adapter with default settings.
    pub fn new() -> ChronofyResult<Self> {
        Self::builder().build()
    }

    /// Returns a builder for custom timeouts and user agents.
    pub fn builder() -> ReqwestAdapterBuilder {
        ReqwestAdapterBuilder::default()
    }

    /// Wraps an existing client.
    pub fn from_client(client: Client) -> Self {
        Self {
            client,
            last: Mutex::new(None),
        }
    }

    fn record(&self, response: Option<HttpResponse>) {
        *self.last.lock().unwrap_or_else(PoisonError::into_inner) = response;
    }

    async fn execute(&self, base_url: &str, request: HttpRequest) -> ChronofyResult<ResponseBody> {
        self.record(None);

        let url = format!("{}{}", base_url, request.resource);
        let mut builder = match request.method {
            Method::Get => self.client.get(&url).query(&request.params),
            Method::Post => self.client.post(&url).form(&request.params),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        debug!(method = %request.method, url = %url, "sending request");

        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status();
        let headers: Params = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let bytes = response.bytes().await.map_err(transport_error)?;
        let content = String::from_utf8_lossy(&bytes).into_owned();

        trace!(status = status.as_u16(), bytes = bytes.len(), "received response");

        self.record(Some(HttpResponse {
            status: status.as_u16(),
            headers,
            content: content.clone(),
        }));

        if !status.is_success() {
            warn!(status = status.as_u16(), url = %url, "request failed");
            return Err(classify_error_body(
                status.as_u16(),
                &content,
                error_message(status, &content),
            ));
        }

        ResponseBody::decode(request.shape, bytes)
    }
}

impl HttpAdapter for ReqwestAdapter {
    fn send<'a>(
        &'a self,
        base_url: &'a str,
        request: HttpRequest,
    ) -> BoxFuture<'a, ChronofyResult<ResponseBody>> {
        Box::pin(self.execute(base_url, request))
    }

    fn last_response(&self) -> Option<HttpResponse> {
        self.last
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Builder for [`ReqwestAdapter`].
#[derive(Debug, Clone)]
pub struct ReqwestAdapterBuilder {
    timeout: Duration,
    user_agent: String,
}

impl Default for ReqwestAdapterBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(ReqwestAdapter::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("chronofy-rs/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ReqwestAdapterBuilder {
    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the user agent.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Builds the adapter.
    pub fn build(self) -> ChronofyResult<ReqwestAdapter> {
        let client = Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent)
            .build()
            .map_err(|e| {
                ChronofyError::adapter(format!("failed to create HTTP client: {}", e))
                    .with_source(e)
            })?;
        Ok(ReqwestAdapter::from_client(client))
    }
}

fn transport_error(e: reqwest::Error) -> ChronofyError {
    let message = if e.is_timeout() {
        "request timeout".to_string()
    } else if e.is_connect() {
        format!("connection failed: {}", e)
    } else {
        format!("request failed: {}", e)
    };
    ChronofyError::adapter(message).with_source(e)
}

fn error_message(status: StatusCode, content: &str) -> String {
    let excerpt: String = content.chars().take(ERROR_BODY_EXCERPT).collect();
    if excerpt.is_empty() {
        status.to_string()
    } else {
        format!("{}: {}", status, excerpt)
    }
}

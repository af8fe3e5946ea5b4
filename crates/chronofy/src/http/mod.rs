//! Transport adapter contract.
//!
//! The client never talks to an HTTP library directly. It hands an
//! [`HttpRequest`] and a base URL to an [`HttpAdapter`], which performs the
//! exchange, classifies failures into [`ChronofyError`] codes and decodes the
//! body into the requested [`ReturnShape`]. Adapters never retry; that is the
//! client's job.
//!
//! The base URL is passed with every call instead of being stored on the
//! adapter, so swapping to the OAuth endpoint for a token exchange leaves
//! nothing to restore afterwards:
//!
//! ```ignore
//! let body = adapter
//!     .with_base_url("https://api.cronofy.com/")
//!     .post("oauth/token", params, Vec::new(), ReturnShape::Json)
//!     .await?;
//! ```

mod reqwest_adapter;

#[cfg(test)]
pub(crate) mod mock;

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use serde_json::Value;

use crate::error::{ChronofyError, ChronofyResult};

pub use reqwest_adapter::{ReqwestAdapter, ReqwestAdapterBuilder};

/// `error` value the token endpoint uses to refuse a grant.
pub const INVALID_GRANT: &str = "invalid_grant";

/// A boxed future for object-safe async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Ordered string pairs, used for query/body parameters and headers.
pub type Params = Vec<(String, String)>;

/// The two verbs the upstream API needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Parameters are sent as the query string.
    Get,
    /// Parameters are sent as a form-encoded body.
    Post,
}

impl Method {
    /// Returns the HTTP method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a response body is decoded before being returned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ReturnShape {
    /// The body as text.
    String,
    /// The body parsed as JSON.
    #[default]
    Json,
    /// The raw body bytes.
    Stream,
}

/// A request handed to an [`HttpAdapter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// HTTP verb.
    pub method: Method,
    /// Resource path appended to the base URL, e.g. `calendars`.
    pub resource: String,
    /// Query parameters (GET) or form fields (POST).
    pub params: Params,
    /// Request headers.
    pub headers: Params,
    /// Decoding applied to the response body.
    pub shape: ReturnShape,
}

impl HttpRequest {
    /// Creates a request with no parameters or headers.
    pub fn new(method: Method, resource: impl Into<String>) -> Self {
        Self {
            method,
            resource: resource.into(),
            params: Vec::new(),
            headers: Vec::new(),
            shape: ReturnShape::default(),
        }
    }

    /// Creates a GET request.
    pub fn get(resource: impl Into<String>) -> Self {
        Self::new(Method::Get, resource)
    }

    /// Creates a POST request.
    pub fn post(resource: impl Into<String>) -> Self {
        Self::new(Method::Post, resource)
    }

    /// Appends a parameter.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    /// Appends several parameters, keeping their order.
    pub fn with_params(mut self, params: impl IntoIterator<Item = (String, String)>) -> Self {
        self.params.extend(params);
        self
    }

    /// Appends several headers, keeping their order.
    pub fn with_headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Sets the return shape.
    pub fn with_shape(mut self, shape: ReturnShape) -> Self {
        self.shape = shape;
        self
    }

    /// Sets a header, replacing any existing value with the same
    /// (case-insensitive) name.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .headers
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
        {
            Some(entry) => entry.1 = value,
            None => self.headers.push((name.to_string(), value)),
        }
    }

    /// Returns a header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Returns a parameter value by name.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value.as_str())
    }
}

/// A decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// [`ReturnShape::String`].
    Text(String),
    /// [`ReturnShape::Json`].
    Json(Value),
    /// [`ReturnShape::Stream`].
    Stream(Bytes),
}

impl ResponseBody {
    /// Decodes raw body bytes into the requested shape.
    ///
    /// An empty body decodes to JSON `null`.
    pub fn decode(shape: ReturnShape, bytes: Bytes) -> ChronofyResult<Self> {
        match shape {
            ReturnShape::String => Ok(Self::Text(String::from_utf8_lossy(&bytes).into_owned())),
            ReturnShape::Json if bytes.is_empty() => Ok(Self::Json(Value::Null)),
            ReturnShape::Json => serde_json::from_slice(&bytes).map(Self::Json).map_err(|e| {
                ChronofyError::invalid_response(format!("response is not valid JSON: {}", e))
                    .with_source(e)
            }),
            ReturnShape::Stream => Ok(Self::Stream(bytes)),
        }
    }

    /// Returns the body as JSON, parsing text bodies if needed.
    pub fn into_json(self) -> ChronofyResult<Value> {
        match self {
            Self::Json(value) => Ok(value),
            Self::Text(text) => serde_json::from_str(&text).map_err(|e| {
                ChronofyError::invalid_response(format!("response is not valid JSON: {}", e))
                    .with_source(e)
            }),
            Self::Stream(_) => Err(ChronofyError::invalid_response(
                "expected a JSON body but received a byte stream",
            )),
        }
    }

    /// Returns the body as text.
    pub fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Json(value) => value.to_string(),
            Self::Stream(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    /// Returns the raw bytes of a stream body.
    ///
    /// Fails with [`ErrorCode::FileResource`](crate::ErrorCode::FileResource)
    /// for any other shape.
    pub fn into_stream(self) -> ChronofyResult<Bytes> {
        match self {
            Self::Stream(bytes) => Ok(bytes),
            Self::Text(_) | Self::Json(_) => Err(ChronofyError::file_resource(
                "expected a byte stream body",
            )),
        }
    }
}

/// Snapshot of the most recently completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Response headers in received order.
    pub headers: Params,
    /// Body as text.
    pub content: String,
}

/// Performs HTTP exchanges on behalf of the client.
///
/// Implementations must:
/// - prefix `request.resource` with `base_url` verbatim
/// - send `params` as the query string for GET and as a form body for POST
/// - map 400/401/403 responses through [`classify_error_body`] and any other
///   non-2xx status to [`ErrorCode::Http`](crate::ErrorCode::Http)
/// - map transport faults to [`ErrorCode::Adapter`](crate::ErrorCode::Adapter)
/// - never retry
pub trait HttpAdapter: Send + Sync {
    /// Sends `request` against `base_url` and decodes the body.
    fn send<'a>(
        &'a self,
        base_url: &'a str,
        request: HttpRequest,
    ) -> BoxFuture<'a, ChronofyResult<ResponseBody>>;

    /// Returns the most recent completed exchange, if any.
    fn last_response(&self) -> Option<HttpResponse>;

    /// Status code of the most recent exchange.
    fn response_code(&self) -> ChronofyResult<u16> {
        self.last_response()
            .map(|r| r.status)
            .ok_or_else(no_exchange)
    }

    /// Headers of the most recent exchange.
    fn response_headers(&self) -> ChronofyResult<Params> {
        self.last_response()
            .map(|r| r.headers)
            .ok_or_else(no_exchange)
    }

    /// Body text of the most recent exchange.
    fn response_content(&self) -> ChronofyResult<String> {
        self.last_response()
            .map(|r| r.content)
            .ok_or_else(no_exchange)
    }
}

fn no_exchange() -> ChronofyError {
    ChronofyError::adapter("no request has completed yet")
}

impl dyn HttpAdapter {
    /// Binds a base URL for one or more calls.
    pub fn with_base_url<'a>(&'a self, base_url: &'a str) -> BoundAdapter<'a> {
        BoundAdapter {
            adapter: self,
            base_url,
        }
    }
}

/// An adapter paired with the base URL its calls go to.
#[derive(Clone, Copy)]
pub struct BoundAdapter<'a> {
    adapter: &'a dyn HttpAdapter,
    base_url: &'a str,
}

impl<'a> BoundAdapter<'a> {
    /// Returns the bound base URL.
    pub fn base_url(&self) -> &str {
        self.base_url
    }

    /// Issues a GET.
    pub async fn get(
        &self,
        resource: &str,
        params: Params,
        headers: Params,
        shape: ReturnShape,
    ) -> ChronofyResult<ResponseBody> {
        self.send(
            HttpRequest::get(resource)
                .with_params(params)
                .with_headers(headers)
                .with_shape(shape),
        )
        .await
    }

    /// Issues a POST.
    pub async fn post(
        &self,
        resource: &str,
        params: Params,
        headers: Params,
        shape: ReturnShape,
    ) -> ChronofyResult<ResponseBody> {
        self.send(
            HttpRequest::post(resource)
                .with_params(params)
                .with_headers(headers)
                .with_shape(shape),
        )
        .await
    }

    /// Sends a prepared request.
    pub async fn send(&self, request: HttpRequest) -> ChronofyResult<ResponseBody> {
        self.adapter.send(self.base_url, request).await
    }
}

/// Classifies a non-2xx response.
///
/// A 400/401/403 whose JSON body has an `error` field becomes
/// [`ErrorCode::InvalidGrant`](crate::ErrorCode::InvalidGrant) for
/// `invalid_grant` and [`ErrorCode::Unauthorized`](crate::ErrorCode::Unauthorized)
/// carrying the value otherwise. Everything else becomes
/// [`ErrorCode::Http`](crate::ErrorCode::Http) with `message`.
pub fn classify_error_body(status: u16, body: &str, message: impl Into<String>) -> ChronofyError {
    if matches!(status, 400 | 401 | 403) {
        if let Some(error) = error_field(body) {
            return match error.as_str() {
                INVALID_GRANT => ChronofyError::invalid_grant().with_status(status),
                _ => ChronofyError::unauthorized(error).with_status(status),
            };
        }
    }

    ChronofyError::http(status, message)
}

fn error_field(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("error")? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

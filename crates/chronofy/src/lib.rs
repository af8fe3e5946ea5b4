//! Async client for the Cronofy calendar API.
//!
//! - [`Chronofy`] - the client: authenticated GET/POST, token exchange and
//!   the calendar/event resources
//! - [`HttpAdapter`] - transport contract, with [`ReqwestAdapter`] as the
//!   default implementation
//! - [`TokenCache`] - token storage, with [`MemoryTokenCache`] and
//!   [`FileTokenCache`]
//! - [`ChronofyError`] - every failure, discriminated by [`ErrorCode`]
//!
//! # Authorization failures
//!
//! ```text
//!  request ──► adapter ──► 2xx ─────────────────────────────► body
//!                 │
//!                 ├─► other error ──────────────────────────► error
//!                 │
//!                 └─► unauthorized ──► cache.delete(key)
//!                                          │
//!                                          ├─► failed ──────► Cache error
//!                                          │
//!                          expired/invalid, refresh on, first attempt?
//!                                  │                 │
//!                                 yes                no ────► error
//!                                  │
//!                           authorize() ──► retry request once
//! ```
//!
//! # Example
//!
//! ```ignore
//! use chronofy::{Chronofy, ClientOptions, Credentials};
//!
//! let client = Chronofy::new(token, ClientOptions::default())?
//!     .with_credentials(Credentials::new(client_id, client_secret));
//! let calendars = client.get_calendars().await?;
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod resources;

pub use cache::{FileTokenCache, MemoryTokenCache, TokenCache};
pub use client::Chronofy;
pub use config::{ClientOptions, Credentials};
pub use error::{ChronofyError, ChronofyResult, ErrorCode};
pub use http::{
    BoxFuture, HttpAdapter, HttpRequest, HttpResponse, Method, Params, ReqwestAdapter,
    ResponseBody, ReturnShape,
};

pub use chronofy_core::EventRange;

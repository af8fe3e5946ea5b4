//! Shared plumbing for the chronofy crates: tracing setup and the time
//! helpers used to build calendar queries.

pub mod time;
pub mod tracing;

pub use time::{EventRange, ISO8601_FORMAT, format_iso8601, local_timezone};
pub use self::tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};

//! Calendar and event resources.

use chrono::{DateTime, FixedOffset};
use chronofy_core::{EventRange, local_timezone};
use serde_json::Value;
use tracing::debug;

use crate::client::Chronofy;
use crate::error::{ChronofyError, ChronofyResult};
use crate::http::Params;

/// Resource listing the account's calendars.
pub const CALENDARS: &str = "calendars";

/// Resource listing events.
pub const EVENTS: &str = "events";

impl Chronofy {
    /// Lists the calendars of the authenticated account.
    pub async fn get_calendars(&self) -> ChronofyResult<Value> {
        debug!("listing calendars");
        self.get_json(CALENDARS, Vec::new()).await
    }

    /// Fetches one calendar by ID.
    ///
    /// The ID is percent-encoded into the path. An empty ID fails with
    /// [`ErrorCode::InvalidArgument`](crate::ErrorCode::InvalidArgument)
    /// without sending anything.
    pub async fn get_calendar(&self, calendar_id: &str) -> ChronofyResult<Value> {
        if calendar_id.trim().is_empty() {
            return Err(ChronofyError::invalid_argument("calendar id must not be empty"));
        }

        debug!(calendar_id = %calendar_id, "fetching calendar");
        let resource = format!("{}/{}", CALENDARS, urlencoding::encode(calendar_id));
        self.get_json(&resource, Vec::new()).await
    }

    /// Lists events between `from` and `to`.
    ///
    /// `timezone` defaults to the local IANA zone. Unset bounds are left out
    /// of the request entirely.
    pub async fn get_events(
        &self,
        from: Option<DateTime<FixedOffset>>,
        to: Option<DateTime<FixedOffset>>,
        timezone: Option<&str>,
    ) -> ChronofyResult<Value> {
        self.get_events_in(&EventRange { from, to }, timezone).await
    }

    /// Lists events in `range`.
    pub async fn get_events_in(
        &self,
        range: &EventRange,
        timezone: Option<&str>,
    ) -> ChronofyResult<Value> {
        let params = events_params(range, timezone);
        debug!(params = ?params, "listing events");
        self.get_json(EVENTS, params).await
    }
}

/// Builds the query for an events listing: `tzid` first, then the bounds.
pub fn events_params(range: &EventRange, timezone: Option<&str>) -> Params {
    let tzid = match timezone.filter(|tz| !tz.is_empty()) {
        Some(tz) => tz.to_string(),
        None => local_timezone(),
    };

    let mut params = vec![("tzid".to_string(), tzid)];
    params.extend(range.query_params());
    params
}

//! Time helpers for calendar queries.
//!
//! The upstream API expects `from`/`to` bounds in the ISO-8601 form
//! `2024-01-01T00:00:00+0000` (basic offset, no colon) and a `tzid` naming an
//! IANA timezone. This module provides [`format_iso8601`], [`local_timezone`]
//! and [`EventRange`] for building those query parameters.

use chrono::{DateTime, Days, FixedOffset, Local, TimeZone};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// `strftime` pattern for the ISO-8601 form accepted by the events endpoint.
pub const ISO8601_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// Fallback timezone when the local zone cannot be determined.
pub const DEFAULT_TIMEZONE: &str = "UTC";

/// Formats a datetime as ISO-8601 with a `+hhmm` offset.
pub fn format_iso8601<Tz>(dt: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    dt.format(ISO8601_FORMAT).to_string()
}

/// Returns the IANA name of the process's local timezone.
///
/// Resolution order: the operating system zone, then a non-empty `TZ`
/// environment variable, then [`DEFAULT_TIMEZONE`].
pub fn local_timezone() -> String {
    match iana_time_zone::get_timezone() {
        Ok(tz) if !tz.is_empty() => tz,
        Ok(_) | Err(_) => {
            let fallback = std::env::var("TZ")
                .ok()
                .map(|tz| tz.trim_start_matches(':').to_string())
                .filter(|tz| !tz.is_empty())
                .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());
            debug!(timezone = %fallback, "system timezone unavailable, using fallback");
            fallback
        }
    }
}

/// Bounds for an events query.
///
/// Either bound may be absent; omitting both asks the upstream API for its
/// default (unbounded) range.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRange {
    /// Lower bound, sent as `from`.
    pub from: Option<DateTime<FixedOffset>>,
    /// Upper bound, sent as `to`.
    pub to: Option<DateTime<FixedOffset>>,
}

impl EventRange {
    /// A range with no bounds.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// A range with only a lower bound.
    pub fn starting<Tz: TimeZone>(from: DateTime<Tz>) -> Self {
        Self {
            from: Some(from.fixed_offset()),
            to: None,
        }
    }

    /// A range with only an upper bound.
    pub fn until<Tz: TimeZone>(to: DateTime<Tz>) -> Self {
        Self {
            from: None,
            to: Some(to.fixed_offset()),
        }
    }

    /// A range with both bounds.
    pub fn between<A: TimeZone, B: TimeZone>(from: DateTime<A>, to: DateTime<B>) -> Self {
        Self {
            from: Some(from.fixed_offset()),
            to: Some(to.fixed_offset()),
        }
    }

    /// Midnight of `now`'s day to midnight of the next day, in `now`'s zone.
    ///
    /// Falls back to `now` itself for a bound that does not exist locally
    /// (a DST gap at midnight).
    pub fn day_of<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        let tz = now.timezone();
        let today = now.date_naive();
        let midnight = |date: chrono::NaiveDate| {
            date.and_hms_opt(0, 0, 0)
                .and_then(|naive| tz.from_local_datetime(&naive).earliest())
                .unwrap_or_else(|| now.clone())
                .fixed_offset()
        };

        let start = midnight(today);
        let end = today
            .checked_add_days(Days::new(1))
            .map(midnight)
            .unwrap_or(start);

        Self {
            from: Some(start),
            to: Some(end),
        }
    }

    /// Today in the local timezone.
    pub fn today() -> Self {
        Self::day_of(&Local::now())
    }

    /// Returns true if neither bound is set.
    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// Query parameters for the bounds that are set, `from` first.
    pub fn query_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::with_capacity(2);
        if let Some(ref from) = self.from {
            params.push(("from".to_string(), format_iso8601(from)));
        }
        if let Some(ref to) = self.to {
            params.push(("to".to_string(), format_iso8601(to)));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn formats_with_basic_offset() {
        assert_eq!(
            format_iso8601(&utc(2024, 1, 1, 0)),
            "2024-01-01T00:00:00+0000"
        );

        let paris = FixedOffset::east_opt(3600).unwrap();
        let dt = paris.with_ymd_and_hms(2024, 6, 15, 9, 30, 5).unwrap();
        assert_eq!(format_iso8601(&dt), "2024-06-15T09:30:05+0100");

        let new_york = FixedOffset::west_opt(5 * 3600).unwrap();
        let dt = new_york.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap();
        assert_eq!(format_iso8601(&dt), "2024-12-31T23:59:59-0500");
    }

    #[test]
    fn local_timezone_is_never_empty() {
        assert!(!local_timezone().is_empty());
    }

    #[test]
    fn unbounded_range_has_no_params() {
        let range = EventRange::unbounded();
        assert!(range.is_unbounded());
        assert!(range.query_params().is_empty());
    }

    #[test]
    fn starting_range_only_sends_from() {
        let range = EventRange::starting(utc(2024, 1, 1, 0));
        insta::assert_debug_snapshot!(range.query_params(), @r#"
        [
            (
                "from",
                "2024-01-01T00:00:00+0000",
            ),
        ]
        "#);
    }

    #[test]
    fn until_range_only_sends_to() {
        let range = EventRange::until(utc(2024, 1, 2, 0));
        let params = range.query_params();
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].0, "to");
    }

    #[test]
    fn between_range_keeps_order() {
        let range = EventRange::between(utc(2024, 1, 1, 0), utc(2024, 1, 2, 0));
        let keys: Vec<_> = range.query_params().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["from", "to"]);
    }

    #[test]
    fn day_of_spans_midnight_to_midnight() {
        let range = EventRange::day_of(&utc(2024, 3, 15, 14));
        assert_eq!(range.from, Some(utc(2024, 3, 15, 0).fixed_offset()));
        assert_eq!(range.to, Some(utc(2024, 3, 16, 0).fixed_offset()));
    }

    #[test]
    fn day_of_keeps_source_offset() {
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        let now = tokyo.with_ymd_and_hms(2024, 3, 15, 1, 0, 0).unwrap();
        let range = EventRange::day_of(&now);
        let params = range.query_params();
        assert_eq!(params[0].1, "2024-03-15T00:00:00+0900");
        assert_eq!(params[1].1, "2024-03-16T00:00:00+0900");
    }

    #[test]
    fn today_is_bounded() {
        let range = EventRange::today();
        assert!(range.from.is_some());
        assert!(range.to.is_some());
        assert!(range.from < range.to);
    }
}

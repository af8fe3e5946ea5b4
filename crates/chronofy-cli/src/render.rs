//! Output rendering for API responses.
//!
//! Responses are passed through as `serde_json::Value`, so rendering reads
//! the fields it knows about and skips what is missing.

use serde_json::Value;

use crate::cli::OutputFormat;
use crate::error::CliResult;

/// Renders `value` as pretty JSON or via `text`.
pub fn render(
    format: OutputFormat,
    value: &Value,
    text: impl Fn(&Value) -> String,
) -> CliResult<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Text => Ok(text(value)),
    }
}

/// One line per calendar: ID, name and owning profile.
pub fn calendars(value: &Value) -> String {
    let Some(list) = value.get("calendars").and_then(Value::as_array) else {
        return "No calendars".to_string();
    };
    if list.is_empty() {
        return "No calendars".to_string();
    }

    list.iter().map(calendar_line).collect::<Vec<_>>().join("\n")
}

/// A single calendar, wrapped in `calendar` or bare.
pub fn calendar(value: &Value) -> String {
    calendar_line(value.get("calendar").unwrap_or(value))
}

fn calendar_line(calendar: &Value) -> String {
    let id = field(calendar, "calendar_id").unwrap_or("?");
    let name = field(calendar, "calendar_name").unwrap_or("(unnamed)");

    let mut line = format!("{}\t{}", id, name);
    if let Some(profile) = field(calendar, "profile_name") {
        line.push_str(&format!(" ({})", profile));
    }
    if calendar.get("calendar_readonly").and_then(Value::as_bool) == Some(true) {
        line.push_str(" [read-only]");
    }
    line
}

/// Events as blocks separated by blank lines; `limit` caps how many.
pub fn events(value: &Value, limit: Option<usize>) -> String {
    let list = value
        .get("events")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    if list.is_empty() {
        return "No events".to_string();
    }

    list.iter()
        .take(limit.unwrap_or(usize::MAX))
        .map(event_block)
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn event_block(event: &Value) -> String {
    let mut lines = vec![field(event, "summary").unwrap_or("(no title)").to_string()];

    match (time_field(event, "start"), time_field(event, "end")) {
        (Some(start), Some(end)) => lines.push(format!("  {} - {}", start, end)),
        (Some(start), None) => lines.push(format!("  {}", start)),
        _ => {}
    }

    if let Some(location) = event
        .get("location")
        .and_then(|l| l.get("description"))
        .and_then(Value::as_str)
        .filter(|l| !l.is_empty())
    {
        lines.push(format!("  at {}", location));
    }
    if let Some(calendar_id) = field(event, "calendar_id") {
        lines.push(format!("  calendar: {}", calendar_id));
    }

    lines.join("\n")
}

/// Event times are either a string or an object with `time` and `tzid`.
fn time_field<'a>(event: &'a Value, name: &str) -> Option<&'a str> {
    match event.get(name)? {
        Value::String(s) => Some(s.as_str()),
        Value::Object(obj) => obj.get("time").and_then(Value::as_str),
        _ => None,
    }
}

fn field<'a>(value: &'a Value, name: &str) -> Option<&'a str> {
    value
        .get(name)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

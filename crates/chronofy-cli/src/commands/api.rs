//! Commands that call the API.

use chrono::{DateTime, FixedOffset};
use chronofy::{Chronofy, EventRange};
use serde_json::json;
use tracing::info;

use crate::cli::OutputFormat;
use crate::error::CliResult;
use crate::render;

/// List calendars.
pub async fn calendars(client: &Chronofy, format: OutputFormat) -> CliResult<()> {
    let value = client.get_calendars().await?;
    println!("{}", render::render(format, &value, render::calendars)?);
    Ok(())
}

/// Show one calendar.
pub async fn calendar(client: &Chronofy, id: &str, format: OutputFormat) -> CliResult<()> {
    let value = client.get_calendar(id).await?;
    println!("{}", render::render(format, &value, render::calendar)?);
    Ok(())
}

/// List events. Without bounds, lists today.
pub async fn events(
    client: &Chronofy,
    from: Option<DateTime<FixedOffset>>,
    to: Option<DateTime<FixedOffset>>,
    tz: Option<&str>,
    all: bool,
    format: OutputFormat,
) -> CliResult<()> {
    let range = event_range(from, to);
    let value = client.get_events_in(&range, tz).await?;

    let limit = if all { None } else { Some(1) };
    println!(
        "{}",
        render::render(format, &value, |v| render::events(v, limit))?
    );
    Ok(())
}

/// Range for the events command: today unless a bound was given.
pub fn event_range(
    from: Option<DateTime<FixedOffset>>,
    to: Option<DateTime<FixedOffset>>,
) -> EventRange {
    if from.is_none() && to.is_none() {
        EventRange::today()
    } else {
        EventRange { from, to }
    }
}

/// Exchange the client credentials for a new access token.
pub async fn authorize(client: &Chronofy, format: OutputFormat) -> CliResult<()> {
    let token = client.authorize().await?;
    info!("obtained new access token");

    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&json!({ "access_token": token }))?
        ),
        OutputFormat::Text => println!("{}", token),
    }
    Ok(())
}

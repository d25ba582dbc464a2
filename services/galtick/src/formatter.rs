//! Human-readable rendering of tick values
//!
//! All functions are pure in `(tick, now)`; the local timezone is a parameter
//! in the `_in` variants so rendering can be tested deterministically.

use chrono::{DateTime, Local, TimeZone, Utc};

use crate::tick::Tick;

/// Shown wherever a tick could not be obtained
pub const UNABLE_TO_FETCH: &str = "Unable to fetch tick data.";

/// Assumed spacing between ticks for the next-tick estimate
pub const ESTIMATED_TICK_SPACING: chrono::TimeDelta = chrono::TimeDelta::hours(24);

const UTC_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";
const LOCAL_FORMAT: &str = "%Y-%m-%d %H:%M:%S %Z";

/// Display fields derived from a parsed tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickDisplay {
    pub utc: String,
    pub local: String,
    pub elapsed: String,
}

impl TickDisplay {
    pub fn render(&self) -> String {
        format!(
            "**Last Galaxy Tick:** {}\n**Last Galaxy Tick LOCAL:** {}\n**Time ago:** {}",
            self.utc, self.local, self.elapsed
        )
    }
}

/// Best-effort guess at the next tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextTickEstimate {
    pub last_utc: String,
    pub estimated_utc: String,
    pub time_until: String,
}

impl NextTickEstimate {
    pub fn render(&self) -> String {
        format!(
            "**Last Tick:** {}\n**Estimated Next Tick:** {}\n**Time Until:** {}\n\n*Note: This is an estimate. Actual tick time may vary.*",
            self.last_utc, self.estimated_utc, self.time_until
        )
    }
}

/// Whole hours and leftover minutes, both floored
fn split_hours_minutes(delta: chrono::TimeDelta) -> (i64, i64) {
    let seconds = delta.num_milliseconds().div_euclid(1000);
    (seconds.div_euclid(3600), seconds.rem_euclid(3600) / 60)
}

/// `"1h 30m ago"`, or `"45m ago"` when there is no whole positive hour
pub fn format_elapsed(delta: chrono::TimeDelta) -> String {
    let (hours, minutes) = split_hours_minutes(delta);
    if hours > 0 {
        format!("{}h {}m ago", hours, minutes)
    } else {
        format!("{}m ago", minutes)
    }
}

/// Parse and render a tick relative to `now` in the given local timezone
pub fn tick_display_in<Tz>(tick: &Tick, now: DateTime<Utc>, local: &Tz) -> crate::Result<TickDisplay>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let instant = tick.instant_utc()?;
    Ok(TickDisplay {
        utc: instant.format(UTC_FORMAT).to_string(),
        local: instant
            .with_timezone(local)
            .format(LOCAL_FORMAT)
            .to_string(),
        elapsed: format_elapsed(now - instant),
    })
}

/// Describe a tick for chat, never failing.
///
/// Unparseable ticks fall back to the raw value.
pub fn describe_tick_in<Tz>(tick: Option<&Tick>, now: DateTime<Utc>, local: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let Some(tick) = tick else {
        return UNABLE_TO_FETCH.to_string();
    };

    match tick_display_in(tick, now, local) {
        Ok(display) => display.render(),
        Err(e) => {
            tracing::warn!("Error formatting tick: {}", e);
            format!("**Last Galaxy Tick:** {}", tick)
        }
    }
}

/// [`describe_tick_in`] using the host timezone
pub fn describe_tick(tick: Option<&Tick>, now: DateTime<Utc>) -> String {
    describe_tick_in(tick, now, &Local)
}

/// Estimate the next tick as the last tick plus [`ESTIMATED_TICK_SPACING`].
///
/// The result may be negative once the estimate is in the past.
pub fn estimate_next_tick(tick: &Tick, now: DateTime<Utc>) -> crate::Result<NextTickEstimate> {
    let last = tick.instant_utc()?;
    let estimated = last + ESTIMATED_TICK_SPACING;
    let (hours, minutes) = split_hours_minutes(estimated - now);

    Ok(NextTickEstimate {
        last_utc: last.format(UTC_FORMAT).to_string(),
        estimated_utc: estimated.format(UTC_FORMAT).to_string(),
        time_until: format!("~{}h {}m", hours, minutes),
    })
}

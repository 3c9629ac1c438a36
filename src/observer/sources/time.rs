//! Time context source. Pure computation, no I/O.

use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc, Weekday};
use chrono_tz::Tz;

use crate::types::TimeOfDay;

/// Time classification of an instant in the user's timezone.
#[derive(Debug, Clone)]
pub struct TimeSnapshot {
    pub time_of_day: TimeOfDay,
    pub day_of_week: String,
    pub is_working_hours: bool,
}

/// Classify an instant: time-of-day band, weekday name, and whether the
/// user is inside configured working hours (weekdays only).
pub fn gather_time(
    now: DateTime<Utc>,
    tz: Tz,
    working_hours_start: u32,
    working_hours_end: u32,
) -> TimeSnapshot {
    let local = tz.from_utc_datetime(&now.naive_utc());
    let hour = local.hour();

    let is_weekday = !matches!(local.weekday(), Weekday::Sat | Weekday::Sun);
    let is_working_hours =
        is_weekday && working_hours_start <= hour && hour < working_hours_end;

    TimeSnapshot {
        time_of_day: TimeOfDay::from_hour(hour),
        day_of_week: weekday_name(local.weekday()).to_string(),
        is_working_hours,
    }
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

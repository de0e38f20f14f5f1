//! Fixed month and weekday orderings shared by filters and reports.

use chrono::Weekday;

/// Months a filter may select, in order. January is index 0, month number 1.
pub const FILTER_MONTHS: [&str; 6] = ["january", "february", "march", "april", "may", "june"];

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Weekdays in report order, Monday first.
pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Display name for a 1-based month number, `"Unknown"` outside 1..=12.
pub fn month_name(month: u32) -> &'static str {
    match month {
        1..=12 => MONTH_NAMES[(month - 1) as usize],
        _ => "Unknown",
    }
}

/// Full English name of a weekday.
pub fn weekday_name(day: Weekday) -> &'static str {
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

/// Parses a full weekday name, ignoring case and surrounding whitespace.
pub fn parse_weekday(name: &str) -> Option<Weekday> {
    let name = name.trim();
    WEEKDAYS
        .iter()
        .copied()
        .find(|d| weekday_name(*d).eq_ignore_ascii_case(name))
}

/// 1-based month number for a name in [`FILTER_MONTHS`].
pub fn parse_filter_month(name: &str) -> Option<u32> {
    let name = name.trim().to_lowercase();
    FILTER_MONTHS
        .iter()
        .position(|m| *m == name)
        .map(|i| i as u32 + 1)
}

pub fn is_weekend(day: Weekday) -> bool {
    matches!(day, Weekday::Sat | Weekday::Sun)
}

/// Formats an hour of day as `"17:00 (5PM)"`.
pub fn hour_label(hour: u32) -> String {
    let twelve = if hour % 12 == 0 { 12 } else { hour % 12 };
    let suffix = if hour < 12 { "AM" } else { "PM" };
    format!("{}:00 ({}{})", hour, twelve, suffix)
}

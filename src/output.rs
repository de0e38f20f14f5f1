//! Report rendering and export.
//!
//! Supports the plain-text report, pretty-printed JSON, and CSV export of
//! the filtered trips.

use anyhow::Result;
use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use serde::Serialize;
use std::fmt::Write as _;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

use crate::calendar;
use crate::filter::TripView;
use crate::model::Trip;
use crate::stats::report::SummaryReport;
use crate::stats::types::{Distribution, Group};

const RULE_WIDTH: usize = 50;
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Logs which groups a report could fill, one `name=status` pair per group.
pub fn log_summary(report: &SummaryReport) {
    debug!(
        city = %report.filters.city,
        matched = report.matched_records,
        total = report.total_records,
        groups = %status_line(report),
        "Report summary"
    );
}

fn status_line(report: &SummaryReport) -> String {
    report
        .group_status()
        .iter()
        .map(|(name, status)| format!("{}={}", name, status))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn to_json(report: &SummaryReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Writes the report as pretty-printed JSON to `path`.
pub fn write_json(path: &Path, report: &SummaryReport) -> Result<()> {
    std::fs::write(path, to_json(report)?)?;
    info!(path = %path.display(), "Report written");
    Ok(())
}

/// Header row of the trip export, in [`ExportRow`] field order.
const EXPORT_HEADERS: [&str; 14] = [
    "Start Time",
    "End Time",
    "Trip Duration",
    "Start Station",
    "End Station",
    "User Type",
    "Gender",
    "Birth Year",
    "month",
    "day_of_week",
    "hour",
    "date",
    "is_weekend",
    "route",
];

/// One exported trip: source columns followed by derived fields.
#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    start_time: String,
    end_time: Option<String>,
    trip_duration: Option<u64>,
    start_station: Option<&'a str>,
    end_station: Option<&'a str>,
    user_type: Option<&'a str>,
    gender: Option<&'a str>,
    birth_year: Option<i32>,
    month: u32,
    day_of_week: &'static str,
    hour: u32,
    date: String,
    is_weekend: bool,
    route: Option<String>,
}

impl<'a> From<&'a Trip> for ExportRow<'a> {
    fn from(t: &'a Trip) -> Self {
        let r = &t.record;
        Self {
            start_time: r.start_time.format(TIMESTAMP_FORMAT).to_string(),
            end_time: r.end_time.map(|e| e.format(TIMESTAMP_FORMAT).to_string()),
            trip_duration: r.trip_duration_seconds,
            start_station: r.start_station.as_deref(),
            end_station: r.end_station.as_deref(),
            user_type: r.user_type.as_deref(),
            gender: r.gender.as_deref(),
            birth_year: r.birth_year,
            month: t.derived.month,
            day_of_week: calendar::weekday_name(t.derived.weekday),
            hour: t.derived.hour,
            date: t.derived.date.to_string(),
            is_weekend: t.derived.is_weekend,
            route: r.route(),
        }
    }
}

/// Writes every trip in `view` to a new CSV file at `path`. The header row
/// is written even when the view is empty.
pub fn export_trips(path: &Path, view: &TripView<'_>) -> Result<usize> {
    let file = File::create(path)?;
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
    writer.write_record(EXPORT_HEADERS)?;

    for trip in view.iter() {
        writer.serialize(ExportRow::from(trip))?;
    }
    writer.flush()?;

    info!(path = %path.display(), rows = view.len(), "Filtered trips exported");
    Ok(view.len())
}

/// Timestamped export file name, e.g. `bikeshare_filtered_data_20240131_235959.csv`.
pub fn export_file_name(prefix: &str, extension: &str, now: DateTime<Utc>) -> String {
    format!("{}_{}.{}", prefix, now.format("%Y%m%d_%H%M%S"), extension)
}

/// Formats an integer with thousands separators.
pub fn thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Capitalizes each word: `"new york city"` becomes `"New York City"`.
pub fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn heading(out: &mut String, title: &str) {
    let _ = writeln!(out, "\n{}", title);
    let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));
}

fn footer(out: &mut String) {
    let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));
}

fn unavailable<T>(out: &mut String, what: &str, group: &Group<T>) {
    match group {
        Group::Unavailable { missing_column } => {
            let _ = writeln!(out, "{} not available ('{}' column missing)", what, missing_column);
        }
        _ => {
            let _ = writeln!(out, "{}: no data", what);
        }
    }
}

fn distribution(out: &mut String, d: &Distribution) {
    for c in &d.categories {
        let _ = writeln!(out, "   {}: {} ({:.1}%)", c.label, thousands(c.count), c.percentage);
    }
    if d.unspecified.count > 0 {
        let _ = writeln!(
            out,
            "   (unspecified): {} ({:.1}%)",
            thousands(d.unspecified.count),
            d.unspecified.percentage
        );
    }
}

/// Renders the report as the plain-text form shown by the CLI.
pub fn render_text(report: &SummaryReport) -> String {
    let mut out = String::new();
    let f = &report.filters;

    heading(&mut out, "DATA SUMMARY");
    let _ = writeln!(out, "City: {}", title_case(&f.city));
    let _ = writeln!(out, "Month filter: {}", f.month);
    let _ = writeln!(out, "Day filter: {}", f.day);
    if let Some(range) = f.hour_range {
        let _ = writeln!(out, "Hour range: {}", range);
    }

    if report.empty {
        let _ = writeln!(
            out,
            "No data for these filters ({} trips before filtering).",
            thousands(report.total_records)
        );
        footer(&mut out);
        return out;
    }

    if let Group::Available(o) = &report.overview {
        let _ = writeln!(
            out,
            "Total trips analyzed: {} (of {})",
            thousands(o.trips),
            thousands(report.total_records)
        );
        let _ = writeln!(out, "Date range: {} to {}", o.first_date, o.last_date);
        if let Some(n) = o.unique_start_stations {
            let _ = writeln!(out, "Unique start stations: {}", thousands(n));
        }
        if let Some(share) = o.subscriber_share {
            let _ = writeln!(out, "Subscriber rate: {:.1}%", share);
        }
        if o.dropped_rows > 0 {
            let _ = writeln!(out, "Rows skipped at load: {}", thousands(o.dropped_rows));
        }
    }
    footer(&mut out);

    heading(&mut out, "TIME PATTERN ANALYSIS");
    match &report.time {
        Group::Available(t) => {
            if let Some(m) = &t.popular_month {
                let _ = writeln!(out, "Most popular month: {} ({} trips)", m.name, thousands(m.count));
            }
            if let Some(d) = &t.popular_weekday {
                let _ = writeln!(out, "Most popular day: {} ({} trips)", d.name, thousands(d.count));
            }
            let _ = writeln!(
                out,
                "Peak hour: {} - {} trips",
                calendar::hour_label(t.peak_hour.hour),
                thousands(t.peak_hour.count)
            );
            let _ = writeln!(out, "Early morning trips (5-9 AM): {}", thousands(t.early_morning));
            let _ = writeln!(out, "Evening rush trips (5-7 PM): {}", thousands(t.evening_rush));
            let _ = writeln!(out, "Night trips (10 PM-5 AM): {}", thousands(t.night));
        }
        other => unavailable(&mut out, "Time data", other),
    }
    footer(&mut out);

    heading(&mut out, "STATION POPULARITY ANALYSIS");
    match &report.stations {
        Group::Available(s) => {
            if let Some(st) = &s.popular_start {
                let _ = writeln!(out, "Most popular start station: {}", st.name);
                let _ = writeln!(out, "   {} trips started here", thousands(st.count));
            }
            if let Some(en) = &s.popular_end {
                let _ = writeln!(out, "Most popular end station: {}", en.name);
                let _ = writeln!(out, "   {} trips ended here", thousands(en.count));
            }
            if let Some(rt) = &s.popular_route {
                let _ = writeln!(out, "Most popular route: {}", rt.name);
                let _ = writeln!(out, "   {} trips on this route", thousands(rt.count));
            }
            let _ = writeln!(out, "Total unique start stations: {}", thousands(s.unique_start));
            let _ = writeln!(out, "Total unique end stations: {}", thousands(s.unique_end));
        }
        other => unavailable(&mut out, "Station data", other),
    }
    footer(&mut out);

    heading(&mut out, "TRIP DURATION ANALYSIS");
    match &report.duration {
        Group::Available(d) => {
            let _ = writeln!(
                out,
                "Total travel time: {} ({:.0} seconds)",
                d.total.display, d.total.seconds
            );
            let _ = writeln!(out, "Average trip duration: {}", d.mean.display);
            let _ = writeln!(out, "Median trip duration: {}", d.median.display);
            let _ = writeln!(out, "Shortest trip: {}", d.min.display);
            let _ = writeln!(out, "Longest trip: {}", d.max.display);
            for (label, share) in [
                ("Short trips (<=10 min)", d.short),
                ("Medium trips (10-30 min)", d.medium),
                ("Long trips (>30 min)", d.long),
            ] {
                let _ = writeln!(out, "{}: {} ({:.1}%)", label, thousands(share.count), share.percentage);
            }
            if d.unknown.count > 0 {
                let _ = writeln!(
                    out,
                    "No duration recorded: {} ({:.1}%)",
                    thousands(d.unknown.count),
                    d.unknown.percentage
                );
            }
        }
        other => unavailable(&mut out, "Trip duration data", other),
    }
    footer(&mut out);

    heading(&mut out, "USER DEMOGRAPHICS ANALYSIS");
    match &report.demographics {
        Group::Available(d) => {
            match &d.user_types {
                Group::Available(dist) => {
                    let _ = writeln!(out, "User Type Distribution:");
                    distribution(&mut out, dist);
                }
                other => unavailable(&mut out, "User type data", other),
            }
            match &d.genders {
                Group::Available(dist) => {
                    let _ = writeln!(out, "Gender Distribution:");
                    distribution(&mut out, dist);
                }
                other => unavailable(&mut out, "Gender data", other),
            }
            match &d.birth_years {
                Group::Available(b) => {
                    let _ = writeln!(out, "Birth Year Statistics:");
                    let _ = writeln!(out, "   Earliest: {}", b.earliest);
                    let _ = writeln!(out, "   Most recent: {}", b.most_recent);
                    let _ = writeln!(out, "   Most common: {}", b.most_common);
                    let _ = writeln!(
                        out,
                        "   Average age (as of {}): {:.0} years",
                        b.reference_year, b.average_age
                    );
                    for (label, share) in [
                        ("Young (<=25)", b.young),
                        ("Adult (26-45)", b.adult),
                        ("Senior (>45)", b.senior),
                        ("Unknown", b.unknown),
                    ] {
                        let _ = writeln!(
                            out,
                            "   {}: {} ({:.1}%)",
                            label,
                            thousands(share.count),
                            share.percentage
                        );
                    }
                }
                other => unavailable(&mut out, "Birth year data", other),
            }
        }
        other => unavailable(&mut out, "Demographic data", other),
    }
    footer(&mut out);

    heading(&mut out, "USAGE PATTERN ANALYSIS");
    match &report.usage {
        Group::Available(u) => {
            let _ = writeln!(out, "Average daily trips: {:.0}", u.mean_daily_trips);
            let _ = writeln!(
                out,
                "Busiest day: {} ({} trips)",
                u.busiest_day.date,
                thousands(u.busiest_day.count)
            );
            let _ = writeln!(
                out,
                "Quietest day: {} ({} trips)",
                u.quietest_day.date,
                thousands(u.quietest_day.count)
            );
            let peaks: Vec<String> = u.peak_hours.iter().map(|h| format!("{}:00", h.hour)).collect();
            let _ = writeln!(out, "Top {} peak hours: {}", peaks.len(), peaks.join(", "));
            let _ = writeln!(
                out,
                "Weekend trips: {} ({:.1}%)",
                thousands(u.weekend.count),
                u.weekend.percentage
            );
            let _ = writeln!(
                out,
                "Weekday trips: {} ({:.1}%)",
                thousands(u.weekday.count),
                u.weekday.percentage
            );
            if let Group::Available(a) = &u.station_activity {
                let _ = writeln!(out, "Average trips per station: {:.1}", a.mean_trips_per_station);
                let _ = writeln!(
                    out,
                    "Most active station: {} ({} trips)",
                    a.most_active.name,
                    thousands(a.most_active.count)
                );
                let _ = writeln!(
                    out,
                    "Least active station: {} ({} trips)",
                    a.least_active.name,
                    thousands(a.least_active.count)
                );
            }
        }
        other => unavailable(&mut out, "Usage data", other),
    }
    footer(&mut out);

    out
}

use serde::Serialize;

use crate::filter::TripView;
use crate::model::{Column, ColumnSet};
use crate::stats::types::{Group, Share};
use crate::stats::utility::{mean, median, quantile};

/// Upper bound (inclusive) of a short trip, in seconds.
pub const SHORT_TRIP_MAX: u64 = 600;
/// Upper bound (inclusive) of a medium trip, in seconds.
pub const MEDIUM_TRIP_MAX: u64 = 1800;

/// A duration in seconds with its `Hh Mm Ss` rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationFigure {
    pub seconds: f64,
    pub display: String,
}

impl DurationFigure {
    pub fn new(seconds: f64) -> Self {
        Self {
            seconds,
            display: format_duration(seconds),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HourlyDuration {
    pub hour: u32,
    pub mean_minutes: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationStats {
    pub total: DurationFigure,
    pub mean: DurationFigure,
    pub median: DurationFigure,
    pub min: DurationFigure,
    pub max: DurationFigure,
    pub p95: DurationFigure,
    /// At most ten minutes.
    pub short: Share,
    /// Over ten, at most thirty minutes.
    pub medium: Share,
    /// Over thirty minutes.
    pub long: Share,
    /// Trips with no recorded duration.
    pub unknown: Share,
    /// Only hours that have trips with a duration.
    pub mean_by_hour: Vec<HourlyDuration>,
}

/// Renders whole seconds as `"1h 2m 3s"`, dropping leading zero units.
/// Fractions are truncated.
pub fn format_duration(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "N/A".to_string();
    }
    let total = seconds.trunc() as u64;
    let (hours, rest) = (total / 3600, total % 3600);
    let (minutes, secs) = (rest / 60, rest % 60);
    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

#[tracing::instrument(skip_all, fields(trips = view.len()))]
pub fn trip_duration(view: &TripView<'_>, columns: &ColumnSet) -> Group<DurationStats> {
    if !columns.has(Column::TripDuration) {
        return Group::missing(Column::TripDuration);
    }

    let total_trips = view.len();
    let mut values: Vec<u64> = Vec::with_capacity(total_trips);
    let mut by_hour: [Vec<f64>; 24] = std::array::from_fn(|_| Vec::new());

    for t in view.iter() {
        if let Some(d) = t.record.trip_duration_seconds {
            values.push(d);
            by_hour[t.derived.hour as usize].push(d as f64);
        }
    }

    if values.is_empty() {
        return Group::NoData;
    }

    values.sort_unstable();
    let sorted: Vec<f64> = values.iter().map(|v| *v as f64).collect();

    let short = values.iter().filter(|v| **v <= SHORT_TRIP_MAX).count();
    let medium = values
        .iter()
        .filter(|v| (SHORT_TRIP_MAX + 1..=MEDIUM_TRIP_MAX).contains(*v))
        .count();
    let long = values.iter().filter(|v| **v > MEDIUM_TRIP_MAX).count();

    let mean_by_hour = by_hour
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_empty())
        .map(|(hour, v)| HourlyDuration {
            hour: hour as u32,
            mean_minutes: mean(v) / 60.0,
        })
        .collect();

    Group::Available(DurationStats {
        total: DurationFigure::new(values.iter().sum::<u64>() as f64),
        mean: DurationFigure::new(mean(&sorted)),
        median: DurationFigure::new(median(&sorted)),
        min: DurationFigure::new(sorted[0]),
        max: DurationFigure::new(sorted[sorted.len() - 1]),
        p95: DurationFigure::new(quantile(&sorted, 0.95)),
        short: Share::of(short, total_trips),
        medium: Share::of(medium, total_trips),
        long: Share::of(long, total_trips),
        unknown: Share::of(total_trips - values.len(), total_trips),
        mean_by_hour,
    })
}

use chrono::NaiveDate;
use serde::Serialize;

use crate::calendar;
use crate::filter::TripView;
use crate::model::{Column, ColumnSet};
use crate::stats::types::{DateCount, Group, HourCount, NamedCount, Share};
use crate::stats::utility::Tally;

/// How many of the busiest hours are reported.
pub const PEAK_HOURS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationActivity {
    pub stations: usize,
    pub mean_trips_per_station: f64,
    pub most_active: NamedCount,
    pub least_active: NamedCount,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageStats {
    /// Calendar dates with at least one trip.
    pub active_days: usize,
    pub mean_daily_trips: f64,
    pub busiest_day: DateCount,
    pub quietest_day: DateCount,
    pub peak_hours: Vec<HourCount>,
    pub weekend: Share,
    pub weekday: Share,
    /// Months present in the view, in calendar order.
    pub trips_by_month: Vec<NamedCount>,
    pub station_activity: Group<StationActivity>,
}

#[tracing::instrument(skip_all, fields(trips = view.len()))]
pub fn usage_patterns(view: &TripView<'_>, columns: &ColumnSet) -> Group<UsageStats> {
    let total = view.len();

    let daily: Tally<NaiveDate> = view.iter().map(|t| t.derived.date).collect();
    let (Some((busy_date, busy_count)), Some((quiet_date, quiet_count))) =
        (daily.most_common(), daily.least_common())
    else {
        return Group::NoData;
    };

    let hours: Tally<u32> = view.iter().map(|t| t.derived.hour).collect();
    let months: Tally<u32> = view.iter().map(|t| t.derived.month).collect();
    let weekend = view.iter().filter(|t| t.derived.is_weekend).count();

    let station_activity = if columns.has(Column::StartStation) {
        station_activity(view)
    } else {
        Group::missing(Column::StartStation)
    };

    Group::Available(UsageStats {
        active_days: daily.distinct(),
        mean_daily_trips: daily.mean_count(),
        busiest_day: DateCount {
            date: busy_date,
            count: busy_count,
        },
        quietest_day: DateCount {
            date: quiet_date,
            count: quiet_count,
        },
        peak_hours: hours
            .top(PEAK_HOURS)
            .into_iter()
            .map(|(hour, count)| HourCount { hour, count })
            .collect(),
        weekend: Share::of(weekend, total),
        weekday: Share::of(total - weekend, total),
        trips_by_month: months
            .iter()
            .map(|(m, n)| NamedCount::new(calendar::month_name(*m), n))
            .collect(),
        station_activity,
    })
}

fn station_activity(view: &TripView<'_>) -> Group<StationActivity> {
    let per_station: Tally<&str> = view
        .iter()
        .filter_map(|t| t.record.start_station.as_deref())
        .collect();

    match (per_station.most_common(), per_station.least_common()) {
        (Some((most, most_n)), Some((least, least_n))) => Group::Available(StationActivity {
            stations: per_station.distinct(),
            mean_trips_per_station: per_station.mean_count(),
            most_active: NamedCount::new(most, most_n),
            least_active: NamedCount::new(least, least_n),
        }),
        _ => Group::NoData,
    }
}

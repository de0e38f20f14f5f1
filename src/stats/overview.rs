use chrono::NaiveDate;
use serde::Serialize;

use crate::filter::TripView;
use crate::model::{Column, ColumnSet};
use crate::stats::utility::{Tally, pct};
use crate::stats::types::Group;

/// Headline figures for the filtered trips.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub trips: usize,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    /// `None` when the city has no start station column.
    pub unique_start_stations: Option<usize>,
    /// Percentage of trips by subscribers, when user type is recorded.
    pub subscriber_share: Option<f64>,
    /// Rows dropped at ingestion for an unreadable start time.
    pub dropped_rows: usize,
}

#[tracing::instrument(skip_all, fields(trips = view.len()))]
pub fn overview(view: &TripView<'_>, columns: &ColumnSet) -> Group<Overview> {
    let (Some(first_date), Some(last_date)) = (
        view.iter().map(|t| t.derived.date).min(),
        view.iter().map(|t| t.derived.date).max(),
    ) else {
        return Group::NoData;
    };

    let unique_start_stations = columns.has(Column::StartStation).then(|| {
        view.iter()
            .filter_map(|t| t.record.start_station.as_deref())
            .collect::<Tally<&str>>()
            .distinct()
    });

    let subscriber_share = columns.has(Column::UserType).then(|| {
        let subscribers = view
            .iter()
            .filter(|t| t.record.user_type.as_deref() == Some("Subscriber"))
            .count();
        pct(subscribers, view.len())
    });

    Group::Available(Overview {
        trips: view.len(),
        first_date,
        last_date,
        unique_start_stations,
        subscriber_share,
        dropped_rows: view.dataset().dropped_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{FilterSpec, apply};
    use crate::model::{TripDataset, TripRecord};
    use chrono::NaiveDateTime;

    fn trip(start: &str, station: &str, user_type: &str) -> TripRecord {
        let mut r =
            TripRecord::new(NaiveDateTime::parse_from_str(start, "%Y-%m-%d %H:%M:%S").unwrap());
        r.start_station = Some(station.to_string());
        r.user_type = Some(user_type.to_string());
        r
    }

    #[test]
    fn test_overview() {
        let mut ds = TripDataset::new(
            "chicago",
            ColumnSet::all(),
            vec![
                trip("2017-03-05 10:00:00", "A", "Subscriber"),
                trip("2017-01-05 10:00:00", "B", "Customer"),
                trip("2017-02-05 10:00:00", "A", "Subscriber"),
                trip("2017-02-06 10:00:00", "C", "Subscriber"),
            ],
        );
        ds.dropped_rows = 2;
        let view = apply(&ds, &FilterSpec::unfiltered("chicago").unwrap());
        let group = overview(&view, &ds.columns);
        let o = group.available().unwrap();

        assert_eq!(o.trips, 4);
        assert_eq!(o.first_date, NaiveDate::from_ymd_opt(2017, 1, 5).unwrap());
        assert_eq!(o.last_date, NaiveDate::from_ymd_opt(2017, 3, 5).unwrap());
        assert_eq!(o.unique_start_stations, Some(3));
        assert_eq!(o.subscriber_share, Some(75.0));
        assert_eq!(o.dropped_rows, 2);
    }

    #[test]
    fn test_overview_without_optional_columns() {
        let columns = ColumnSet::new([Column::StartTime]);
        let ds = TripDataset::new("x", columns, vec![trip("2017-03-05 10:00:00", "A", "Subscriber")]);
        let view = apply(&ds, &FilterSpec::unfiltered("x").unwrap());
        let group = overview(&view, &ds.columns);
        let o = group.available().unwrap();
        assert_eq!(o.unique_start_stations, None);
        assert_eq!(o.subscriber_share, None);
    }
}

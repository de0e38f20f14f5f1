//! Assembly of the per-query summary report.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::filter::{FilterSpec, HourRange, TripView};
use crate::stats::demographics::{Demographics, demographics};
use crate::stats::duration::{DurationStats, trip_duration};
use crate::stats::overview::{Overview, overview};
use crate::stats::stations::{StationStats, station_popularity};
use crate::stats::time::{TimeStats, time_patterns};
use crate::stats::types::Group;
use crate::stats::usage::{UsageStats, usage_patterns};

/// The filters a report was computed with, in display form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterSummary {
    pub city: String,
    pub month: String,
    pub day: String,
    pub hour_range: Option<HourRange>,
}

impl From<&FilterSpec> for FilterSummary {
    fn from(spec: &FilterSpec) -> Self {
        Self {
            city: spec.city().to_string(),
            month: spec.month().to_string(),
            day: spec.weekday().to_string(),
            hour_range: spec.hour_range(),
        }
    }
}

/// Every statistic group for one filtered view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryReport {
    pub schema_version: u8,
    pub generated_at: DateTime<Utc>,
    pub filters: FilterSummary,
    /// Trips in the city's dataset before filtering.
    pub total_records: usize,
    pub matched_records: usize,
    /// True when no trip matched the filters.
    pub empty: bool,
    pub overview: Group<Overview>,
    pub time: Group<TimeStats>,
    pub stations: Group<StationStats>,
    pub duration: Group<DurationStats>,
    pub demographics: Group<Demographics>,
    pub usage: Group<UsageStats>,
}

impl SummaryReport {
    /// Computes all groups over `view`. An empty view yields a report with
    /// every group marked [`Group::NoData`].
    #[tracing::instrument(skip_all, fields(city = %spec.city(), matched = view.len()))]
    pub fn build(view: &TripView<'_>, spec: &FilterSpec, reference_year: i32) -> Self {
        let dataset = view.dataset();
        let mut report = SummaryReport {
            schema_version: 1,
            generated_at: Utc::now(),
            filters: FilterSummary::from(spec),
            total_records: dataset.len(),
            matched_records: view.len(),
            empty: view.is_empty(),
            overview: Group::NoData,
            time: Group::NoData,
            stations: Group::NoData,
            duration: Group::NoData,
            demographics: Group::NoData,
            usage: Group::NoData,
        };

        if report.empty {
            tracing::info!("No trips match the selected filters");
            return report;
        }

        let columns = &dataset.columns;
        report.overview = overview(view, columns);
        report.time = time_patterns(view, spec);
        report.stations = station_popularity(view, columns);
        report.duration = trip_duration(view, columns);
        report.demographics = demographics(view, columns, reference_year);
        report.usage = usage_patterns(view, columns);
        report
    }

    /// Groups by name, for renderers that list availability.
    pub fn group_status(&self) -> Vec<(&'static str, &'static str)> {
        fn status<T>(g: &Group<T>) -> &'static str {
            match g {
                Group::Available(_) => "available",
                Group::Unavailable { .. } => "unavailable",
                Group::NoData => "no_data",
            }
        }
        vec![
            ("overview", status(&self.overview)),
            ("time", status(&self.time)),
            ("stations", status(&self.stations)),
            ("duration", status(&self.duration)),
            ("demographics", status(&self.demographics)),
            ("usage", status(&self.usage)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::apply;
    use crate::model::{Column, ColumnSet, TripDataset, TripRecord};
    use chrono::NaiveDateTime;

    fn at(s: &str) -> TripRecord {
        TripRecord::new(NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap())
    }

    #[test]
    fn test_empty_view_marks_every_group_no_data() {
        let ds = TripDataset::new("chicago", ColumnSet::all(), vec![at("2017-01-02 08:00:00")]);
        let spec = FilterSpec::new("chicago", "june", "all").unwrap();
        let report = SummaryReport::build(&apply(&ds, &spec), &spec, 2024);

        assert!(report.empty);
        assert_eq!(report.total_records, 1);
        assert_eq!(report.matched_records, 0);
        assert!(report.group_status().iter().all(|(_, s)| *s == "no_data"));
    }

    #[test]
    fn test_missing_duration_column_is_reported_unavailable() {
        let columns = ColumnSet::new([Column::StartTime]);
        let ds = TripDataset::new("x", columns, vec![at("2017-01-02 08:00:00")]);
        let spec = FilterSpec::unfiltered("x").unwrap();
        let report = SummaryReport::build(&apply(&ds, &spec), &spec, 2024);

        assert!(!report.empty);
        assert!(report.time.is_available());
        assert_eq!(report.duration, Group::missing(Column::TripDuration));
        assert_eq!(report.stations, Group::missing(Column::StartStation));
    }

    #[test]
    fn test_filter_summary_display_names() {
        let spec = FilterSpec::new("new york city", "march", "friday").unwrap();
        let summary = FilterSummary::from(&spec);
        assert_eq!(summary.month, "March");
        assert_eq!(summary.day, "Friday");
        assert_eq!(summary.hour_range, None);
    }

    #[test]
    fn test_report_serializes_to_json() {
        let ds = TripDataset::new("chicago", ColumnSet::all(), vec![at("2017-01-02 08:00:00")]);
        let spec = FilterSpec::unfiltered("chicago").unwrap();
        let report = SummaryReport::build(&apply(&ds, &spec), &spec, 2024);
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["matched_records"], 1);
        assert_eq!(json["time"]["status"], "available");
        assert_eq!(json["time"]["data"]["peak_hour"]["hour"], 8);
        assert_eq!(json["duration"]["status"], "no_data");
    }
}

//! Trip records, their derived time fields, and the per-city dataset.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike, Weekday};
use serde::Serialize;

use crate::calendar;

/// Separator used when rendering a start/end station pair as a route.
pub const ROUTE_SEPARATOR: &str = " → ";

/// One row of a city's trip log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripRecord {
    pub start_time: NaiveDateTime,
    pub end_time: Option<NaiveDateTime>,
    pub trip_duration_seconds: Option<u64>,
    pub start_station: Option<String>,
    pub end_station: Option<String>,
    pub user_type: Option<String>,
    pub gender: Option<String>,
    pub birth_year: Option<i32>,
}

impl TripRecord {
    pub fn new(start_time: NaiveDateTime) -> Self {
        Self {
            start_time,
            end_time: None,
            trip_duration_seconds: None,
            start_station: None,
            end_station: None,
            user_type: None,
            gender: None,
            birth_year: None,
        }
    }

    /// `"<start> → <end>"`, when both stations are known.
    pub fn route(&self) -> Option<String> {
        match (&self.start_station, &self.end_station) {
            (Some(start), Some(end)) => Some(format!("{}{}{}", start, ROUTE_SEPARATOR, end)),
            _ => None,
        }
    }
}

/// Time features computed once from `start_time`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedFields {
    pub month: u32,
    pub weekday: Weekday,
    pub hour: u32,
    pub date: NaiveDate,
    pub is_weekend: bool,
}

impl DerivedFields {
    pub fn from_start(start: &NaiveDateTime) -> Self {
        let weekday = start.weekday();
        Self {
            month: start.month(),
            weekday,
            hour: start.hour(),
            date: start.date(),
            is_weekend: calendar::is_weekend(weekday),
        }
    }
}

/// A record together with its derived fields and its source row number.
#[derive(Debug, Clone, PartialEq)]
pub struct Trip {
    pub row: usize,
    pub record: TripRecord,
    pub derived: DerivedFields,
}

impl Trip {
    pub fn new(row: usize, record: TripRecord) -> Self {
        let derived = DerivedFields::from_start(&record.start_time);
        Self {
            row,
            record,
            derived,
        }
    }
}

/// Source columns whose presence varies by city.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    StartTime,
    EndTime,
    TripDuration,
    StartStation,
    EndStation,
    UserType,
    Gender,
    BirthYear,
}

impl Column {
    pub const ALL: [Column; 8] = [
        Column::StartTime,
        Column::EndTime,
        Column::TripDuration,
        Column::StartStation,
        Column::EndStation,
        Column::UserType,
        Column::Gender,
        Column::BirthYear,
    ];

    /// Header name as it appears in the source CSV.
    pub fn header(&self) -> &'static str {
        match self {
            Column::StartTime => "Start Time",
            Column::EndTime => "End Time",
            Column::TripDuration => "Trip Duration",
            Column::StartStation => "Start Station",
            Column::EndStation => "End Station",
            Column::UserType => "User Type",
            Column::Gender => "Gender",
            Column::BirthYear => "Birth Year",
        }
    }
}

/// Which columns a source carried, probed from its header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSet {
    present: Vec<Column>,
}

impl ColumnSet {
    pub fn new(columns: impl IntoIterator<Item = Column>) -> Self {
        let mut present = Vec::new();
        for c in columns {
            if !present.contains(&c) {
                present.push(c);
            }
        }
        Self { present }
    }

    /// Every known column.
    pub fn all() -> Self {
        Self::new(Column::ALL)
    }

    pub fn has(&self, column: Column) -> bool {
        self.present.contains(&column)
    }

    /// Returns the first of `required` that is absent.
    pub fn first_missing(&self, required: &[Column]) -> Option<Column> {
        required.iter().copied().find(|c| !self.has(*c))
    }
}

/// One city's ingested trips. Never mutated after ingestion.
#[derive(Debug, Clone, PartialEq)]
pub struct TripDataset {
    pub city: String,
    pub columns: ColumnSet,
    pub trips: Vec<Trip>,
    /// Rows dropped because their start time could not be parsed.
    pub dropped_rows: usize,
}

impl TripDataset {
    pub fn new(city: &str, columns: ColumnSet, records: Vec<TripRecord>) -> Self {
        let trips = records
            .into_iter()
            .enumerate()
            .map(|(row, record)| Trip::new(row, record))
            .collect();
        Self {
            city: city.to_string(),
            columns,
            trips,
            dropped_rows: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.trips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_derived_fields() {
        let d = DerivedFields::from_start(&at("2017-06-24 17:30:00"));
        assert_eq!(d.month, 6);
        assert_eq!(d.weekday, Weekday::Sat);
        assert_eq!(d.hour, 17);
        assert_eq!(d.date, NaiveDate::from_ymd_opt(2017, 6, 24).unwrap());
        assert!(d.is_weekend);
    }

    #[test]
    fn test_route_uses_arrow_glyph() {
        let mut r = TripRecord::new(at("2017-01-02 08:00:00"));
        assert_eq!(r.route(), None);
        r.start_station = Some("A".to_string());
        r.end_station = Some("B".to_string());
        assert_eq!(r.route().as_deref(), Some("A → B"));
    }

    #[test]
    fn test_column_set_first_missing() {
        let cols = ColumnSet::new([Column::StartTime, Column::StartStation]);
        assert!(cols.has(Column::StartStation));
        assert_eq!(
            cols.first_missing(&[Column::StartStation, Column::EndStation]),
            Some(Column::EndStation)
        );
        assert_eq!(cols.first_missing(&[Column::StartTime]), None);
    }

    #[test]
    fn test_dataset_assigns_rows() {
        let records = vec![
            TripRecord::new(at("2017-01-02 08:00:00")),
            TripRecord::new(at("2017-01-03 09:00:00")),
        ];
        let ds = TripDataset::new("chicago", ColumnSet::all(), records);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.trips[1].row, 1);
        assert_eq!(ds.trips[1].derived.weekday, Weekday::Tue);
    }
}

//! CSV ingestion for per-city trip logs.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord, Trim};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, SourceFile};
use crate::error::{AnalysisError, AnalysisResult};
use crate::model::{Column, ColumnSet, TripDataset, TripRecord};

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// Parses a timestamp in any of the layouts seen in trip logs. A bare date
/// is taken as midnight.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(value, f).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.naive_local())
        })
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(value, f).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Locates and parses `city`'s source under `data_dir`.
///
/// # Errors
///
/// Returns [`AnalysisError::DataSourceNotFound`] when the file is missing and
/// [`AnalysisError::MalformedSource`] when it has no `Start Time` column.
#[tracing::instrument(skip(catalog, data_dir), fields(data_dir = %data_dir.display()))]
pub fn load_city(catalog: &Catalog, data_dir: &Path, city: &str) -> AnalysisResult<TripDataset> {
    let source = catalog.locate(data_dir, city)?;
    let origin = source.path().display().to_string();
    let city = city.trim().to_lowercase();

    let file = BufReader::new(File::open(source.path())?);
    let dataset = match source {
        SourceFile::Plain(_) => parse_trips(&city, &origin, file)?,
        SourceFile::Gzip(_) => parse_trips(&city, &origin, GzDecoder::new(file))?,
    };

    info!(
        city = %dataset.city,
        trips = dataset.len(),
        dropped = dataset.dropped_rows,
        "Trip data loaded"
    );
    Ok(dataset)
}

/// Parses trip rows from CSV. `origin` names the input in errors.
///
/// Rows whose start time does not parse are dropped and counted. A source
/// with no bytes at all is an empty dataset.
pub fn parse_trips<R: Read>(city: &str, origin: &str, reader: R) -> AnalysisResult<TripDataset> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    if headers.is_empty() {
        debug!(origin, "Empty source");
        return Ok(TripDataset::new(city, ColumnSet::default(), Vec::new()));
    }

    let index = ColumnIndex::probe(&headers);
    let start_idx = index
        .get(Column::StartTime)
        .ok_or_else(|| AnalysisError::MalformedSource {
            origin: origin.to_string(),
            reason: "missing 'Start Time' column".to_string(),
        })?;

    let mut records = Vec::new();
    let mut dropped = 0usize;

    for result in rdr.records() {
        let row = result?;
        let Some(start_time) = row.get(start_idx).and_then(parse_timestamp) else {
            dropped += 1;
            continue;
        };

        let mut record = TripRecord::new(start_time);
        record.end_time = index.cell(&row, Column::EndTime).and_then(parse_timestamp);
        record.trip_duration_seconds = index
            .cell(&row, Column::TripDuration)
            .and_then(parse_non_negative)
            .map(|v| v.trunc() as u64);
        record.start_station = index.cell(&row, Column::StartStation).map(str::to_string);
        record.end_station = index.cell(&row, Column::EndStation).map(str::to_string);
        record.user_type = index.cell(&row, Column::UserType).map(str::to_string);
        record.gender = index.cell(&row, Column::Gender).map(str::to_string);
        record.birth_year = index
            .cell(&row, Column::BirthYear)
            .and_then(parse_non_negative)
            .map(|v| v.trunc() as i32);

        records.push(record);
    }

    if dropped > 0 {
        warn!(origin, dropped, "Dropped rows with unparseable start time");
    }

    let mut dataset = TripDataset::new(city, index.columns(), records);
    dataset.dropped_rows = dropped;
    Ok(dataset)
}

fn parse_non_negative(value: &str) -> Option<f64> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

/// Header positions of the known columns.
struct ColumnIndex {
    positions: Vec<(Column, usize)>,
}

impl ColumnIndex {
    fn probe(headers: &StringRecord) -> Self {
        let positions = Column::ALL
            .iter()
            .filter_map(|c| {
                headers
                    .iter()
                    .position(|h| h == c.header())
                    .map(|i| (*c, i))
            })
            .collect();
        Self { positions }
    }

    fn get(&self, column: Column) -> Option<usize> {
        self.positions
            .iter()
            .find(|(c, _)| *c == column)
            .map(|(_, i)| *i)
    }

    /// Non-blank cell for `column`.
    fn cell<'r>(&self, row: &'r StringRecord, column: Column) -> Option<&'r str> {
        self.get(column)
            .and_then(|i| row.get(i))
            .filter(|v| !v.is_empty())
    }

    fn columns(&self) -> ColumnSet {
        ColumnSet::new(self.positions.iter().map(|(c, _)| *c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    const CHICAGO: &str = "\
,Start Time,End Time,Trip Duration,Start Station,End Station,User Type,Gender,Birth Year
1423854,2017-06-23 15:09:32,2017-06-23 15:14:53,321,Wood St & Hubbard St,Damen Ave & Chicago Ave,Subscriber,Male,1992.0
955915,2017-05-25 18:19:03,2017-05-25 18:45:53,1610,Theater on the Lake,Sheffield Ave & Waveland Ave,Subscriber,Female,1992.0
9031,not a date,2017-01-04 08:34:45,416,May St & Taylor St,Wood St & Taylor St,Customer,,
";

    #[test]
    fn test_parse_timestamp_formats() {
        assert!(parse_timestamp("2017-01-01 09:07:57").is_some());
        assert!(parse_timestamp("2017-01-01 09:07:57.123").is_some());
        assert!(parse_timestamp("2017-01-01T09:07:57").is_some());
        assert!(parse_timestamp("2017-01-01T09:07:57Z").is_some());
        assert_eq!(parse_timestamp("1/1/2017 09:07").unwrap().hour(), 9);
        assert_eq!(
            parse_timestamp("2017-01-02"),
            NaiveDate::from_ymd_opt(2017, 1, 2).and_then(|d| d.and_hms_opt(0, 0, 0))
        );
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn test_parse_trips_drops_bad_start_times() {
        let ds = parse_trips("chicago", "test", CHICAGO.as_bytes()).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.dropped_rows, 1);
        assert!(ds.columns.has(Column::BirthYear));

        let first = &ds.trips[0].record;
        assert_eq!(first.trip_duration_seconds, Some(321));
        assert_eq!(first.start_station.as_deref(), Some("Wood St & Hubbard St"));
        assert_eq!(first.birth_year, Some(1992));
        assert!(first.end_time.is_some());
    }

    #[test]
    fn test_parse_trips_keeps_date_only_start_times() {
        let csv = "Start Time,Trip Duration\n2017-01-02,300\n2017-01-03 08:15:00,600\n";
        let ds = parse_trips("chicago", "test", csv.as_bytes()).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.dropped_rows, 0);
        assert_eq!(ds.trips[0].derived.hour, 0);
        assert_eq!(ds.trips[0].derived.weekday, chrono::Weekday::Mon);
    }

    #[test]
    fn test_parse_trips_probes_missing_columns() {
        let csv = "Start Time,End Time,Trip Duration,Start Station,End Station,User Type\n\
                   2017-03-04 10:00:00,2017-03-04 10:20:00,1205.43,A,B,Subscriber\n";
        let ds = parse_trips("washington", "test", csv.as_bytes()).unwrap();
        assert!(!ds.columns.has(Column::Gender));
        assert!(!ds.columns.has(Column::BirthYear));
        assert_eq!(ds.trips[0].record.trip_duration_seconds, Some(1205));
        assert_eq!(ds.trips[0].record.gender, None);
    }

    #[test]
    fn test_parse_trips_blank_cells_are_absent() {
        let csv = "Start Time,User Type,Gender\n2017-03-04 10:00:00,, \n";
        let ds = parse_trips("x", "test", csv.as_bytes()).unwrap();
        assert_eq!(ds.trips[0].record.user_type, None);
        assert_eq!(ds.trips[0].record.gender, None);
    }

    #[test]
    fn test_parse_trips_header_only_is_empty() {
        let ds = parse_trips("chicago", "test", "Start Time,Trip Duration\n".as_bytes()).unwrap();
        assert!(ds.is_empty());
        assert!(ds.columns.has(Column::TripDuration));
    }

    #[test]
    fn test_parse_trips_zero_bytes_is_empty() {
        let ds = parse_trips("chicago", "test", &b""[..]).unwrap();
        assert!(ds.is_empty());
    }

    #[test]
    fn test_parse_trips_requires_start_time() {
        let err = parse_trips("chicago", "test", "Trip Duration\n12\n".as_bytes()).unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedSource { .. }));
    }
}

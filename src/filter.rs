//! Filter selection and the filtered trip view.

use chrono::Weekday;
use serde::Serialize;
use std::fmt;

use crate::calendar::{self, FILTER_MONTHS};
use crate::error::{AnalysisError, AnalysisResult};
use crate::model::{DerivedFields, Trip, TripDataset};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthFilter {
    All,
    /// 1-based month number, January through June.
    Month(u32),
}

impl MonthFilter {
    pub fn parse(value: &str) -> AnalysisResult<Self> {
        let value = value.trim().to_lowercase();
        if value == "all" {
            return Ok(Self::All);
        }
        calendar::parse_filter_month(&value)
            .map(Self::Month)
            .ok_or_else(|| AnalysisError::invalid("month", value))
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

impl fmt::Display for MonthFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("All"),
            Self::Month(m) => f.write_str(calendar::month_name(*m)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeekdayFilter {
    All,
    Day(Weekday),
}

impl WeekdayFilter {
    pub fn parse(value: &str) -> AnalysisResult<Self> {
        let value = value.trim().to_lowercase();
        if value == "all" {
            return Ok(Self::All);
        }
        calendar::parse_weekday(&value)
            .map(Self::Day)
            .ok_or_else(|| AnalysisError::invalid("day", value))
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

impl fmt::Display for WeekdayFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("All"),
            Self::Day(d) => f.write_str(calendar::weekday_name(*d)),
        }
    }
}

/// Inclusive hour-of-day bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HourRange {
    pub low: u32,
    pub high: u32,
}

impl HourRange {
    pub fn new(low: u32, high: u32) -> AnalysisResult<Self> {
        if low > 23 || high > 23 || low > high {
            return Err(AnalysisError::invalid("hour range", format!("{}-{}", low, high)));
        }
        Ok(Self { low, high })
    }

    /// Parses `"7-19"`; a single hour `"8"` selects just that hour.
    pub fn parse(value: &str) -> AnalysisResult<Self> {
        let value = value.trim();
        let bad = || AnalysisError::invalid("hour range", value);
        let (low, high) = match value.split_once('-') {
            Some((l, h)) => (l.trim(), h.trim()),
            None => (value, value),
        };
        let low = low.parse().map_err(|_| bad())?;
        let high = high.parse().map_err(|_| bad())?;
        Self::new(low, high)
    }

    pub fn contains(&self, hour: u32) -> bool {
        (self.low..=self.high).contains(&hour)
    }
}

impl fmt::Display for HourRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:00-{}:59", self.low, self.high)
    }
}

/// The filter selection for one analysis run. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    city: String,
    month: MonthFilter,
    weekday: WeekdayFilter,
    hour_range: Option<HourRange>,
}

impl FilterSpec {
    /// Builds a filter from raw selections, normalizing to trimmed lower case.
    ///
    /// The city is only normalized here; it is checked against the catalog
    /// when its data is loaded.
    pub fn new(city: &str, month: &str, weekday: &str) -> AnalysisResult<Self> {
        let city = city.trim().to_lowercase();
        if city.is_empty() {
            return Err(AnalysisError::invalid("city", city));
        }
        Ok(Self {
            city,
            month: MonthFilter::parse(month)?,
            weekday: WeekdayFilter::parse(weekday)?,
            hour_range: None,
        })
    }

    /// Spec for `city` with every filter set to `all`.
    pub fn unfiltered(city: &str) -> AnalysisResult<Self> {
        Self::new(city, "all", "all")
    }

    pub fn with_hour_range(mut self, range: HourRange) -> Self {
        self.hour_range = Some(range);
        self
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn month(&self) -> MonthFilter {
        self.month
    }

    pub fn weekday(&self) -> WeekdayFilter {
        self.weekday
    }

    pub fn hour_range(&self) -> Option<HourRange> {
        self.hour_range
    }

    /// Whether a trip's derived fields satisfy every filter.
    pub fn matches(&self, d: &DerivedFields) -> bool {
        let month_ok = match self.month {
            MonthFilter::All => true,
            MonthFilter::Month(m) => d.month == m,
        };
        let day_ok = match self.weekday {
            WeekdayFilter::All => true,
            WeekdayFilter::Day(w) => d.weekday == w,
        };
        let hour_ok = self.hour_range.is_none_or(|r| r.contains(d.hour));
        month_ok && day_ok && hour_ok
    }
}

/// Months offered by selection front ends, `all` first.
pub fn month_options() -> Vec<&'static str> {
    std::iter::once("all").chain(FILTER_MONTHS).collect()
}

/// Weekdays offered by selection front ends, `all` first.
pub fn weekday_options() -> Vec<&'static str> {
    std::iter::once("all")
        .chain(calendar::WEEKDAYS.iter().map(|d| calendar::weekday_name(*d)))
        .collect()
}

/// A filtered, read-only view over a dataset, in source order.
#[derive(Debug, Clone)]
pub struct TripView<'a> {
    dataset: &'a TripDataset,
    trips: Vec<&'a Trip>,
}

impl<'a> TripView<'a> {
    /// View of every trip in `dataset`.
    pub fn all(dataset: &'a TripDataset) -> Self {
        Self {
            dataset,
            trips: dataset.trips.iter().collect(),
        }
    }

    /// Narrows this view further. Never touches the dataset.
    pub fn refine(&self, spec: &FilterSpec) -> TripView<'a> {
        TripView {
            dataset: self.dataset,
            trips: self
                .trips
                .iter()
                .copied()
                .filter(|t| spec.matches(&t.derived))
                .collect(),
        }
    }

    pub fn dataset(&self) -> &'a TripDataset {
        self.dataset
    }

    pub fn trips(&self) -> &[&'a Trip] {
        &self.trips
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Trip> + '_ {
        self.trips.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.trips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }

    /// Source row numbers of the trips in this view.
    pub fn rows(&self) -> Vec<usize> {
        self.trips.iter().map(|t| t.row).collect()
    }
}

/// Applies `spec` to `dataset`.
#[tracing::instrument(skip_all, fields(city = %dataset.city, month = %spec.month, day = %spec.weekday))]
pub fn apply<'a>(dataset: &'a TripDataset, spec: &FilterSpec) -> TripView<'a> {
    let view = TripView::all(dataset).refine(spec);
    tracing::debug!(kept = view.len(), total = dataset.len(), "Filters applied");
    view
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ColumnSet, TripRecord};
    use chrono::NaiveDateTime;

    fn dataset(starts: &[&str]) -> TripDataset {
        let records = starts
            .iter()
            .map(|s| TripRecord::new(NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()))
            .collect();
        TripDataset::new("chicago", ColumnSet::all(), records)
    }

    fn sample() -> TripDataset {
        dataset(&[
            "2017-01-02 08:00:00", // Monday, January
            "2017-01-09 08:30:00", // Monday, January
            "2017-01-03 17:00:00", // Tuesday, January
            "2017-02-06 23:15:00", // Monday, February
            "2017-06-25 05:00:00", // Sunday, June
        ])
    }

    #[test]
    fn test_spec_normalizes_input() {
        let spec = FilterSpec::new("  Chicago ", " JANUARY", "Monday ").unwrap();
        assert_eq!(spec.city(), "chicago");
        assert_eq!(spec.month(), MonthFilter::Month(1));
        assert_eq!(spec.weekday(), WeekdayFilter::Day(Weekday::Mon));
    }

    #[test]
    fn test_spec_rejects_out_of_catalog_month_and_day() {
        assert!(matches!(
            FilterSpec::new("chicago", "july", "all"),
            Err(AnalysisError::InvalidFilterSelection { field: "month", .. })
        ));
        assert!(matches!(
            FilterSpec::new("chicago", "all", "funday"),
            Err(AnalysisError::InvalidFilterSelection { field: "day", .. })
        ));
        assert!(FilterSpec::new("  ", "all", "all").is_err());
    }

    #[test]
    fn test_hour_range_parse() {
        assert_eq!(HourRange::parse("7-19").unwrap(), HourRange { low: 7, high: 19 });
        assert_eq!(HourRange::parse(" 8 ").unwrap(), HourRange { low: 8, high: 8 });
        assert!(HourRange::parse("19-7").is_err());
        assert!(HourRange::parse("0-24").is_err());
        assert!(HourRange::parse("x-3").is_err());
    }

    #[test]
    fn test_month_filter() {
        let ds = sample();
        let spec = FilterSpec::new("chicago", "february", "all").unwrap();
        assert_eq!(apply(&ds, &spec).rows(), vec![3]);
    }

    #[test]
    fn test_weekday_filter() {
        let ds = sample();
        let spec = FilterSpec::new("chicago", "all", "monday").unwrap();
        assert_eq!(apply(&ds, &spec).rows(), vec![0, 1, 3]);
    }

    #[test]
    fn test_hour_range_filter_is_inclusive() {
        let ds = sample();
        let spec = FilterSpec::unfiltered("chicago")
            .unwrap()
            .with_hour_range(HourRange::new(5, 8).unwrap());
        assert_eq!(apply(&ds, &spec).rows(), vec![0, 1, 4]);
    }

    #[test]
    fn test_all_is_noop() {
        let ds = sample();
        let spec = FilterSpec::unfiltered("chicago").unwrap();
        assert_eq!(apply(&ds, &spec).len(), ds.len());
    }

    #[test]
    fn test_filtering_is_idempotent() {
        let ds = sample();
        let spec = FilterSpec::new("chicago", "january", "monday").unwrap();
        let once = apply(&ds, &spec);
        let twice = once.refine(&spec);
        assert_eq!(once.rows(), twice.rows());
    }

    #[test]
    fn test_filter_order_does_not_matter() {
        let ds = sample();
        let by_month = FilterSpec::new("chicago", "january", "all").unwrap();
        let by_day = FilterSpec::new("chicago", "all", "monday").unwrap();
        let combined = FilterSpec::new("chicago", "january", "monday").unwrap();

        let a = apply(&ds, &by_month).refine(&by_day);
        let b = apply(&ds, &by_day).refine(&by_month);
        assert_eq!(a.rows(), b.rows());
        assert_eq!(a.rows(), apply(&ds, &combined).rows());
        assert_eq!(a.rows(), vec![0, 1]);
    }

    #[test]
    fn test_filtering_leaves_dataset_untouched() {
        let ds = sample();
        let before = ds.clone();
        let spec = FilterSpec::new("chicago", "june", "sunday").unwrap();
        let view = apply(&ds, &spec);
        assert_eq!(view.len(), 1);
        assert_eq!(ds, before);
    }

    #[test]
    fn test_options_lists() {
        assert_eq!(month_options().len(), 7);
        assert_eq!(weekday_options()[1], "Monday");
        assert_eq!(weekday_options()[7], "Sunday");
        assert_eq!(weekday_options().len(), 8);
        assert!(
            weekday_options()
                .iter()
                .all(|d| FilterSpec::new("chicago", "all", d).is_ok())
        );
    }
}

use serde::Serialize;

use crate::calendar::{self, WEEKDAYS};
use crate::filter::{FilterSpec, TripView};
use crate::stats::types::{Group, HourCount, NamedCount};
use crate::stats::utility::Tally;

/// When trips happen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeStats {
    /// Only reported when the month filter is `all`.
    pub popular_month: Option<NamedCount>,
    /// Only reported when the weekday filter is `all`.
    pub popular_weekday: Option<NamedCount>,
    pub peak_hour: HourCount,
    /// Hours 5 through 9.
    pub early_morning: usize,
    /// Hours 17 through 19.
    pub evening_rush: usize,
    /// Hour 22 or later, or 5 or earlier.
    pub night: usize,
    /// Trip count per hour of day, index = hour.
    pub trips_by_hour: Vec<usize>,
    /// Monday first.
    pub trips_by_weekday: Vec<NamedCount>,
    /// Row per hour of day, column per weekday (Monday first).
    pub heatmap: Vec<[usize; 7]>,
}

#[tracing::instrument(skip_all, fields(trips = view.len()))]
pub fn time_patterns(view: &TripView<'_>, spec: &FilterSpec) -> Group<TimeStats> {
    let mut months: Tally<u32> = Tally::default();
    let mut weekdays: Tally<u32> = Tally::default();
    let mut hours: Tally<u32> = Tally::default();
    let mut heatmap = vec![[0usize; 7]; 24];

    for t in view.iter() {
        let d = &t.derived;
        let day = d.weekday.num_days_from_monday();
        months.add(d.month);
        weekdays.add(day);
        hours.add(d.hour);
        heatmap[d.hour as usize][day as usize] += 1;
    }

    let Some((peak, peak_count)) = hours.most_common() else {
        return Group::NoData;
    };

    let popular_month = spec
        .month()
        .is_all()
        .then(|| months.most_common())
        .flatten()
        .map(|(m, n)| NamedCount::new(calendar::month_name(m), n));

    let popular_weekday = spec
        .weekday()
        .is_all()
        .then(|| weekdays.most_common())
        .flatten()
        .map(|(d, n)| NamedCount::new(calendar::weekday_name(WEEKDAYS[d as usize]), n));

    let in_hours = |range: std::ops::RangeInclusive<u32>| -> usize {
        range.map(|h| hours.get(&h)).sum()
    };

    Group::Available(TimeStats {
        popular_month,
        popular_weekday,
        peak_hour: HourCount {
            hour: peak,
            count: peak_count,
        },
        early_morning: in_hours(5..=9),
        evening_rush: in_hours(17..=19),
        night: in_hours(22..=23) + in_hours(0..=5),
        trips_by_hour: (0..24).map(|h| hours.get(&h)).collect(),
        trips_by_weekday: WEEKDAYS
            .iter()
            .map(|d| {
                let n = weekdays.get(&d.num_days_from_monday());
                NamedCount::new(calendar::weekday_name(*d), n)
            })
            .collect(),
        heatmap,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::apply;
    use crate::model::{ColumnSet, TripDataset, TripRecord};
    use chrono::NaiveDateTime;

    fn dataset(starts: &[&str]) -> TripDataset {
        let records = starts
            .iter()
            .map(|s| TripRecord::new(NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()))
            .collect();
        TripDataset::new("chicago", ColumnSet::all(), records)
    }

    #[test]
    fn test_monday_peak_hour_scenario() {
        // Monday 08:00, Monday 08:00, Tuesday 17:00
        let ds = dataset(&[
            "2017-01-02 08:10:00",
            "2017-01-09 08:40:00",
            "2017-01-03 17:05:00",
        ]);
        let spec = FilterSpec::new("chicago", "all", "monday").unwrap();
        let view = apply(&ds, &spec);
        assert_eq!(view.len(), 2);

        let stats = time_patterns(&view, &spec);
        let stats = stats.available().unwrap();
        assert_eq!(stats.peak_hour, HourCount { hour: 8, count: 2 });
        assert_eq!(stats.popular_weekday, None);
        assert_eq!(stats.popular_month, Some(NamedCount::new("January", 2)));
    }

    #[test]
    fn test_buckets_overlap_at_five() {
        let ds = dataset(&[
            "2017-01-02 05:00:00",
            "2017-01-02 09:59:00",
            "2017-01-02 18:00:00",
            "2017-01-02 23:00:00",
            "2017-01-02 12:00:00",
        ]);
        let spec = FilterSpec::unfiltered("chicago").unwrap();
        let view = apply(&ds, &spec);
        let group = time_patterns(&view, &spec);
        let stats = group.available().unwrap();

        assert_eq!(stats.early_morning, 2);
        assert_eq!(stats.evening_rush, 1);
        assert_eq!(stats.night, 2);
        assert_eq!(stats.trips_by_hour.iter().sum::<usize>(), 5);
        assert_eq!(stats.heatmap[12][0], 1);
    }

    #[test]
    fn test_ties_pick_earliest_value() {
        // one trip each on Tuesday (Jan) and Monday (Feb), hours 9 and 7
        let ds = dataset(&["2017-01-03 09:00:00", "2017-02-06 07:00:00"]);
        let spec = FilterSpec::unfiltered("chicago").unwrap();
        let view = apply(&ds, &spec);
        let group = time_patterns(&view, &spec);
        let stats = group.available().unwrap();

        assert_eq!(stats.peak_hour.hour, 7);
        assert_eq!(stats.popular_month.as_ref().unwrap().name, "January");
        assert_eq!(stats.popular_weekday.as_ref().unwrap().name, "Monday");
        assert_eq!(stats.trips_by_weekday[0], NamedCount::new("Monday", 1));
    }

    #[test]
    fn test_empty_view_has_no_data() {
        let ds = dataset(&[]);
        let spec = FilterSpec::unfiltered("chicago").unwrap();
        assert!(time_patterns(&apply(&ds, &spec), &spec).is_no_data());
    }
}

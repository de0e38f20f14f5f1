use serde::Serialize;

use crate::filter::TripView;
use crate::model::{Column, ColumnSet};
use crate::stats::types::{Distribution, Group, Share};
use crate::stats::utility::{Tally, mean};

/// Oldest age counted as young.
pub const YOUNG_MAX_AGE: i32 = 25;
/// Oldest age counted as adult.
pub const ADULT_MAX_AGE: i32 = 45;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BirthYearStats {
    pub earliest: i32,
    pub most_recent: i32,
    pub most_common: i32,
    pub reference_year: i32,
    pub average_age: f64,
    /// Age 25 or under.
    pub young: Share,
    /// Age 26 to 45.
    pub adult: Share,
    /// Over 45.
    pub senior: Share,
    /// No birth year recorded.
    pub unknown: Share,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Demographics {
    pub user_types: Group<Distribution>,
    pub genders: Group<Distribution>,
    pub birth_years: Group<BirthYearStats>,
}

#[tracing::instrument(skip_all, fields(trips = view.len(), reference_year = reference_year))]
pub fn demographics(
    view: &TripView<'_>,
    columns: &ColumnSet,
    reference_year: i32,
) -> Group<Demographics> {
    if view.is_empty() {
        return Group::NoData;
    }

    let total = view.len();

    let user_types = if columns.has(Column::UserType) {
        Group::Available(Distribution::from_values(
            view.iter().map(|t| t.record.user_type.as_deref()),
            total,
        ))
    } else {
        Group::missing(Column::UserType)
    };

    let genders = if columns.has(Column::Gender) {
        Group::Available(Distribution::from_values(
            view.iter().map(|t| t.record.gender.as_deref()),
            total,
        ))
    } else {
        Group::missing(Column::Gender)
    };

    let birth_years = if columns.has(Column::BirthYear) {
        birth_year_stats(view, reference_year)
    } else {
        Group::missing(Column::BirthYear)
    };

    Group::Available(Demographics {
        user_types,
        genders,
        birth_years,
    })
}

fn birth_year_stats(view: &TripView<'_>, reference_year: i32) -> Group<BirthYearStats> {
    let years: Vec<i32> = view.iter().filter_map(|t| t.record.birth_year).collect();
    let tally: Tally<i32> = years.iter().copied().collect();

    let (Some(earliest), Some(most_recent), Some((most_common, _))) = (
        years.iter().copied().min(),
        years.iter().copied().max(),
        tally.most_common(),
    ) else {
        return Group::NoData;
    };

    let total = view.len();
    let ages: Vec<i32> = years.iter().map(|y| reference_year - y).collect();
    let young = ages.iter().filter(|a| **a <= YOUNG_MAX_AGE).count();
    let adult = ages
        .iter()
        .filter(|a| (YOUNG_MAX_AGE + 1..=ADULT_MAX_AGE).contains(*a))
        .count();
    let senior = ages.iter().filter(|a| **a > ADULT_MAX_AGE).count();
    let ages_f: Vec<f64> = ages.iter().map(|a| *a as f64).collect();

    Group::Available(BirthYearStats {
        earliest,
        most_recent,
        most_common,
        reference_year,
        average_age: mean(&ages_f),
        young: Share::of(young, total),
        adult: Share::of(adult, total),
        senior: Share::of(senior, total),
        unknown: Share::of(total - years.len(), total),
    })
}

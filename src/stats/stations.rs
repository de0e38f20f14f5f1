use serde::Serialize;

use crate::filter::TripView;
use crate::model::{Column, ColumnSet};
use crate::stats::types::{Group, NamedCount};
use crate::stats::utility::Tally;

/// How many entries the top-N station and route lists carry.
pub const TOP_N: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationStats {
    pub popular_start: Option<NamedCount>,
    pub popular_end: Option<NamedCount>,
    /// Most frequent `"<start> → <end>"` pair.
    pub popular_route: Option<NamedCount>,
    pub unique_start: usize,
    pub unique_end: usize,
    pub top_start: Vec<NamedCount>,
    pub top_end: Vec<NamedCount>,
    pub top_routes: Vec<NamedCount>,
}

fn named(pair: (String, usize)) -> NamedCount {
    NamedCount::new(pair.0, pair.1)
}

fn top(tally: &Tally<String>) -> Vec<NamedCount> {
    tally.top(TOP_N).into_iter().map(named).collect()
}

#[tracing::instrument(skip_all, fields(trips = view.len()))]
pub fn station_popularity(view: &TripView<'_>, columns: &ColumnSet) -> Group<StationStats> {
    if let Some(missing) = columns.first_missing(&[Column::StartStation, Column::EndStation]) {
        return Group::missing(missing);
    }
    if view.is_empty() {
        return Group::NoData;
    }

    let mut starts: Tally<String> = Tally::default();
    let mut ends: Tally<String> = Tally::default();
    let mut routes: Tally<String> = Tally::default();

    for t in view.iter() {
        let r = &t.record;
        if let Some(s) = &r.start_station {
            starts.add(s.clone());
        }
        if let Some(e) = &r.end_station {
            ends.add(e.clone());
        }
        if let Some(route) = r.route() {
            routes.add(route);
        }
    }

    if starts.is_empty() && ends.is_empty() {
        return Group::NoData;
    }

    Group::Available(StationStats {
        popular_start: starts.most_common().map(named),
        popular_end: ends.most_common().map(named),
        popular_route: routes.most_common().map(named),
        unique_start: starts.distinct(),
        unique_end: ends.distinct(),
        top_start: top(&starts),
        top_end: top(&ends),
        top_routes: top(&routes),
    })
}

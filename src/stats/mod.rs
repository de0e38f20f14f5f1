//! Summary statistics over a filtered trip view.
//!
//! Each group is an independent, read-only reduction over the same view;
//! [`report::SummaryReport::build`] runs them all and records which groups
//! had no data or lacked a source column.

pub mod demographics;
pub mod duration;
pub mod overview;
pub mod report;
pub mod stations;
pub mod time;
pub mod types;
pub mod usage;
pub mod utility;

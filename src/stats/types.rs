//! Value types shared by the statistic groups.

use chrono::NaiveDate;
use serde::Serialize;

use crate::model::Column;
use crate::stats::utility::{Tally, pct};

/// Outcome of one statistic group.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum Group<T> {
    Available(T),
    /// A source column the group needs is absent for this city.
    Unavailable { missing_column: String },
    /// No trips, or no values, to summarize.
    NoData,
}

impl<T> Group<T> {
    pub fn missing(column: Column) -> Self {
        Group::Unavailable {
            missing_column: column.header().to_string(),
        }
    }

    pub fn available(&self) -> Option<&T> {
        match self {
            Group::Available(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Group::Available(_))
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, Group::NoData)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedCount {
    pub name: String,
    pub count: usize,
}

impl NamedCount {
    pub fn new(name: impl Into<String>, count: usize) -> Self {
        Self {
            name: name.into(),
            count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HourCount {
    pub hour: u32,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateCount {
    pub date: NaiveDate,
    pub count: usize,
}

/// A bucket's size and its percentage of the filtered trip count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Share {
    pub count: usize,
    pub percentage: f64,
}

impl Share {
    pub fn of(count: usize, total: usize) -> Self {
        Self {
            count,
            percentage: pct(count, total),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category {
    pub label: String,
    pub count: usize,
    pub percentage: f64,
}

/// Per-category counts, largest first. `unspecified` holds trips with no
/// value so that categories plus remainder cover the filtered total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Distribution {
    pub categories: Vec<Category>,
    pub unspecified: Share,
}

impl Distribution {
    pub fn from_values<'v>(values: impl IntoIterator<Item = Option<&'v str>>, total: usize) -> Self {
        let mut missing = 0usize;
        let tally: Tally<&str> = values
            .into_iter()
            .filter_map(|v| {
                if v.is_none() {
                    missing += 1;
                }
                v
            })
            .collect();

        let categories = tally
            .ranked()
            .into_iter()
            .map(|(label, count)| Category {
                label: label.to_string(),
                count,
                percentage: pct(count, total),
            })
            .collect();

        Self {
            categories,
            unspecified: Share::of(missing, total),
        }
    }

    pub fn get(&self, label: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.label == label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distribution_covers_total() {
        let values = [Some("Subscriber"), Some("Customer"), None, Some("Subscriber")];
        let d = Distribution::from_values(values, 4);

        assert_eq!(d.categories[0].label, "Subscriber");
        assert_eq!(d.categories[0].count, 2);
        assert_eq!(d.categories[0].percentage, 50.0);
        assert_eq!(d.get("Customer").unwrap().count, 1);
        assert_eq!(d.unspecified.count, 1);

        let sum: f64 = d.categories.iter().map(|c| c.percentage).sum::<f64>() + d.unspecified.percentage;
        assert!((sum - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_group_serializes_with_status_tag() {
        let g: Group<u32> = Group::missing(Column::Gender);
        let json = serde_json::to_value(&g).unwrap();
        assert_eq!(json["status"], "unavailable");
        assert_eq!(json["data"]["missing_column"], "Gender");

        let json = serde_json::to_value(Group::Available(3u32)).unwrap();
        assert_eq!(json["status"], "available");
        assert_eq!(json["data"], 3);

        let json = serde_json::to_value(Group::<u32>::NoData).unwrap();
        assert_eq!(json["status"], "no_data");
    }
}

//! Ordered view over a sub-task's dated records.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::warn;

use crate::error::{CoreError, Result};
use crate::Day;

/// Persisted and displayed date format.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` date string.
pub fn parse_date(s: &str) -> Result<Day> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).map_err(|_| CoreError::InvalidDate(s.to_string()))
}

/// Format a date as `YYYY-MM-DD`.
pub fn format_date(day: Day) -> String {
    day.format(DATE_FORMAT).to_string()
}

/// Clamp a cumulative value into `[0, total]`.
pub fn clamp_to_capacity(value: i64, total: u32) -> i64 {
    value.clamp(0, i64::from(total))
}

/// `part / whole` in percent, 0 when `whole` is not positive.
pub fn percent(part: i64, whole: i64) -> f64 {
    if whole > 0 {
        part as f64 / whole as f64 * 100.0
    } else {
        0.0
    }
}

/// Records sorted ascending by date, one value per date.
///
/// Keys that do not parse as dates are left out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timeline {
    points: Vec<(Day, i64)>,
}

impl Timeline {
    /// Build from the raw persisted record map.
    pub fn from_records(records: &BTreeMap<String, i64>) -> Self {
        let mut by_day = BTreeMap::new();
        for (key, value) in records {
            match parse_date(key) {
                Ok(day) => {
                    by_day.insert(day, *value);
                }
                Err(_) => warn!("Skipping record with unparseable date '{}'", key),
            }
        }
        Self {
            points: by_day.into_iter().collect(),
        }
    }

    /// True if there are no usable records.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of dated records.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Records in ascending date order.
    pub fn points(&self) -> &[(Day, i64)] {
        &self.points
    }

    /// Dates in ascending order.
    pub fn days(&self) -> impl Iterator<Item = Day> + '_ {
        self.points.iter().map(|(day, _)| *day)
    }

    /// Most recent record.
    pub fn latest(&self) -> Option<(Day, i64)> {
        self.points.last().copied()
    }

    /// Earliest record date.
    pub fn first_day(&self) -> Option<Day> {
        self.points.first().map(|(day, _)| *day)
    }

    /// Value of the latest record dated on or before `day`.
    pub fn value_at_or_before(&self, day: Day) -> Option<i64> {
        let idx = self.points.partition_point(|(d, _)| *d <= day);
        idx.checked_sub(1).map(|i| self.points[i].1)
    }

    /// Value of the latest record dated strictly before `day`.
    pub fn value_before(&self, day: Day) -> Option<i64> {
        let idx = self.points.partition_point(|(d, _)| *d < day);
        idx.checked_sub(1).map(|i| self.points[i].1)
    }

    /// Largest value among records dated on or before `day`.
    pub fn max_at_or_before(&self, day: Day) -> Option<i64> {
        self.points
            .iter()
            .take_while(|(d, _)| *d <= day)
            .map(|(_, v)| *v)
            .max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> Day {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn records(entries: &[(&str, i64)]) -> BTreeMap<String, i64> {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_unparseable_keys_are_skipped() {
        let tl = Timeline::from_records(&records(&[
            ("2024-01-02", 20),
            ("yesterday", 99),
            ("2024-01-01", 10),
        ]));
        assert_eq!(tl.len(), 2);
        assert_eq!(tl.first_day(), Some(day(2024, 1, 1)));
        assert_eq!(tl.latest(), Some((day(2024, 1, 2), 20)));
    }

    #[test]
    fn test_lookups_around_gaps() {
        let tl = Timeline::from_records(&records(&[
            ("2024-01-01", 10),
            ("2024-01-05", 30),
            ("2024-01-03", 50),
        ]));

        assert_eq!(tl.value_at_or_before(day(2023, 12, 31)), None);
        assert_eq!(tl.value_at_or_before(day(2024, 1, 4)), Some(50));
        assert_eq!(tl.value_at_or_before(day(2024, 1, 5)), Some(30));
        assert_eq!(tl.value_before(day(2024, 1, 5)), Some(50));
        assert_eq!(tl.value_before(day(2024, 1, 1)), None);
        assert_eq!(tl.max_at_or_before(day(2024, 1, 5)), Some(50));
        assert_eq!(tl.max_at_or_before(day(2024, 1, 2)), Some(10));
    }

    #[test]
    fn test_clamp_to_capacity() {
        assert_eq!(clamp_to_capacity(120, 100), 100);
        assert_eq!(clamp_to_capacity(-5, 100), 0);
        assert_eq!(clamp_to_capacity(42, 100), 42);
        assert_eq!(clamp_to_capacity(3, 0), 0);
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2024-02-29").unwrap(), day(2024, 2, 29));
        assert!(matches!(parse_date("2024/02/29"), Err(CoreError::InvalidDate(_))));
        assert_eq!(format_date(day(2024, 3, 7)), "2024-03-07");
    }
}

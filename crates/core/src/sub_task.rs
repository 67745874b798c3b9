//! Sub-task model - a capacity plus a dated history of cumulative progress.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::timeline::{clamp_to_capacity, format_date, parse_date, percent, Timeline};
use crate::Day;

fn default_total() -> u32 {
    100
}

/// A sub-task tracks cumulative progress against an operator-set total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubTask {
    name: String,

    #[serde(default = "default_total")]
    total: u32,

    /// Offset last used when registering a reading
    #[serde(default)]
    auto_offset: i64,

    /// Cumulative value per `YYYY-MM-DD` date
    #[serde(default)]
    records: BTreeMap<String, i64>,
}

impl SubTask {
    /// Create a sub-task with no records.
    pub fn new(name: impl Into<String>, total: u32) -> Self {
        Self {
            name: name.into(),
            total,
            auto_offset: 0,
            records: BTreeMap::new(),
        }
    }

    /// Sub-task name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the sub-task.
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Capacity of the sub-task.
    pub fn total(&self) -> u32 {
        self.total
    }

    /// Change the capacity. Existing records are kept as-is.
    pub fn set_total(&mut self, total: u32) {
        self.total = total;
    }

    /// Offset remembered from the last registration.
    pub fn auto_offset(&self) -> i64 {
        self.auto_offset
    }

    /// Set the remembered offset.
    pub fn set_auto_offset(&mut self, offset: i64) {
        self.auto_offset = offset;
    }

    /// Raw persisted records.
    pub fn records(&self) -> &BTreeMap<String, i64> {
        &self.records
    }

    /// Records ordered by date, unparseable keys left out.
    pub fn timeline(&self) -> Timeline {
        Timeline::from_records(&self.records)
    }

    /// Write the cumulative value for `day`, replacing any earlier value for it.
    pub fn add_record(&mut self, day: Day, value: i64) {
        self.records
            .retain(|key, _| parse_date(key).map_or(true, |d| d != day));
        self.records.insert(format_date(day), value);
    }

    /// Record `reading - offset` for `day` and remember `offset` for next time.
    ///
    /// Returns the stored value. Nothing changes if the difference overflows.
    pub fn register(&mut self, day: Day, reading: i64, offset: i64) -> Result<i64> {
        let value = reading
            .checked_sub(offset)
            .ok_or(CoreError::ValueOverflow { reading, offset })?;
        self.add_record(day, value);
        self.auto_offset = offset;
        Ok(value)
    }

    /// Value at the most recent record date, 0 without records.
    pub fn progress(&self) -> i64 {
        self.timeline().latest().map_or(0, |(_, value)| value)
    }

    /// Progress clamped into `[0, total]`.
    pub fn completed(&self) -> i64 {
        clamp_to_capacity(self.progress(), self.total)
    }

    /// Completed share of the total in percent, 0 when the total is 0.
    pub fn percentage(&self) -> f64 {
        percent(self.completed(), i64::from(self.total))
    }
}

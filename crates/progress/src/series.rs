//! Chart series generation.
//!
//! Every series of a chart is sampled on the same ascending set of record
//! dates. A sub-task without a record on a date carries its previous value
//! forward, so no series has gaps.

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveTime};
use serde::Serialize;
use tally_core::{clamp_to_capacity, percent, CoreError, Day, Task};
use tracing::debug;

/// Name of the aggregate series.
pub const TOTAL_SERIES: &str = "Total";

/// Chart presentation mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum ChartMode {
    /// Running completion percentage
    #[default]
    Cumulative,
    /// Per-step increase of the completion percentage, floored at 0
    Incremental,
}

impl ChartMode {
    /// Lower-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartMode::Cumulative => "cumulative",
            ChartMode::Incremental => "incremental",
        }
    }
}

impl fmt::Display for ChartMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cumulative" | "total" => Ok(ChartMode::Cumulative),
            "incremental" | "delta" => Ok(ChartMode::Incremental),
            other => Err(CoreError::UnknownChartMode(other.to_string())),
        }
    }
}

/// A single chart point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartPoint {
    /// UTC midnight of the date, in milliseconds since the epoch
    pub timestamp_ms: i64,
    /// Percentage (cumulative) or percentage points gained (incremental)
    pub value: f64,
}

impl ChartPoint {
    /// Data label with two decimals.
    pub fn label(&self) -> String {
        format!("{:.2}", self.value)
    }
}

/// A named line of the chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    /// Series name
    pub name: String,
    /// Points in ascending date order
    pub points: Vec<ChartPoint>,
}

/// Value axis hint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisRange {
    /// Lower bound
    pub min: f64,
    /// Upper bound
    pub max: f64,
    /// Number of ticks
    pub tick_count: u32,
}

/// Date axis domain shared by all series: earliest date to latest date + 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateDomain {
    /// First date
    pub start: Day,
    /// Day after the last date
    pub end: Day,
}

impl DateDomain {
    /// Domain bounds in epoch milliseconds.
    pub fn millis(&self) -> (i64, i64) {
        (epoch_millis(self.start), epoch_millis(self.end))
    }
}

/// Everything needed to draw a task's progress chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    /// Presentation mode
    pub mode: ChartMode,
    /// Aggregate series
    pub total: Series,
    /// One series per sub-task, in sub-task order
    pub sub_tasks: Vec<Series>,
    /// Date axis, `None` when the task has no records
    pub x_domain: Option<DateDomain>,
    /// Value axis
    pub y_axis: AxisRange,
}

impl Chart {
    /// The aggregate series followed by the sub-task series.
    pub fn series(&self) -> impl Iterator<Item = &Series> {
        std::iter::once(&self.total).chain(self.sub_tasks.iter())
    }
}

/// Builds chart series for a task.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeriesBuilder {
    mode: ChartMode,
}

impl SeriesBuilder {
    /// Create a builder for the given mode.
    pub fn new(mode: ChartMode) -> Self {
        Self { mode }
    }

    /// Build the chart for `task`.
    pub fn build(&self, task: &Task) -> Chart {
        let days: Vec<Day> = task.record_days().into_iter().collect();
        let timelines: Vec<_> = task
            .sub_tasks()
            .iter()
            .map(|st| (st.timeline(), st.total()))
            .collect();
        let task_total = task.total();

        // Cumulative percentages: row per date, total first.
        let rows: Vec<Vec<f64>> = days
            .iter()
            .map(|day| {
                let clamped: Vec<i64> = timelines
                    .iter()
                    .map(|(tl, total)| clamp_to_capacity(tl.value_at_or_before(*day).unwrap_or(0), *total))
                    .collect();
                let mut row = Vec::with_capacity(clamped.len() + 1);
                row.push(percent(clamped.iter().sum(), task_total));
                row.extend(
                    clamped
                        .iter()
                        .zip(&timelines)
                        .map(|(value, (_, total))| percent(*value, i64::from(*total))),
                );
                row
            })
            .collect();

        let (rows, y_axis) = match self.mode {
            ChartMode::Cumulative => (
                rows,
                AxisRange {
                    min: 0.0,
                    max: 100.0,
                    tick_count: 11,
                },
            ),
            ChartMode::Incremental => {
                let deltas = increments(&rows);
                let peak = deltas.iter().flatten().copied().fold(0.0, f64::max);
                let max = if peak > 0.0 { peak * 1.2 } else { 10.0 };
                (
                    deltas,
                    AxisRange {
                        min: 0.0,
                        max,
                        tick_count: 6,
                    },
                )
            }
        };

        let names = std::iter::once(TOTAL_SERIES).chain(task.sub_tasks().iter().map(|st| st.name()));
        let mut series: Vec<Series> = names
            .enumerate()
            .map(|(column, name)| Series {
                name: name.to_string(),
                points: days
                    .iter()
                    .zip(&rows)
                    .map(|(day, row)| ChartPoint {
                        timestamp_ms: epoch_millis(*day),
                        value: row[column],
                    })
                    .collect(),
            })
            .collect();

        let x_domain = match (days.first(), days.last()) {
            (Some(first), Some(last)) => Some(DateDomain {
                start: *first,
                end: *last + Duration::days(1),
            }),
            _ => None,
        };

        debug!(
            "Built {} chart for '{}': {} series over {} dates",
            self.mode,
            task.name(),
            series.len(),
            days.len()
        );

        let total = series.remove(0);
        Chart {
            mode: self.mode,
            total,
            sub_tasks: series,
            x_domain,
            y_axis,
        }
    }
}

/// Per-column increase over the previous row, the first row measured from 0.
fn increments(rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let mut previous: Option<&Vec<f64>> = None;
    rows.iter()
        .map(|row| {
            let deltas = row
                .iter()
                .enumerate()
                .map(|(i, value)| (value - previous.map_or(0.0, |p| p[i])).max(0.0))
                .collect();
            previous = Some(row);
            deltas
        })
        .collect()
}

fn epoch_millis(day: Day) -> i64 {
    day.and_time(NaiveTime::MIN).and_utc().timestamp_millis()
}

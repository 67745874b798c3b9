//! Completion time estimation.
//!
//! Two independent forecasts are offered and deliberately kept apart:
//!
//! - [`CompletionEstimator::remaining_days`] divides the change across the
//!   most recent snapshots by the number of snapshots in the window.
//! - [`CompletionEstimator::estimated_date`] divides the change over the last
//!   week by the elapsed calendar days.

use chrono::{Days, Duration};
use serde::Serialize;
use tally_core::{clamp_to_capacity, format_date, Day, Task, WindowSize};
use tracing::debug;

/// Placeholder shown when no completion date can be estimated.
pub const NOT_AVAILABLE: &str = "N/A";

/// Calendar days looked back by the completion date estimate.
const LOOKBACK_DAYS: i64 = 7;

/// Forward-filled aggregate completion of a task as of one record date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    /// Record date
    pub day: Day,
    /// Sum over sub-tasks of the latest clamped value on or before `day`
    pub value: i64,
}

/// One snapshot per distinct record date of the task, ascending.
pub fn snapshots(task: &Task) -> Vec<Snapshot> {
    let timelines: Vec<_> = task
        .sub_tasks()
        .iter()
        .map(|st| (st.timeline(), st.total()))
        .collect();

    task.record_days()
        .into_iter()
        .map(|day| Snapshot {
            day,
            value: timelines
                .iter()
                .map(|(tl, total)| clamp_to_capacity(tl.value_at_or_before(day).unwrap_or(0), *total))
                .sum(),
        })
        .collect()
}

/// Both forecasts for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Forecast {
    /// Windowed remaining days, 0 when there is no usable trend
    pub remaining_days: u32,
    /// Estimated completion date, `None` when not available
    pub estimated_date: Option<Day>,
}

impl Forecast {
    /// Estimated date as `YYYY-MM-DD`, or `N/A`.
    pub fn estimated_date_label(&self) -> String {
        self.estimated_date
            .map(format_date)
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }
}

/// Completion time estimator.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompletionEstimator {
    window: WindowSize,
}

impl CompletionEstimator {
    /// Create an estimator using the given remaining-days window.
    pub fn new(window: WindowSize) -> Self {
        Self { window }
    }

    /// Remaining-days window.
    pub fn window(&self) -> WindowSize {
        self.window
    }

    /// Compute both forecasts.
    pub fn forecast(&self, task: &Task, today: Day) -> Forecast {
        Forecast {
            remaining_days: self.remaining_days(task),
            estimated_date: self.estimated_date(task, today),
        }
    }

    /// Days left at the average per-snapshot increase over the window.
    ///
    /// Returns 0 with fewer than two snapshots, a non-positive trend, or
    /// nothing left to do.
    pub fn remaining_days(&self, task: &Task) -> u32 {
        let snaps = snapshots(task);
        if snaps.len() < 2 {
            return 0;
        }

        let window = &snaps[snaps.len() - self.window.get().min(snaps.len())..];
        let (oldest, newest) = match (window.first(), window.last()) {
            (Some(oldest), Some(newest)) => (oldest, newest),
            _ => return 0,
        };

        let average = (newest.value - oldest.value) as f64 / window.len() as f64;
        if average <= 0.0 {
            return 0;
        }

        let remaining = (task.total() - newest.value).max(0);
        if remaining == 0 {
            return 0;
        }

        let days = (remaining as f64 / average).round_ties_even().max(1.0);
        debug!(
            "Remaining days for '{}': {} left at {:.3}/snapshot over {} snapshots",
            task.name(),
            remaining,
            average,
            window.len()
        );
        days.min(u32::MAX as f64) as u32
    }

    /// Completion date at the average daily increase since the start of the
    /// last week (or the first record, if later).
    ///
    /// The starting completion is the largest raw value recorded on or before
    /// the start, not clamped to each sub-task's total, while the current
    /// completion is clamped.
    pub fn estimated_date(&self, task: &Task, today: Day) -> Option<Day> {
        if task.sub_tasks().is_empty() {
            return None;
        }

        let timelines: Vec<_> = task.sub_tasks().iter().map(|st| st.timeline()).collect();
        let earliest = timelines.iter().filter_map(|tl| tl.first_day()).min()?;
        let start = earliest.max(today - Duration::days(LOOKBACK_DAYS));

        let start_completion: i64 = timelines
            .iter()
            .map(|tl| tl.max_at_or_before(start).unwrap_or(0))
            .sum();
        let end_completion = task.completed();

        let days_span = (today - start).num_days();
        if days_span <= 0 {
            return None;
        }

        let average = (end_completion - start_completion) as f64 / days_span as f64;
        if average <= 0.0 {
            return None;
        }

        let remaining = (task.total() - end_completion).max(0);
        let days = (remaining as f64 / average).round_ties_even().max(1.0);
        debug!(
            "Estimated date for '{}': {:.3}/day since {}, {} days to go",
            task.name(),
            average,
            start,
            days
        );
        today.checked_add_days(Days::new(days as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tally_core::SubTask;

    fn day(d: u32) -> Day {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn task_with(subs: Vec<(u32, Vec<(u32, i64)>)>) -> Task {
        let mut task = Task::started_on("Task", day(1));
        for (i, (total, records)) in subs.into_iter().enumerate() {
            let mut st = SubTask::new(format!("sub-{}", i), total);
            for (d, v) in records {
                st.add_record(day(d), v);
            }
            task.add_sub_task(st);
        }
        task
    }

    fn window(n: u32) -> CompletionEstimator {
        CompletionEstimator::new(WindowSize::try_from(n).unwrap())
    }

    #[test]
    fn test_snapshots_forward_fill_and_clamp() {
        let task = task_with(vec![(50, vec![(1, 10), (3, 90)]), (50, vec![(2, 20)])]);
        let values: Vec<_> = snapshots(&task).iter().map(|s| (s.day, s.value)).collect();
        assert_eq!(values, vec![(day(1), 10), (day(2), 30), (day(3), 70)]);
    }

    #[test]
    fn test_remaining_days_example() {
        let task = task_with(vec![(100, vec![(1, 10), (2, 10), (3, 40)])]);
        assert_eq!(CompletionEstimator::default().remaining_days(&task), 6);
    }

    #[test]
    fn test_remaining_days_needs_two_dates() {
        let task = task_with(vec![(100, vec![(1, 10)]), (100, vec![(1, 30)])]);
        assert_eq!(window(5).remaining_days(&task), 0);
        assert_eq!(window(5).remaining_days(&task_with(vec![])), 0);
    }

    #[test]
    fn test_remaining_days_zero_without_positive_trend() {
        let flat = task_with(vec![(100, vec![(1, 20), (2, 20), (3, 20)])]);
        assert_eq!(window(5).remaining_days(&flat), 0);

        let declining = task_with(vec![(100, vec![(1, 40), (2, 30)])]);
        assert_eq!(window(5).remaining_days(&declining), 0);
    }

    #[test]
    fn test_remaining_days_zero_when_done() {
        let task = task_with(vec![(50, vec![(1, 10), (2, 50)]), (50, vec![(1, 20), (2, 50)])]);
        assert_eq!(task.percentage(), 100.0);
        assert_eq!(window(5).remaining_days(&task), 0);
    }

    #[test]
    fn test_remaining_days_window_size() {
        let task = task_with(vec![(100, vec![(1, 0), (2, 0), (3, 0), (4, 0), (5, 10), (6, 50)])]);
        // last five: (50 - 0) / 5 = 10 per snapshot
        assert_eq!(window(5).remaining_days(&task), 5);
        // last two: (50 - 10) / 2 = 20, 50 / 20 = 2.5 rounds to even
        assert_eq!(window(2).remaining_days(&task), 2);
        // whole history: 50 / 6 per snapshot
        assert_eq!(window(365).remaining_days(&task), 6);
        // a single snapshot never shows a trend
        assert_eq!(window(1).remaining_days(&task), 0);
    }

    #[test]
    fn test_remaining_days_is_at_least_one() {
        let task = task_with(vec![(100, vec![(1, 0), (2, 99)])]);
        assert_eq!(window(5).remaining_days(&task), 1);
    }

    #[test]
    fn test_estimated_date_uses_last_week() {
        let task = task_with(vec![(100, vec![(1, 10), (5, 40), (9, 60)])]);
        // start 01-03, from 10 to 60 over 7 days, 40 left
        assert_eq!(window(5).estimated_date(&task, day(10)), Some(day(16)));
    }

    #[test]
    fn test_estimated_date_starts_at_first_record() {
        let task = task_with(vec![(100, vec![(6, 20), (8, 50)])]);
        // from 20 to 50 over 4 days, 50 left, 6.67 days
        assert_eq!(window(5).estimated_date(&task, day(10)), Some(day(17)));
    }

    #[test]
    fn test_estimated_date_not_available() {
        assert_eq!(window(5).estimated_date(&task_with(vec![]), day(10)), None);
        assert_eq!(window(5).estimated_date(&task_with(vec![(100, vec![])]), day(10)), None);

        let same_day = task_with(vec![(100, vec![(10, 20)])]);
        assert_eq!(window(5).estimated_date(&same_day, day(10)), None);

        let flat = task_with(vec![(100, vec![(1, 20), (9, 20)])]);
        assert_eq!(window(5).estimated_date(&flat, day(10)), None);
    }

    #[test]
    fn test_estimated_date_start_is_unclamped() {
        // 80 recorded against a total of 50 before the window start
        let task = task_with(vec![(50, vec![(1, 80), (9, 50)])]);
        assert_eq!(window(5).estimated_date(&task, day(10)), None);
    }

    #[test]
    fn test_forecast_label() {
        let task = task_with(vec![(100, vec![(1, 10), (2, 10), (3, 40)])]);
        let forecast = window(5).forecast(&task, day(1));
        assert_eq!(forecast.remaining_days, 6);
        assert_eq!(forecast.estimated_date_label(), NOT_AVAILABLE);

        let forecast = window(5).forecast(&task, day(4));
        // from 10 to 40 over 3 days, 60 left
        assert_eq!(forecast.estimated_date_label(), "2024-01-10");
    }
}

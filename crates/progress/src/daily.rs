//! Daily change report.
//!
//! Compares each task's state as of the end of yesterday with its state as of
//! today and lists what moved.

use std::fmt;

use serde::Serialize;
use tally_core::{clamp_to_capacity, percent, Day, SubTask, Task};
use tracing::debug;

/// Percentage differences at or below this are treated as unchanged.
const PERCENT_EPSILON: f64 = 1e-6;

/// Text shown for an empty report.
pub const NO_UPDATES: &str = "No updates today";

/// Change of one sub-task.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubTaskChange {
    /// Sub-task name
    pub name: String,
    /// Raw increase, floored at 0
    pub change: i64,
    /// Clamped percentage before today
    pub before_pct: f64,
    /// Clamped percentage as of today
    pub after_pct: f64,
}

/// Change of one task and its reportable sub-tasks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskChange {
    /// Task name
    pub name: String,
    /// Change of the clamped aggregate, may be negative
    pub change: i64,
    /// Aggregate percentage before today
    pub before_pct: f64,
    /// Aggregate percentage as of today
    pub after_pct: f64,
    /// Sub-tasks that moved, in sub-task order
    pub sub_tasks: Vec<SubTaskChange>,
}

/// Report for one day, in task order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyReport {
    /// Reported day
    pub day: Day,
    /// Tasks that moved
    pub tasks: Vec<TaskChange>,
}

impl DailyReport {
    /// True when nothing moved.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Display lines: a summary line per task, its sub-tasks indented by four
    /// spaces, and a blank line between tasks.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for (i, task) in self.tasks.iter().enumerate() {
            if i > 0 {
                lines.push(String::new());
            }
            lines.push(format_line(&task.name, task.change, task.before_pct, task.after_pct));
            lines.extend(
                task.sub_tasks
                    .iter()
                    .map(|st| format!("    {}", format_line(&st.name, st.change, st.before_pct, st.after_pct))),
            );
        }
        lines
    }
}

impl fmt::Display for DailyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str(NO_UPDATES)
        } else {
            f.write_str(&self.lines().join("\n"))
        }
    }
}

fn format_line(name: &str, change: i64, before: f64, after: f64) -> String {
    format!("{} : {}, {:.2}% -> {:.2}%", name, change, before, after)
}

fn moved(change: i64, before_pct: f64, after_pct: f64) -> bool {
    change > 0 || (after_pct - before_pct).abs() > PERCENT_EPSILON
}

/// Prior and current values of a sub-task around `today`.
struct DayValues {
    prior: i64,
    current: i64,
}

impl DayValues {
    fn of(sub_task: &SubTask, today: Day) -> Self {
        let timeline = sub_task.timeline();
        let prior = timeline.value_before(today).unwrap_or(0);
        let current = timeline.value_at_or_before(today).unwrap_or(prior);
        Self { prior, current }
    }
}

/// Builds the daily change report.
#[derive(Debug, Clone, Copy, Default)]
pub struct DailyDiffReporter;

impl DailyDiffReporter {
    /// Report every task that moved on `today`.
    pub fn report(&self, tasks: &[Task], today: Day) -> DailyReport {
        let tasks: Vec<_> = tasks
            .iter()
            .filter_map(|task| self.task_change(task, today))
            .collect();
        debug!("Daily report for {}: {} tasks moved", today, tasks.len());
        DailyReport { day: today, tasks }
    }

    /// Change of a single task, `None` if it did not move.
    pub fn task_change(&self, task: &Task, today: Day) -> Option<TaskChange> {
        let mut total_before = 0;
        let mut total_after = 0;
        let mut sub_tasks = Vec::new();

        for st in task.sub_tasks() {
            let DayValues { prior, current } = DayValues::of(st, today);
            let before = clamp_to_capacity(prior, st.total());
            let after = clamp_to_capacity(current, st.total());
            total_before += before;
            total_after += after;

            let change = (current - prior).max(0);
            let before_pct = percent(before, i64::from(st.total()));
            let after_pct = percent(after, i64::from(st.total()));
            if moved(change, before_pct, after_pct) {
                sub_tasks.push(SubTaskChange {
                    name: st.name().to_string(),
                    change,
                    before_pct,
                    after_pct,
                });
            }
        }

        let denominator = if task.total() > 0 { task.total() } else { 1 };
        let change = total_after - total_before;
        let before_pct = total_before as f64 / denominator as f64 * 100.0;
        let after_pct = total_after as f64 / denominator as f64 * 100.0;

        if sub_tasks.is_empty() && !moved(change, before_pct, after_pct) {
            return None;
        }

        Some(TaskChange {
            name: task.name().to_string(),
            change,
            before_pct,
            after_pct,
            sub_tasks,
        })
    }
}

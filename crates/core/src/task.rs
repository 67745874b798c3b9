//! Task model - the top-level trackable unit owning an ordered list of sub-tasks.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::error::{CoreError, Result};
use crate::sub_task::SubTask;
use crate::timeline::{parse_date, percent};
use crate::Day;

/// Task status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum TaskStatus {
    /// Being worked on
    #[default]
    Active,
    /// Temporarily on hold
    Paused,
    /// Given up
    Abandoned,
}

impl TaskStatus {
    /// Persisted name.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Active => "Active",
            TaskStatus::Paused => "Paused",
            TaskStatus::Abandoned => "Abandoned",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "进行中" => return Ok(TaskStatus::Active),
            "暂停" => return Ok(TaskStatus::Paused),
            "废止" => return Ok(TaskStatus::Abandoned),
            _ => {}
        }
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(TaskStatus::Active),
            "paused" => Ok(TaskStatus::Paused),
            "abandoned" => Ok(TaskStatus::Abandoned),
            _ => Err(CoreError::UnknownStatus(s.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for TaskStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(raw.parse().unwrap_or_else(|_| {
            warn!("Unknown task status '{}', treating as Active", raw);
            TaskStatus::Active
        }))
    }
}

fn today() -> Day {
    chrono::Local::now().date_naive()
}

fn lenient_start_date<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Day, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    let parsed = raw.as_deref().map(parse_date);
    Ok(match parsed {
        Some(Ok(day)) => day,
        _ => {
            warn!("Invalid start date {:?}, using today", raw);
            today()
        }
    })
}

/// A task aggregates the progress of its sub-tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    name: String,

    #[serde(default)]
    status: TaskStatus,

    /// Set at creation, never changed afterwards
    #[serde(default = "today", deserialize_with = "lenient_start_date")]
    start_date: Day,

    /// Display and report order
    #[serde(default)]
    sub_tasks: Vec<SubTask>,
}

impl Task {
    /// Create an active task with no sub-tasks, started today.
    pub fn new(name: impl Into<String>) -> Self {
        Self::started_on(name, today())
    }

    /// Create an active task with no sub-tasks and an explicit start date.
    pub fn started_on(name: impl Into<String>, start_date: Day) -> Self {
        Self {
            name: name.into(),
            status: TaskStatus::Active,
            start_date,
            sub_tasks: Vec::new(),
        }
    }

    /// Task name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the task.
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Current status.
    pub fn status(&self) -> TaskStatus {
        self.status
    }

    /// Change the status.
    pub fn set_status(&mut self, status: TaskStatus) {
        self.status = status;
    }

    /// Creation date.
    pub fn start_date(&self) -> Day {
        self.start_date
    }

    /// Sub-tasks in insertion order.
    pub fn sub_tasks(&self) -> &[SubTask] {
        &self.sub_tasks
    }

    /// Append a sub-task.
    pub fn add_sub_task(&mut self, sub_task: SubTask) {
        self.sub_tasks.push(sub_task);
    }

    /// Remove the sub-task at `index`.
    pub fn remove_sub_task(&mut self, index: usize) -> Option<SubTask> {
        (index < self.sub_tasks.len()).then(|| self.sub_tasks.remove(index))
    }

    /// Remove the first sub-task called `name`.
    pub fn remove_sub_task_named(&mut self, name: &str) -> Result<SubTask> {
        let index = self
            .sub_tasks
            .iter()
            .position(|st| st.name() == name)
            .ok_or_else(|| CoreError::SubTaskNotFound(name.to_string()))?;
        Ok(self.sub_tasks.remove(index))
    }

    /// First sub-task called `name`.
    pub fn sub_task(&self, name: &str) -> Option<&SubTask> {
        self.sub_tasks.iter().find(|st| st.name() == name)
    }

    /// Mutable access to the first sub-task called `name`.
    pub fn sub_task_mut(&mut self, name: &str) -> Option<&mut SubTask> {
        self.sub_tasks.iter_mut().find(|st| st.name() == name)
    }

    /// Sum of sub-task totals.
    pub fn total(&self) -> i64 {
        self.sub_tasks.iter().map(|st| i64::from(st.total())).sum()
    }

    /// Sum of clamped sub-task progress.
    pub fn completed(&self) -> i64 {
        self.sub_tasks.iter().map(SubTask::completed).sum()
    }

    /// Completed share of the total in percent, 0 when the total is 0.
    pub fn percentage(&self) -> f64 {
        percent(self.completed(), self.total())
    }

    /// Every distinct record date across all sub-tasks, ascending.
    pub fn record_days(&self) -> BTreeSet<Day> {
        self.sub_tasks
            .iter()
            .flat_map(|st| st.timeline().days().collect::<Vec<_>>())
            .collect()
    }
}

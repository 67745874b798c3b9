//! Progress tracking service.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tally_core::{Day, Task, TaskStatus, WindowSize};
use tally_storage::{Result, Storage};
use tracing::debug;

use crate::estimator::{CompletionEstimator, Forecast};

/// Progress tracking service.
#[async_trait]
pub trait ProgressTracker: Send + Sync {
    /// Get the overview of the first task called `name`.
    async fn get_task_progress(&self, name: &str) -> Result<Option<TaskOverview>>;

    /// Take a progress snapshot of every task.
    async fn snapshot(&self) -> Result<ProgressSnapshot>;
}

/// Values shown on a task card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskOverview {
    /// Task name
    pub name: String,

    /// Task status
    pub status: TaskStatus,

    /// Sum of sub-task totals
    pub total: i64,

    /// Sum of clamped sub-task progress
    pub completed: i64,

    /// Percentage complete (0-100)
    pub percentage: f64,

    /// Both completion forecasts
    pub forecast: Forecast,
}

impl TaskOverview {
    /// Compute the overview of `task`.
    pub fn compute(task: &Task, estimator: &CompletionEstimator, today: Day) -> Self {
        Self {
            name: task.name().to_string(),
            status: task.status(),
            total: task.total(),
            completed: task.completed(),
            percentage: task.percentage(),
            forecast: estimator.forecast(task, today),
        }
    }
}

/// A snapshot of progress at a point in time.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressSnapshot {
    /// When snapshot was taken
    pub timestamp: DateTime<Utc>,

    /// Day the forecasts were computed for
    pub today: Day,

    /// Remaining-days window in effect
    pub window: WindowSize,

    /// Task overviews in list order
    pub tasks: Vec<TaskOverview>,
}

/// Basic progress tracker implementation.
///
/// Tasks and settings are reloaded on every call, so a changed window or a
/// new record is always reflected.
pub struct BasicProgressTracker<S: Storage> {
    storage: Arc<S>,
    today: Option<Day>,
}

impl<S: Storage> BasicProgressTracker<S> {
    /// Create a new progress tracker.
    pub fn new(storage: S) -> Self {
        Self {
            storage: Arc::new(storage),
            today: None,
        }
    }

    /// Compute forecasts for a fixed day instead of the local date.
    pub fn with_today(mut self, today: Day) -> Self {
        self.today = Some(today);
        self
    }

    fn today(&self) -> Day {
        self.today
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    async fn estimator(&self) -> Result<CompletionEstimator> {
        let settings = self.storage.load_settings().await?;
        Ok(CompletionEstimator::new(settings.recent_x))
    }
}

#[async_trait]
impl<S: Storage + 'static> ProgressTracker for BasicProgressTracker<S> {
    async fn get_task_progress(&self, name: &str) -> Result<Option<TaskOverview>> {
        let tasks = self.storage.load_tasks().await?;
        let Some(task) = tasks.iter().find(|t| t.name() == name) else {
            return Ok(None);
        };
        let estimator = self.estimator().await?;
        Ok(Some(TaskOverview::compute(task, &estimator, self.today())))
    }

    async fn snapshot(&self) -> Result<ProgressSnapshot> {
        let tasks = self.storage.load_tasks().await?;
        let estimator = self.estimator().await?;
        let today = self.today();

        let overviews: Vec<_> = tasks
            .iter()
            .map(|task| TaskOverview::compute(task, &estimator, today))
            .collect();
        debug!("Snapshot of {} tasks with window {}", overviews.len(), estimator.window());

        Ok(ProgressSnapshot {
            timestamp: Utc::now(),
            today,
            window: estimator.window(),
            tasks: overviews,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tally_core::{Settings, SubTask};
    use tokio::sync::Mutex;

    struct MockStorage {
        tasks: Mutex<Vec<Task>>,
        settings: Mutex<Settings>,
    }

    impl MockStorage {
        fn with(tasks: Vec<Task>, window: u32) -> Self {
            Self {
                tasks: Mutex::new(tasks),
                settings: Mutex::new(Settings {
                    recent_x: WindowSize::try_from(window).unwrap(),
                }),
            }
        }
    }

    #[async_trait]
    impl Storage for MockStorage {
        async fn load_tasks(&self) -> Result<Vec<Task>> { Ok(self.tasks.lock().await.clone()) }
        async fn save_tasks(&mut self, tasks: &[Task]) -> Result<()> {
            *self.tasks.lock().await = tasks.to_vec();
            Ok(())
        }
        async fn load_settings(&self) -> Result<Settings> { Ok(*self.settings.lock().await) }
        async fn save_settings(&mut self, settings: &Settings) -> Result<()> {
            *self.settings.lock().await = *settings;
            Ok(())
        }
    }

    fn day(d: u32) -> Day {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn tracked_task() -> Task {
        let mut task = Task::started_on("Course", day(1));
        let mut st = SubTask::new("Lectures", 100);
        for (d, v) in [(1, 0), (2, 0), (3, 0), (4, 0), (5, 10), (6, 50)] {
            st.add_record(day(d), v);
        }
        task.add_sub_task(st);
        task
    }

    #[tokio::test]
    async fn test_snapshot_uses_stored_window() {
        let tracker = BasicProgressTracker::new(MockStorage::with(vec![tracked_task()], 5)).with_today(day(6));
        let snapshot = tracker.snapshot().await.unwrap();
        assert_eq!(snapshot.window.get(), 5);
        assert_eq!(snapshot.tasks.len(), 1);
        assert_eq!(snapshot.tasks[0].forecast.remaining_days, 5);
        assert_eq!(snapshot.tasks[0].completed, 50);
        assert_eq!(snapshot.tasks[0].percentage, 50.0);

        let tracker = BasicProgressTracker::new(MockStorage::with(vec![tracked_task()], 2)).with_today(day(6));
        let snapshot = tracker.snapshot().await.unwrap();
        assert_eq!(snapshot.tasks[0].forecast.remaining_days, 2);
    }

    #[tokio::test]
    async fn test_get_task_progress_by_name() {
        let tracker = BasicProgressTracker::new(MockStorage::with(vec![tracked_task()], 5)).with_today(day(6));
        let overview = tracker.get_task_progress("Course").await.unwrap().unwrap();
        assert_eq!(overview.status, TaskStatus::Active);
        assert_eq!(overview.total, 100);
        // from 0 to 50 over 5 days, 50 left
        assert_eq!(overview.forecast.estimated_date, Some(day(11)));
        assert!(tracker.get_task_progress("Missing").await.unwrap().is_none());
    }
}

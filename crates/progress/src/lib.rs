//! Progress analytics.
//!
//! Remaining-time forecasts, chart series and the daily change report, all
//! recomputed from the full record history on every call.

#![warn(missing_docs)]

pub mod tracker;
pub mod estimator;
pub mod series;
pub mod daily;

pub use tracker::{ProgressTracker, ProgressSnapshot, BasicProgressTracker, TaskOverview};
pub use estimator::{snapshots, CompletionEstimator, Forecast, Snapshot, NOT_AVAILABLE};
pub use series::{AxisRange, Chart, ChartMode, ChartPoint, DateDomain, Series, SeriesBuilder};
pub use daily::{DailyDiffReporter, DailyReport, SubTaskChange, TaskChange};

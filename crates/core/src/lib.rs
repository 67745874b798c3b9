//! Tally core data models.
//!
//! This crate defines tasks, their sub-tasks and the dated cumulative
//! records that every progress computation is derived from.

#![warn(missing_docs)]

mod error;
mod settings;
mod sub_task;
mod task;
mod timeline;

pub use error::{CoreError, Result};
pub use settings::{Settings, WindowSize};
pub use sub_task::SubTask;
pub use task::{Task, TaskStatus};
pub use timeline::{clamp_to_capacity, format_date, parse_date, percent, Timeline, DATE_FORMAT};

/// Calendar day type used for record keys and "today".
pub type Day = chrono::NaiveDate;

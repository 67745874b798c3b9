//! Tally CLI - cumulative progress tracking with completion forecasts.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Local};
use clap::{Parser, Subcommand};
use tally_core::{format_date, parse_date, Day, Settings, SubTask, Task, TaskStatus, WindowSize};
use tally_progress::{
    BasicProgressTracker, ChartMode, CompletionEstimator, DailyDiffReporter, ProgressTracker, SeriesBuilder,
};
use tally_storage::{JsonStorage, Storage};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Track cumulative progress of tasks and forecast completion", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Data directory holding tasks.json and settings.json
    #[arg(short, long, env = "TALLY_DATA_DIR", default_value = ".tally", global = true)]
    data: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new task
    New {
        /// Task name
        name: String,
    },
    /// List tasks with progress and forecasts
    List,
    /// Show a task and its sub-tasks
    Show {
        /// Task name
        task: String,
    },
    /// Add a sub-task to a task
    AddSub {
        /// Task name
        task: String,
        /// Sub-task name
        name: String,
        /// Capacity of the sub-task
        #[arg(long, default_value = "100")]
        total: u32,
    },
    /// Remove a sub-task and its records
    RemoveSub {
        /// Task name
        task: String,
        /// Sub-task name
        name: String,
    },
    /// Register a cumulative reading for a sub-task
    Record {
        /// Task name
        task: String,
        /// Sub-task name
        sub_task: String,
        /// Cumulative reading
        #[arg(allow_hyphen_values = true)]
        value: i64,
        /// Date of the reading (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
        /// Offset subtracted from the reading, defaults to the last one used
        #[arg(long, allow_hyphen_values = true)]
        offset: Option<i64>,
    },
    /// Rename a task
    Rename {
        /// Current name
        task: String,
        /// New name
        new_name: String,
    },
    /// Change a task's status (active, paused, abandoned)
    Status {
        /// Task name
        task: String,
        /// New status
        status: TaskStatus,
    },
    /// Delete a task and all its sub-tasks
    Delete {
        /// Task name
        task: String,
    },
    /// Print chart series for a task
    Chart {
        /// Task name
        task: String,
        /// cumulative or incremental
        #[arg(long, default_value = "cumulative")]
        mode: ChartMode,
    },
    /// Summarize what moved today
    Today,
    /// Show or set the remaining-days window
    Window {
        /// New window size (1-365)
        size: Option<u32>,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut storage = JsonStorage::new(&cli.data).await?;
    let today = Local::now().date_naive();

    match cli.command {
        Commands::New { name } => {
            let mut tasks = storage.load_tasks().await?;
            tasks.push(Task::started_on(name.clone(), today));
            storage.save_tasks(&tasks).await?;
            info!("Created task '{}'", name);
            println!("Added task: {}", name);
        }
        Commands::List => {
            let tracker = BasicProgressTracker::new(storage).with_today(today);
            let snapshot = tracker.snapshot().await?;

            println!("Tasks ({})", snapshot.tasks.len());
            for task in snapshot.tasks {
                println!(
                    "  {} | {} | {}/{} ({:.2}%) | {} days left | est. {}",
                    task.name,
                    format_status(task.status),
                    task.completed,
                    task.total,
                    task.percentage,
                    task.forecast.remaining_days,
                    task.forecast.estimated_date_label(),
                );
            }
        }
        Commands::Show { task } => {
            let tasks = storage.load_tasks().await?;
            let settings = storage.load_settings().await?;
            let task = tasks
                .iter()
                .find(|t| t.name() == task)
                .ok_or_else(|| anyhow!("Task '{}' not found", task))?;
            print_task(task, &CompletionEstimator::new(settings.recent_x), today);
        }
        Commands::AddSub { task, name, total } => {
            let mut tasks = storage.load_tasks().await?;
            find_task(&mut tasks, &task)?.add_sub_task(SubTask::new(name.clone(), total));
            storage.save_tasks(&tasks).await?;
            info!("Added sub-task '{}' to '{}'", name, task);
            println!("Added sub-task: {} (total {})", name, total);
        }
        Commands::RemoveSub { task, name } => {
            let mut tasks = storage.load_tasks().await?;
            find_task(&mut tasks, &task)?.remove_sub_task_named(&name)?;
            storage.save_tasks(&tasks).await?;
            info!("Removed sub-task '{}' from '{}'", name, task);
            println!("Removed sub-task: {}", name);
        }
        Commands::Record { task, sub_task, value, date, offset } => {
            let day = match date {
                Some(raw) => parse_date(&raw)?,
                None => today,
            };
            let mut tasks = storage.load_tasks().await?;
            let st = find_task(&mut tasks, &task)?
                .sub_task_mut(&sub_task)
                .ok_or_else(|| anyhow!("Sub-task '{}' not found in '{}'", sub_task, task))?;
            let offset = offset.unwrap_or(st.auto_offset());
            let stored = st.register(day, value, offset)?;
            storage.save_tasks(&tasks).await?;
            info!("Recorded {} for '{}/{}' on {}", stored, task, sub_task, day);
            println!("Recorded {} on {}", stored, format_date(day));
        }
        Commands::Rename { task, new_name } => {
            let mut tasks = storage.load_tasks().await?;
            find_task(&mut tasks, &task)?.rename(new_name.clone());
            storage.save_tasks(&tasks).await?;
            println!("Renamed: {} -> {}", task, new_name);
        }
        Commands::Status { task, status } => {
            let mut tasks = storage.load_tasks().await?;
            find_task(&mut tasks, &task)?.set_status(status);
            storage.save_tasks(&tasks).await?;
            println!("{}: {}", task, format_status(status));
        }
        Commands::Delete { task } => {
            let mut tasks = storage.load_tasks().await?;
            let Some(index) = tasks.iter().position(|t| t.name() == task) else {
                bail!("Task '{}' not found", task);
            };
            tasks.remove(index);
            storage.save_tasks(&tasks).await?;
            info!("Deleted task '{}'", task);
            println!("Deleted task: {}", task);
        }
        Commands::Chart { task, mode } => {
            let tasks = storage.load_tasks().await?;
            let task = tasks
                .iter()
                .find(|t| t.name() == task)
                .ok_or_else(|| anyhow!("Task '{}' not found", task))?;
            print_chart(task, mode);
        }
        Commands::Today => {
            let tasks = storage.load_tasks().await?;
            let report = DailyDiffReporter.report(&tasks, today);
            println!("Summary for {}", format_date(today));
            println!("{}", report);
        }
        Commands::Window { size } => match size {
            None => {
                let settings = storage.load_settings().await?;
                println!("Remaining-days window: {}", settings.recent_x);
            }
            Some(size) => {
                let settings = Settings {
                    recent_x: WindowSize::try_from(size)?,
                };
                storage.save_settings(&settings).await?;
                println!("Remaining-days window set to {}", settings.recent_x);
            }
        },
    }

    Ok(())
}

fn find_task<'a>(tasks: &'a mut [Task], name: &str) -> Result<&'a mut Task> {
    tasks
        .iter_mut()
        .find(|t| t.name() == name)
        .ok_or_else(|| anyhow!("Task '{}' not found", name))
}

fn print_task(task: &Task, estimator: &CompletionEstimator, today: Day) {
    let forecast = estimator.forecast(task, today);
    println!("Task: {}", task.name());
    println!("  Status: {}", format_status(task.status()));
    println!("  Started: {}", format_date(task.start_date()));
    println!("  Progress: {}/{} ({:.2}%)", task.completed(), task.total(), task.percentage());
    println!("  Remaining days: {}", forecast.remaining_days);
    println!("  Estimated completion: {}", forecast.estimated_date_label());
    for st in task.sub_tasks() {
        let latest = st
            .timeline()
            .latest()
            .map(|(day, value)| format!("{} on {}", value, format_date(day)))
            .unwrap_or_else(|| "no records".to_string());
        println!(
            "    {} | {}/{} ({:.2}%) | offset {} | latest {}",
            st.name(),
            st.completed(),
            st.total(),
            st.percentage(),
            st.auto_offset(),
            latest,
        );
    }
}

fn print_chart(task: &Task, mode: ChartMode) {
    let chart = SeriesBuilder::new(mode).build(task);
    println!("{} - {} chart", task.name(), chart.mode);
    let Some(domain) = chart.x_domain else {
        println!("  No records");
        return;
    };
    println!(
        "  x: {} .. {} | y: {:.2} .. {:.2} ({} ticks)",
        format_date(domain.start),
        format_date(domain.end),
        chart.y_axis.min,
        chart.y_axis.max,
        chart.y_axis.tick_count,
    );
    for series in chart.series() {
        println!("  {}", series.name);
        for point in &series.points {
            let day = DateTime::from_timestamp_millis(point.timestamp_ms)
                .map(|t| format_date(t.date_naive()))
                .unwrap_or_default();
            println!("    {} {}", day, point.label());
        }
    }
}

fn format_status(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Active => "ACTIVE",
        TaskStatus::Paused => "PAUSED",
        TaskStatus::Abandoned => "ABANDONED",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_task_by_name() {
        let mut tasks = vec![Task::new("One"), Task::new("Two")];
        find_task(&mut tasks, "Two").unwrap().set_status(TaskStatus::Paused);
        assert_eq!(tasks[1].status(), TaskStatus::Paused);
        assert!(find_task(&mut tasks, "Three").is_err());
    }

    #[test]
    fn test_cli_parses_negative_reading_and_mode() {
        let cli = Cli::try_parse_from(["tally", "record", "Book", "Ch1", "-5", "--offset", "-2"]).unwrap();
        match cli.command {
            Commands::Record { value, offset, .. } => {
                assert_eq!(value, -5);
                assert_eq!(offset, Some(-2));
            }
            _ => panic!("expected record"),
        }

        let cli = Cli::try_parse_from(["tally", "chart", "Book", "--mode", "incremental"]).unwrap();
        assert!(matches!(cli.command, Commands::Chart { mode: ChartMode::Incremental, .. }));
        assert!(Cli::try_parse_from(["tally", "status", "Book", "done"]).is_err());
    }

    #[test]
    fn test_extreme_record_values_parse_but_do_not_register() {
        let cli = Cli::try_parse_from(["tally", "record", "T", "S", "9223372036854775807", "--offset", "-1"]).unwrap();
        let Commands::Record { value, offset, .. } = cli.command else {
            panic!("expected record");
        };
        let mut st = SubTask::new("S", 100);
        assert!(st.register(Local::now().date_naive(), value, offset.unwrap()).is_err());
        assert!(st.records().is_empty());
    }
}

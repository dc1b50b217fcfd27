use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "Pending"),
            TaskStatus::InProgress => write!(f, "In Progress"),
            TaskStatus::Completed => write!(f, "Completed"),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid task status: {0}")]
pub struct ParseTaskStatusError(String);

impl FromStr for TaskStatus {
    type Err = ParseTaskStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(TaskStatus::Pending),
            "in_progress" | "in progress" | "in-progress" => Ok(TaskStatus::InProgress),
            "completed" | "done" => Ok(TaskStatus::Completed),
            _ => Err(ParseTaskStatusError(s.to_string())),
        }
    }
}

/// A single dated garden task.
///
/// Rows come in three flavours:
/// - series instances: `series_id` points at the owning [`RecurringSeries`]
/// - standalone tasks: `series_id = None`, including detached instances
/// - inline-recurring tasks: `recurrence_rule` is set on the task itself and
///   the row is expanded at read time (see [`crate::expansion`])
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskInstance {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub status: TaskStatus,
    pub plan_id: Uuid,
    pub planting_id: Option<Uuid>,
    pub series_id: Option<Uuid>,
    /// Rule stored directly on the task; only used by read-time expansion
    pub recurrence_rule: Option<String>,
    /// Dates skipped by read-time expansion of `recurrence_rule`
    #[serde(default)]
    pub exdates: BTreeSet<NaiveDate>,
    /// Occurrences of `recurrence_rule` already marked done
    #[serde(default)]
    pub completed_dates: BTreeSet<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for TaskInstance {
    fn default() -> Self {
        Self {
            id: Uuid::now_v7(),
            name: "".to_string(),
            description: None,
            due_date: None,
            status: TaskStatus::Pending,
            plan_id: Uuid::nil(),
            planting_id: None,
            series_id: None,
            recurrence_rule: None,
            exdates: BTreeSet::new(),
            completed_dates: BTreeSet::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

impl TaskInstance {
    /// Builds a fresh Pending instance of `series` due on `due_date`.
    pub fn for_occurrence(series: &RecurringSeries, due_date: NaiveDate) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            name: series.name.clone(),
            description: series.description.clone(),
            due_date: Some(due_date),
            status: TaskStatus::Pending,
            plan_id: series.plan_id,
            planting_id: series.planting_id,
            series_id: Some(series.id),
            recurrence_rule: None,
            exdates: BTreeSet::new(),
            completed_dates: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_series_instance(&self) -> bool {
        self.series_id.is_some()
    }
}

/// A recurring task definition: rule, anchor, optional end date and exclusions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecurringSeries {
    /// Primary key, UUIDv7 for time-ordered inserts
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// RFC 5545 RRULE body, e.g. `FREQ=WEEKLY;BYDAY=MO`
    pub recurrence_rule: String,
    /// Anchor date the rule is evaluated from
    pub start_date: NaiveDate,
    /// Inclusive upper bound for generated instances
    pub recurrence_end_date: Option<NaiveDate>,
    pub plan_id: Uuid,
    pub planting_id: Option<Uuid>,
    /// Dates explicitly removed from the series
    #[serde(default)]
    pub exdates: BTreeSet<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RecurringSeries {
    /// Adds `date` to the exclusion set. Returns `false` if it was already there.
    pub fn exclude(&mut self, date: NaiveDate) -> bool {
        self.exdates.insert(date)
    }

    pub fn is_excluded(&self, date: NaiveDate) -> bool {
        self.exdates.contains(&date)
    }

    /// True once `date` lies beyond the recurrence end date.
    pub fn is_past_end(&self, date: NaiveDate) -> bool {
        self.recurrence_end_date.is_some_and(|end| date > end)
    }
}

// ============================================================================
// Data Transfer Objects
// ============================================================================

/// Data required to create a new recurring series
#[derive(Debug, Clone)]
pub struct NewSeriesData {
    pub name: String,
    pub description: Option<String>,
    /// Raw RRULE (validated before anything is written)
    pub recurrence_rule: String,
    pub start_date: NaiveDate,
    pub recurrence_end_date: Option<NaiveDate>,
    pub plan_id: Uuid,
    pub planting_id: Option<Uuid>,
    pub exdates: BTreeSet<NaiveDate>,
}

/// Partial update of a series. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateSeriesData {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub recurrence_rule: Option<String>,
    pub recurrence_end_date: Option<Option<NaiveDate>>,
    /// Replaces the whole exclusion set
    pub exdates: Option<BTreeSet<NaiveDate>>,
}

#[derive(Debug, Clone, Default)]
pub struct NewTaskData {
    pub name: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub status: Option<TaskStatus>,
    pub plan_id: Uuid,
    pub planting_id: Option<Uuid>,
    /// For tasks expanded at read time
    pub recurrence_rule: Option<String>,
    pub exdates: BTreeSet<NaiveDate>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateTaskData {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub due_date: Option<Option<NaiveDate>>,
    pub status: Option<TaskStatus>,
}

impl UpdateTaskData {
    /// Applies the edits to `task`, returning whether anything changed.
    pub fn apply_to(&self, task: &mut TaskInstance) -> bool {
        let mut changed = false;
        if let Some(name) = &self.name {
            changed |= task.name != *name;
            task.name = name.clone();
        }
        if let Some(description) = &self.description {
            changed |= task.description != *description;
            task.description = description.clone();
        }
        if let Some(due_date) = self.due_date {
            changed |= task.due_date != due_date;
            task.due_date = due_date;
        }
        if let Some(status) = self.status {
            changed |= task.status != status;
            task.status = status;
        }
        if changed {
            task.updated_at = Utc::now();
        }
        changed
    }
}

/// Result of a task update, reporting any instance generated by completion.
#[derive(Debug)]
pub enum TaskUpdateOutcome {
    Updated(TaskInstance),
    Completed {
        completed: TaskInstance,
        next: Option<TaskInstance>,
    },
}

impl TaskUpdateOutcome {
    pub fn task(&self) -> &TaskInstance {
        match self {
            TaskUpdateOutcome::Updated(task) => task,
            TaskUpdateOutcome::Completed { completed, .. } => completed,
        }
    }

    pub fn next(&self) -> Option<&TaskInstance> {
        match self {
            TaskUpdateOutcome::Updated(_) => None,
            TaskUpdateOutcome::Completed { next, .. } => next.as_ref(),
        }
    }
}

/// Configuration for occurrence generation - core version.
/// The CLI layers file and environment overrides on top of it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RecurrenceConfig {
    /// Forward window materialized on creation and regeneration
    pub window_days: i64,
    /// Completion scans stop once a candidate is this many years past its anchor
    pub horizon_years: i32,
    /// Default look-ahead for read-time expansion of plan task listings
    pub listing_days: i64,
}

impl Default for RecurrenceConfig {
    fn default() -> Self {
        Self {
            window_days: 180,
            horizon_years: 5,
            listing_days: 365,
        }
    }
}

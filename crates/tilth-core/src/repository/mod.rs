use crate::error::CoreError;
use crate::models::{RecurringSeries, TaskInstance, TaskStatus};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use std::collections::BTreeSet;
use uuid::Uuid;

// Storage adapters
pub mod memory;
pub mod series;
pub mod sqlite;
pub mod tasks;

pub use memory::InMemoryStorage;
pub use sqlite::{SqliteStorage, SqliteStore};

// Traits are defined in this module and implemented per adapter

/// Series-side storage operations
#[async_trait]
pub trait SeriesStore {
    async fn get_series(&mut self, id: Uuid) -> Result<Option<RecurringSeries>, CoreError>;
    async fn insert_series(&mut self, series: &RecurringSeries) -> Result<(), CoreError>;
    /// Overwrites the series row and its exclusion set
    async fn save_series(&mut self, series: &RecurringSeries) -> Result<(), CoreError>;
    /// Deletes the series and every instance it owns
    async fn delete_series(&mut self, id: Uuid) -> Result<bool, CoreError>;
    async fn list_plan_series(&mut self, plan_id: Uuid) -> Result<Vec<RecurringSeries>, CoreError>;
}

/// Task-row storage operations, covering series instances and standalone tasks
#[async_trait]
pub trait InstanceStore {
    async fn create_instance(&mut self, instance: &TaskInstance) -> Result<(), CoreError>;
    async fn find_instance(
        &mut self,
        series_id: Uuid,
        due_date: NaiveDate,
    ) -> Result<Option<TaskInstance>, CoreError>;
    async fn find_instance_by_id(&mut self, id: Uuid) -> Result<Option<TaskInstance>, CoreError>;
    async fn update_instance(&mut self, instance: &TaskInstance) -> Result<(), CoreError>;
    async fn delete_instance(&mut self, id: Uuid) -> Result<bool, CoreError>;
    /// Removes Pending instances of the series due on or after `from`
    async fn delete_pending_instances_from(
        &mut self,
        series_id: Uuid,
        from: NaiveDate,
    ) -> Result<u64, CoreError>;
    async fn list_series_instances(&mut self, series_id: Uuid) -> Result<Vec<TaskInstance>, CoreError>;
    async fn list_plan_tasks(&mut self, plan_id: Uuid) -> Result<Vec<TaskInstance>, CoreError>;
}

/// One unit of work over the occurrence store.
///
/// Writes become visible only on [`OccurrenceStore::commit`]; dropping the
/// store without committing discards them.
#[async_trait]
pub trait OccurrenceStore: SeriesStore + InstanceStore + Send + Sized {
    async fn commit(self) -> Result<(), CoreError>;
}

/// Hands out units of work.
#[async_trait]
pub trait Storage: Send + Sync {
    type Store: OccurrenceStore;

    async fn begin(&self) -> Result<Self::Store, CoreError>;
}

// Row types shared by the SQLite adapter

#[derive(Debug, Clone, FromRow)]
pub(crate) struct SeriesRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub recurrence_rule: String,
    pub start_date: NaiveDate,
    pub recurrence_end_date: Option<NaiveDate>,
    pub plan_id: Uuid,
    pub planting_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SeriesRow {
    pub(crate) fn into_series(self, exdates: BTreeSet<NaiveDate>) -> RecurringSeries {
        RecurringSeries {
            id: self.id,
            name: self.name,
            description: self.description,
            recurrence_rule: self.recurrence_rule,
            start_date: self.start_date,
            recurrence_end_date: self.recurrence_end_date,
            plan_id: self.plan_id,
            planting_id: self.planting_id,
            exdates,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct TaskRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub status: TaskStatus,
    pub plan_id: Uuid,
    pub planting_id: Option<Uuid>,
    pub series_id: Option<Uuid>,
    pub recurrence_rule: Option<String>,
    /// JSON array of ISO dates
    pub exdates: String,
    /// JSON array of ISO dates
    pub completed_dates: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<TaskRow> for TaskInstance {
    type Error = CoreError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        Ok(TaskInstance {
            id: row.id,
            name: row.name,
            description: row.description,
            due_date: row.due_date,
            status: row.status,
            plan_id: row.plan_id,
            planting_id: row.planting_id,
            series_id: row.series_id,
            recurrence_rule: row.recurrence_rule,
            exdates: serde_json::from_str(&row.exdates)?,
            completed_dates: serde_json::from_str(&row.completed_dates)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub(crate) fn rows_into_tasks(rows: Vec<TaskRow>) -> Result<Vec<TaskInstance>, CoreError> {
    rows.into_iter().map(TaskInstance::try_from).collect()
}

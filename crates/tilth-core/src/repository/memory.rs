//! In-memory storage adapter.
//!
//! A unit of work holds the storage lock from `begin` until it is committed
//! or dropped, so units of work run one at a time. Writes go to a private
//! copy of the state that replaces the shared one on `commit`; dropping the
//! store without committing discards them.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::{RecurringSeries, TaskInstance, TaskStatus};

use super::{InstanceStore, OccurrenceStore, SeriesStore, Storage};

/// Thread-safe in-memory storage.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    state: Arc<Mutex<MemoryState>>,
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    series: HashMap<Uuid, RecurringSeries>,
    tasks: HashMap<Uuid, TaskInstance>,
}

impl InMemoryStorage {
    /// Creates an empty in-memory storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    type Store = InMemoryStore;

    async fn begin(&self) -> Result<InMemoryStore, CoreError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = (*guard).clone();
        Ok(InMemoryStore { guard, working })
    }
}

/// A unit of work over [`InMemoryStorage`]. Other units of work wait in
/// `begin` while this one is alive.
#[derive(Debug)]
pub struct InMemoryStore {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

impl InMemoryStore {
    fn sorted(mut tasks: Vec<TaskInstance>) -> Vec<TaskInstance> {
        tasks.sort_by(|a, b| {
            (a.due_date.is_none(), a.due_date, a.created_at)
                .cmp(&(b.due_date.is_none(), b.due_date, b.created_at))
        });
        tasks
    }
}

#[async_trait]
impl SeriesStore for InMemoryStore {
    async fn get_series(&mut self, id: Uuid) -> Result<Option<RecurringSeries>, CoreError> {
        Ok(self.working.series.get(&id).cloned())
    }

    async fn insert_series(&mut self, series: &RecurringSeries) -> Result<(), CoreError> {
        if self.working.series.contains_key(&series.id) {
            return Err(CoreError::InconsistentState(format!(
                "Series with id {} already exists",
                series.id
            )));
        }
        self.working.series.insert(series.id, series.clone());
        Ok(())
    }

    async fn save_series(&mut self, series: &RecurringSeries) -> Result<(), CoreError> {
        match self.working.series.get_mut(&series.id) {
            Some(stored) => {
                *stored = series.clone();
                Ok(())
            }
            None => Err(CoreError::NotFound(format!(
                "Series with id {} not found",
                series.id
            ))),
        }
    }

    async fn delete_series(&mut self, id: Uuid) -> Result<bool, CoreError> {
        self.working
            .tasks
            .retain(|_, task| task.series_id != Some(id));
        Ok(self.working.series.remove(&id).is_some())
    }

    async fn list_plan_series(&mut self, plan_id: Uuid) -> Result<Vec<RecurringSeries>, CoreError> {
        let mut series: Vec<RecurringSeries> = self
            .working
            .series
            .values()
            .filter(|s| s.plan_id == plan_id)
            .cloned()
            .collect();
        series.sort_by(|a, b| (a.start_date, &a.name).cmp(&(b.start_date, &b.name)));
        Ok(series)
    }
}

#[async_trait]
impl InstanceStore for InMemoryStore {
    async fn create_instance(&mut self, instance: &TaskInstance) -> Result<(), CoreError> {
        if self.working.tasks.contains_key(&instance.id) {
            return Err(CoreError::InconsistentState(format!(
                "Task with id {} already exists",
                instance.id
            )));
        }
        // Mirrors the unique (series_id, due_date) index of the SQLite schema
        if let (Some(series_id), Some(due_date)) = (instance.series_id, instance.due_date) {
            if self.find_instance(series_id, due_date).await?.is_some() {
                return Err(CoreError::InconsistentState(format!(
                    "Series {} already has an instance due {}",
                    series_id, due_date
                )));
            }
        }
        self.working.tasks.insert(instance.id, instance.clone());
        Ok(())
    }

    async fn find_instance(
        &mut self,
        series_id: Uuid,
        due_date: NaiveDate,
    ) -> Result<Option<TaskInstance>, CoreError> {
        Ok(self
            .working
            .tasks
            .values()
            .find(|t| t.series_id == Some(series_id) && t.due_date == Some(due_date))
            .cloned())
    }

    async fn find_instance_by_id(&mut self, id: Uuid) -> Result<Option<TaskInstance>, CoreError> {
        Ok(self.working.tasks.get(&id).cloned())
    }

    async fn update_instance(&mut self, instance: &TaskInstance) -> Result<(), CoreError> {
        match self.working.tasks.get_mut(&instance.id) {
            Some(stored) => {
                *stored = instance.clone();
                Ok(())
            }
            None => Err(CoreError::NotFound(format!(
                "Task with id {} not found",
                instance.id
            ))),
        }
    }

    async fn delete_instance(&mut self, id: Uuid) -> Result<bool, CoreError> {
        Ok(self.working.tasks.remove(&id).is_some())
    }

    async fn delete_pending_instances_from(
        &mut self,
        series_id: Uuid,
        from: NaiveDate,
    ) -> Result<u64, CoreError> {
        let before = self.working.tasks.len();
        self.working.tasks.retain(|_, t| {
            !(t.series_id == Some(series_id)
                && t.status == TaskStatus::Pending
                && t.due_date.is_some_and(|due| due >= from))
        });
        Ok((before - self.working.tasks.len()) as u64)
    }

    async fn list_series_instances(&mut self, series_id: Uuid) -> Result<Vec<TaskInstance>, CoreError> {
        let tasks = self
            .working
            .tasks
            .values()
            .filter(|t| t.series_id == Some(series_id))
            .cloned()
            .collect();
        Ok(Self::sorted(tasks))
    }

    async fn list_plan_tasks(&mut self, plan_id: Uuid) -> Result<Vec<TaskInstance>, CoreError> {
        let tasks = self
            .working
            .tasks
            .values()
            .filter(|t| t.plan_id == plan_id)
            .cloned()
            .collect();
        Ok(Self::sorted(tasks))
    }
}

#[async_trait]
impl OccurrenceStore for InMemoryStore {
    async fn commit(self) -> Result<(), CoreError> {
        let InMemoryStore { mut guard, working } = self;
        *guard = working;
        Ok(())
    }
}

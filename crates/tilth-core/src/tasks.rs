//! Task-level operations: CRUD of task rows, the update path that drives
//! completion-based generation, and plan listings with read-time expansion.

use chrono::{Duration, NaiveDate};
use mockable::Clock;
use std::sync::Arc;
use uuid::Uuid;

use crate::completion;
use crate::error::CoreError;
use crate::expansion;
use crate::models::{
    NewTaskData, RecurrenceConfig, TaskInstance, TaskStatus, TaskUpdateOutcome, UpdateTaskData,
};
use crate::recurrence::RuleEvaluator;
use crate::repository::{InstanceStore, OccurrenceStore, SeriesStore, Storage};

#[derive(Clone)]
pub struct TaskService<S, C>
where
    S: Storage,
    C: Clock + Send + Sync,
{
    storage: Arc<S>,
    clock: Arc<C>,
    config: RecurrenceConfig,
}

impl<S, C> TaskService<S, C>
where
    S: Storage,
    C: Clock + Send + Sync,
{
    #[must_use]
    pub fn new(storage: Arc<S>, clock: Arc<C>, config: RecurrenceConfig) -> Self {
        Self {
            storage,
            clock,
            config,
        }
    }

    fn today(&self) -> NaiveDate {
        self.clock.utc().date_naive()
    }

    /// Creates a standalone task. A task carrying its own rule needs a due
    /// date to anchor it, and the rule must parse.
    pub async fn create_task(&self, data: NewTaskData) -> Result<TaskInstance, CoreError> {
        if data.name.trim().is_empty() {
            return Err(CoreError::InvalidInput("Task name cannot be empty".to_string()));
        }

        let recurrence_rule = match data.recurrence_rule {
            Some(rule) => {
                let anchor = data.due_date.ok_or_else(|| {
                    CoreError::InvalidInput("A recurring task needs a due date".to_string())
                })?;
                Some(RuleEvaluator::new(&rule, anchor)?.rule().to_string())
            }
            None => None,
        };

        let now = self.clock.utc();
        let task = TaskInstance {
            id: Uuid::now_v7(),
            name: data.name,
            description: data.description,
            due_date: data.due_date,
            status: data.status.unwrap_or(TaskStatus::Pending),
            plan_id: data.plan_id,
            planting_id: data.planting_id,
            series_id: None,
            recurrence_rule,
            exdates: data.exdates,
            completed_dates: Default::default(),
            created_at: now,
            updated_at: now,
        };

        let mut store = self.storage.begin().await?;
        store.create_instance(&task).await?;
        store.commit().await?;

        tracing::debug!(task_id = %task.id, "created task");
        Ok(task)
    }

    pub async fn get_task(&self, id: Uuid) -> Result<TaskInstance, CoreError> {
        let mut store = self.storage.begin().await?;
        store
            .find_instance_by_id(id)
            .await?
            .ok_or_else(|| task_not_found(id))
    }

    /// Deletes a task row. Deleting a series instance also excludes its date
    /// from the series so it is not generated again.
    pub async fn delete_task(&self, id: Uuid) -> Result<bool, CoreError> {
        let mut store = self.storage.begin().await?;
        let task = store
            .find_instance_by_id(id)
            .await?
            .ok_or_else(|| task_not_found(id))?;

        if let (Some(series_id), Some(due_date)) = (task.series_id, task.due_date) {
            if let Some(mut series) = store.get_series(series_id).await? {
                if series.exclude(due_date) {
                    series.updated_at = self.clock.utc();
                    store.save_series(&series).await?;
                }
            }
        }

        let deleted = store.delete_instance(id).await?;
        store.commit().await?;
        Ok(deleted)
    }

    /// Applies `data` to a task.
    ///
    /// # Behavior
    /// - Moving into Completed from any other status runs completion-driven
    ///   generation in the same unit of work
    /// - Saving a task that was already Completed never generates
    /// - Rescheduling a series instance detaches it: the old date joins the
    ///   series' exclusions and the task becomes standalone, so regeneration
    ///   never purges it
    pub async fn update_task(
        &self,
        id: Uuid,
        data: UpdateTaskData,
    ) -> Result<TaskUpdateOutcome, CoreError> {
        let mut store = self.storage.begin().await?;
        let mut task = store
            .find_instance_by_id(id)
            .await?
            .ok_or_else(|| task_not_found(id))?;

        let previous_status = task.status;
        let previous_due = task.due_date;

        if !data.apply_to(&mut task) {
            return Ok(TaskUpdateOutcome::Updated(task));
        }

        if let Some(series_id) = task.series_id {
            if task.due_date != previous_due {
                self.detach_rescheduled(&mut store, series_id, previous_due)
                    .await?;
                task.series_id = None;
                tracing::info!(%series_id, task_id = %task.id, "rescheduled instance detached from series");
            }
        }

        store.update_instance(&task).await?;

        let outcome = if previous_status != TaskStatus::Completed
            && task.status == TaskStatus::Completed
        {
            let next =
                completion::on_instance_completed(&mut store, &task, self.config.horizon_years)
                    .await?;
            TaskUpdateOutcome::Completed {
                completed: task,
                next,
            }
        } else {
            TaskUpdateOutcome::Updated(task)
        };

        store.commit().await?;
        Ok(outcome)
    }

    async fn detach_rescheduled(
        &self,
        store: &mut S::Store,
        series_id: Uuid,
        previous_due: Option<NaiveDate>,
    ) -> Result<(), CoreError> {
        if let (Some(old_due), Some(mut series)) = (previous_due, store.get_series(series_id).await?) {
            if series.exclude(old_due) {
                series.updated_at = self.clock.utc();
                store.save_series(&series).await?;
            }
        }
        Ok(())
    }

    /// Marks the task Completed.
    pub async fn complete_task(&self, id: Uuid) -> Result<TaskUpdateOutcome, CoreError> {
        self.update_task(
            id,
            UpdateTaskData {
                status: Some(TaskStatus::Completed),
                ..Default::default()
            },
        )
        .await
    }

    /// Records one occurrence of an inline-recurring task as done.
    pub async fn complete_task_occurrence(
        &self,
        id: Uuid,
        date: NaiveDate,
    ) -> Result<TaskInstance, CoreError> {
        let mut store = self.storage.begin().await?;
        let mut task = store
            .find_instance_by_id(id)
            .await?
            .ok_or_else(|| task_not_found(id))?;

        if task.recurrence_rule.is_none() {
            return Err(CoreError::InvalidInput(format!(
                "Task {} has no recurrence rule",
                id
            )));
        }

        if task.completed_dates.insert(date) {
            task.updated_at = self.clock.utc();
            store.update_instance(&task).await?;
            store.commit().await?;
        }
        Ok(task)
    }

    /// Lists a plan's tasks with inline-recurring tasks expanded over
    /// `[start, end]`. Defaults to today through `listing_days` ahead.
    pub async fn list_plan_tasks(
        &self,
        plan_id: Uuid,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<TaskInstance>, CoreError> {
        let start = start.unwrap_or_else(|| self.today());
        let end = end.unwrap_or_else(|| start + Duration::days(self.config.listing_days));

        let mut store = self.storage.begin().await?;
        let tasks = store.list_plan_tasks(plan_id).await?;

        Ok(expansion::expand_tasks_for_window(&tasks, start, end))
    }
}

fn task_not_found(id: Uuid) -> CoreError {
    CoreError::NotFound(format!("Task with id {} not found", id))
}

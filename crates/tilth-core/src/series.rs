//! Series lifecycle: creation, regeneration on rule changes, detaching and
//! deleting single instances, and deleting whole series.
//!
//! Every mutating operation runs inside one unit of work obtained from
//! [`Storage::begin`] and commits only after all of its steps succeeded.

use chrono::{Duration, NaiveDate};
use mockable::Clock;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::{
    NewSeriesData, RecurrenceConfig, RecurringSeries, TaskInstance, UpdateSeriesData,
    UpdateTaskData,
};
use crate::recurrence::RuleEvaluator;
use crate::repository::{InstanceStore, OccurrenceStore, SeriesStore, Storage};

/// SeriesManager: owns the instance set of every recurring series.
#[derive(Clone)]
pub struct SeriesManager<S, C>
where
    S: Storage,
    C: Clock + Send + Sync,
{
    storage: Arc<S>,
    clock: Arc<C>,
    config: RecurrenceConfig,
}

impl<S, C> SeriesManager<S, C>
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

    pub fn config(&self) -> &RecurrenceConfig {
        &self.config
    }

    /// Today's date according to the manager's clock, in UTC.
    pub fn today(&self) -> NaiveDate {
        self.clock.utc().date_naive()
    }

    /// Creates a series and materializes its first occurrence window.
    ///
    /// # Behavior
    /// - The rule is parsed first; a malformed rule is rejected before any write
    /// - Instances are created for `[start_date, start_date + window_days]`,
    ///   cut at the end date when that comes sooner
    ///
    /// # Errors
    /// `RuleParse` for a malformed rule, `InvalidInput` for an empty name or an
    /// end date before the start date, storage errors otherwise.
    pub async fn create_series(&self, data: NewSeriesData) -> Result<RecurringSeries, CoreError> {
        if data.name.trim().is_empty() {
            return Err(CoreError::InvalidInput("Series name cannot be empty".to_string()));
        }
        validate_end_date(data.start_date, data.recurrence_end_date)?;
        let evaluator = RuleEvaluator::new(&data.recurrence_rule, data.start_date)?;

        let now = self.clock.utc();
        let series = RecurringSeries {
            id: Uuid::now_v7(),
            name: data.name,
            description: data.description,
            recurrence_rule: evaluator.rule().to_string(),
            start_date: data.start_date,
            recurrence_end_date: data.recurrence_end_date,
            plan_id: data.plan_id,
            planting_id: data.planting_id,
            exdates: data.exdates,
            created_at: now,
            updated_at: now,
        };

        let mut store = self.storage.begin().await?;
        store.insert_series(&series).await?;

        let window_end = series.start_date + Duration::days(self.config.window_days);
        let created = populate(&mut store, &series, &evaluator, series.start_date, window_end).await?;
        store.commit().await?;

        tracing::info!(
            series_id = %series.id,
            rule = %series.recurrence_rule,
            instances = created.len(),
            "created recurring series"
        );
        Ok(series)
    }

    /// Applies a partial update; regenerates future instances when the rule
    /// text or the end date changed value.
    ///
    /// # Behavior
    /// - Regeneration deletes Pending instances due today or later, then
    ///   repopulates `[today, today + window_days]`
    /// - Completed and InProgress instances, and anything already past due,
    ///   are left alone
    /// - Replacing `exdates` on its own does not regenerate
    pub async fn update_series(
        &self,
        id: Uuid,
        data: UpdateSeriesData,
    ) -> Result<RecurringSeries, CoreError> {
        let mut store = self.storage.begin().await?;
        let mut series = store
            .get_series(id)
            .await?
            .ok_or_else(|| series_not_found(id))?;

        let mut regenerate = false;

        if let Some(name) = data.name {
            if name.trim().is_empty() {
                return Err(CoreError::InvalidInput("Series name cannot be empty".to_string()));
            }
            series.name = name;
        }
        if let Some(description) = data.description {
            series.description = description;
        }
        if let Some(rule) = data.recurrence_rule {
            let evaluator = RuleEvaluator::new(&rule, series.start_date)?;
            if evaluator.rule() != series.recurrence_rule {
                series.recurrence_rule = evaluator.rule().to_string();
                regenerate = true;
            }
        }
        if let Some(end_date) = data.recurrence_end_date {
            validate_end_date(series.start_date, end_date)?;
            if end_date != series.recurrence_end_date {
                series.recurrence_end_date = end_date;
                regenerate = true;
            }
        }
        if let Some(exdates) = data.exdates {
            series.exdates = exdates;
        }

        series.updated_at = self.clock.utc();
        store.save_series(&series).await?;

        if regenerate {
            self.regenerate(&mut store, &series).await?;
        }
        store.commit().await?;

        Ok(series)
    }

    async fn regenerate(
        &self,
        store: &mut S::Store,
        series: &RecurringSeries,
    ) -> Result<(), CoreError> {
        let today = self.today();
        let evaluator = RuleEvaluator::new(&series.recurrence_rule, series.start_date)?;

        let purged = store.delete_pending_instances_from(series.id, today).await?;
        let window_end = today + Duration::days(self.config.window_days);
        let created = populate(store, series, &evaluator, today, window_end).await?;

        tracing::info!(
            series_id = %series.id,
            purged,
            created = created.len(),
            "regenerated recurring series"
        );
        Ok(())
    }

    /// Unlinks an instance from its series, leaving a standalone task.
    ///
    /// The instance's due date joins the series' exclusions so neither
    /// regeneration nor completion recreates it.
    pub async fn detach_instance(
        &self,
        series_id: Uuid,
        instance_id: Uuid,
    ) -> Result<TaskInstance, CoreError> {
        let mut store = self.storage.begin().await?;
        let instance = self
            .detach_in_store(&mut store, series_id, instance_id)
            .await?;
        store.commit().await?;

        tracing::info!(%series_id, instance_id = %instance.id, "detached instance");
        Ok(instance)
    }

    /// Detaches an instance and applies `data` to it in the same unit of work.
    pub async fn edit_instance(
        &self,
        series_id: Uuid,
        instance_id: Uuid,
        data: UpdateTaskData,
    ) -> Result<TaskInstance, CoreError> {
        let mut store = self.storage.begin().await?;
        let mut instance = self
            .detach_in_store(&mut store, series_id, instance_id)
            .await?;

        if data.apply_to(&mut instance) {
            store.update_instance(&instance).await?;
        }
        store.commit().await?;

        tracing::info!(%series_id, instance_id = %instance.id, "edited and detached instance");
        Ok(instance)
    }

    async fn detach_in_store(
        &self,
        store: &mut S::Store,
        series_id: Uuid,
        instance_id: Uuid,
    ) -> Result<TaskInstance, CoreError> {
        let (mut series, mut instance) = load_owned_instance(store, series_id, instance_id).await?;

        self.exclude_instance_date(store, &mut series, &instance).await?;

        instance.series_id = None;
        instance.updated_at = self.clock.utc();
        store.update_instance(&instance).await?;
        Ok(instance)
    }

    /// Deletes one instance and excludes its date from the series.
    pub async fn delete_instance(&self, series_id: Uuid, instance_id: Uuid) -> Result<bool, CoreError> {
        let mut store = self.storage.begin().await?;
        let (mut series, instance) = load_owned_instance(&mut store, series_id, instance_id).await?;

        self.exclude_instance_date(&mut store, &mut series, &instance)
            .await?;
        let deleted = store.delete_instance(instance.id).await?;
        store.commit().await?;

        tracing::info!(%series_id, %instance_id, "deleted instance");
        Ok(deleted)
    }

    async fn exclude_instance_date(
        &self,
        store: &mut S::Store,
        series: &mut RecurringSeries,
        instance: &TaskInstance,
    ) -> Result<(), CoreError> {
        if let Some(due_date) = instance.due_date {
            if series.exclude(due_date) {
                series.updated_at = self.clock.utc();
                store.save_series(series).await?;
            }
        }
        Ok(())
    }

    /// Deletes a series together with all of its instances.
    pub async fn delete_series(&self, id: Uuid) -> Result<bool, CoreError> {
        let mut store = self.storage.begin().await?;
        if !store.delete_series(id).await? {
            return Err(series_not_found(id));
        }
        store.commit().await?;

        tracing::info!(series_id = %id, "deleted recurring series");
        Ok(true)
    }

    pub async fn get_series(&self, id: Uuid) -> Result<RecurringSeries, CoreError> {
        let mut store = self.storage.begin().await?;
        store
            .get_series(id)
            .await?
            .ok_or_else(|| series_not_found(id))
    }

    pub async fn list_plan_series(&self, plan_id: Uuid) -> Result<Vec<RecurringSeries>, CoreError> {
        let mut store = self.storage.begin().await?;
        store.list_plan_series(plan_id).await
    }

    /// All instances currently linked to the series, by due date.
    pub async fn list_instances(&self, series_id: Uuid) -> Result<Vec<TaskInstance>, CoreError> {
        let mut store = self.storage.begin().await?;
        if store.get_series(series_id).await?.is_none() {
            return Err(series_not_found(series_id));
        }
        store.list_series_instances(series_id).await
    }

    /// The next `count` dates the series will produce from today, exclusions
    /// and end date applied.
    pub async fn preview(&self, id: Uuid, count: usize) -> Result<Vec<NaiveDate>, CoreError> {
        let series = self.get_series(id).await?;
        let evaluator = RuleEvaluator::new(&series.recurrence_rule, series.start_date)?;
        let from = self.today().max(series.start_date);

        Ok(evaluator
            .occurrences_after(from - Duration::days(1))
            .take_while(|date| !series.is_past_end(*date))
            .filter(|date| !series.is_excluded(*date))
            .take(count)
            .collect())
    }
}

/// Materializes a Pending instance for every occurrence in `[from, to]` that
/// is not excluded and not already present.
async fn populate<St>(
    store: &mut St,
    series: &RecurringSeries,
    evaluator: &RuleEvaluator,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<TaskInstance>, CoreError>
where
    St: OccurrenceStore,
{
    let to = series.recurrence_end_date.map_or(to, |end| end.min(to));
    let mut created = Vec::new();

    for due_date in evaluator.occurrences_between(from, to, &series.exdates) {
        if store.find_instance(series.id, due_date).await?.is_some() {
            tracing::debug!(series_id = %series.id, %due_date, "instance already exists");
            continue;
        }
        let instance = TaskInstance::for_occurrence(series, due_date);
        store.create_instance(&instance).await?;
        created.push(instance);
    }

    Ok(created)
}

async fn load_owned_instance<St>(
    store: &mut St,
    series_id: Uuid,
    instance_id: Uuid,
) -> Result<(RecurringSeries, TaskInstance), CoreError>
where
    St: OccurrenceStore,
{
    let series = store
        .get_series(series_id)
        .await?
        .ok_or_else(|| series_not_found(series_id))?;

    let instance = store
        .find_instance_by_id(instance_id)
        .await?
        .filter(|instance| instance.series_id == Some(series_id))
        .ok_or_else(|| {
            CoreError::NotFound(format!(
                "Instance {} not found in series {}",
                instance_id, series_id
            ))
        })?;

    Ok((series, instance))
}

fn validate_end_date(start: NaiveDate, end: Option<NaiveDate>) -> Result<(), CoreError> {
    match end {
        Some(end) if end < start => Err(CoreError::InvalidInput(format!(
            "Recurrence end date {} is before start date {}",
            end, start
        ))),
        _ => Ok(()),
    }
}

fn series_not_found(id: Uuid) -> CoreError {
    CoreError::NotFound(format!("Series with id {} not found", id))
}

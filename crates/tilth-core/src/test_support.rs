//! Shared fixtures for unit tests.

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use mockable::Clock;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{NewSeriesData, RecurrenceConfig, TaskInstance, TaskStatus};
use crate::repository::{InMemoryStorage, InstanceStore, OccurrenceStore, Storage};
use crate::series::SeriesManager;
use crate::tasks::TaskService;

/// A clock frozen at noon UTC of a given day.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    pub fn on(date: NaiveDate) -> Self {
        let noon = date.and_hms_opt(12, 0, 0).unwrap();
        Self(Utc.from_utc_datetime(&noon))
    }
}

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub struct Harness {
    pub storage: Arc<InMemoryStorage>,
    pub series: SeriesManager<InMemoryStorage, FixedClock>,
    pub tasks: TaskService<InMemoryStorage, FixedClock>,
    pub plan_id: Uuid,
}

impl Harness {
    /// Managers over a fresh in-memory store with "today" fixed at `today`.
    pub fn new(today: NaiveDate) -> Self {
        Self::with_config(today, RecurrenceConfig::default())
    }

    pub fn with_config(today: NaiveDate, config: RecurrenceConfig) -> Self {
        let storage = Arc::new(InMemoryStorage::new());
        let clock = Arc::new(FixedClock::on(today));
        Self {
            series: SeriesManager::new(Arc::clone(&storage), Arc::clone(&clock), config.clone()),
            tasks: TaskService::new(Arc::clone(&storage), clock, config),
            storage,
            plan_id: Uuid::now_v7(),
        }
    }

    pub fn new_series(&self, rule: &str, start: NaiveDate) -> NewSeriesData {
        NewSeriesData {
            name: "Water tomatoes".to_string(),
            description: Some("Deep soak at the base".to_string()),
            recurrence_rule: rule.to_string(),
            start_date: start,
            recurrence_end_date: None,
            plan_id: self.plan_id,
            planting_id: None,
            exdates: Default::default(),
        }
    }
}

impl Harness {
    /// Overwrites a task's status directly in storage, bypassing the
    /// completion hook.
    pub async fn force_status(&self, id: Uuid, status: TaskStatus) {
        let mut store = self.storage.begin().await.unwrap();
        let mut task = store.find_instance_by_id(id).await.unwrap().unwrap();
        task.status = status;
        store.update_instance(&task).await.unwrap();
        store.commit().await.unwrap();
    }

    /// Writes a task row as-is, skipping rule validation.
    pub async fn insert_raw(&self, task: &TaskInstance) {
        let mut store = self.storage.begin().await.unwrap();
        store.create_instance(task).await.unwrap();
        store.commit().await.unwrap();
    }
}

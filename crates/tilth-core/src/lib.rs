//! # Tilth Core Library
//!
//! Recurring task management for garden plans: recurrence rules expanded
//! into dated task instances that stay consistent as rules, single
//! instances and completions change.
//!
//! ## Features
//!
//! - **Series-Based Recurrence**: persisted series with a forward window of
//!   materialized instances, regenerated when the rule or end date changes
//! - **Exclusions**: detached and deleted instances are remembered per series
//!   so nothing resurrects them
//! - **Completion-Driven Generation**: completing an instance creates the
//!   next missing occurrence, bounded by end date and a year horizon
//! - **Read-Time Expansion**: tasks that carry their own rule are expanded
//!   on listing without touching storage
//! - **Unit of Work Storage**: SQLite via sqlx, plus an in-memory adapter
//!
//! ## Core Modules
//!
//! - [`db`]: Database connection and migration management
//! - [`models`]: Core data structures and transfer objects
//! - [`recurrence`]: Rule evaluation over whole dates
//! - [`repository`]: Storage ports and adapters
//! - [`series`]: Series lifecycle management
//! - [`completion`]: Completion-driven generation
//! - [`tasks`]: Task operations and plan listings
//! - [`expansion`]: Read-time virtual expansion
//! - [`error`]: Error types
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use chrono::NaiveDate;
//! use mockable::DefaultClock;
//! use tilth_core::{
//!     db, models::{NewSeriesData, RecurrenceConfig},
//!     repository::SqliteStorage, series::SeriesManager,
//! };
//! use uuid::Uuid;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pool = db::establish_connection("tilth.db").await?;
//!     let storage = Arc::new(SqliteStorage::new(pool));
//!     let manager = SeriesManager::new(storage, Arc::new(DefaultClock), RecurrenceConfig::default());
//!
//!     let series = manager
//!         .create_series(NewSeriesData {
//!             name: "Water tomatoes".to_string(),
//!             description: None,
//!             recurrence_rule: "FREQ=WEEKLY;BYDAY=MO,TH".to_string(),
//!             start_date: NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
//!             recurrence_end_date: None,
//!             plan_id: Uuid::now_v7(),
//!             planting_id: None,
//!             exdates: Default::default(),
//!         })
//!         .await?;
//!     println!("Created series: {}", series.name);
//!
//!     Ok(())
//! }
//! ```

pub mod completion;
pub mod db;
pub mod error;
pub mod expansion;
pub mod models;
pub mod recurrence;
pub mod repository;
pub mod series;
pub mod tasks;

#[cfg(test)]
mod test_support;

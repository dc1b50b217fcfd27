use crate::error::CoreError;
use crate::models::RecurringSeries;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Sqlite, Transaction};
use std::collections::BTreeSet;
use uuid::Uuid;

use super::sqlite::SqliteStore;
use super::SeriesRow;

impl SqliteStore {
    async fn load_exdates_in_transaction(
        tx: &mut Transaction<'static, Sqlite>,
        series_id: Uuid,
    ) -> Result<BTreeSet<NaiveDate>, CoreError> {
        let dates: Vec<NaiveDate> =
            sqlx::query_scalar("SELECT exdate FROM series_exdates WHERE series_id = $1")
                .bind(series_id)
                .fetch_all(&mut **tx)
                .await?;
        Ok(dates.into_iter().collect())
    }

    async fn write_exdates_in_transaction(
        tx: &mut Transaction<'static, Sqlite>,
        series: &RecurringSeries,
    ) -> Result<(), CoreError> {
        sqlx::query("DELETE FROM series_exdates WHERE series_id = $1")
            .bind(series.id)
            .execute(&mut **tx)
            .await?;

        for exdate in &series.exdates {
            sqlx::query("INSERT OR IGNORE INTO series_exdates (series_id, exdate) VALUES ($1, $2)")
                .bind(series.id)
                .bind(exdate)
                .execute(&mut **tx)
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl super::SeriesStore for SqliteStore {
    async fn get_series(&mut self, id: Uuid) -> Result<Option<RecurringSeries>, CoreError> {
        let row: Option<SeriesRow> = sqlx::query_as("SELECT * FROM recurring_series WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;

        match row {
            Some(row) => {
                let exdates = Self::load_exdates_in_transaction(&mut self.tx, id).await?;
                Ok(Some(row.into_series(exdates)))
            }
            None => Ok(None),
        }
    }

    async fn insert_series(&mut self, series: &RecurringSeries) -> Result<(), CoreError> {
        sqlx::query(
            r#"INSERT INTO recurring_series (id, name, description, recurrence_rule, start_date, recurrence_end_date, plan_id, planting_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"#,
        )
        .bind(series.id)
        .bind(&series.name)
        .bind(&series.description)
        .bind(&series.recurrence_rule)
        .bind(series.start_date)
        .bind(series.recurrence_end_date)
        .bind(series.plan_id)
        .bind(series.planting_id)
        .bind(series.created_at)
        .bind(series.updated_at)
        .execute(&mut *self.tx)
        .await?;

        Self::write_exdates_in_transaction(&mut self.tx, series).await
    }

    async fn save_series(&mut self, series: &RecurringSeries) -> Result<(), CoreError> {
        let result = sqlx::query(
            r#"UPDATE recurring_series
            SET name = $1, description = $2, recurrence_rule = $3, start_date = $4,
                recurrence_end_date = $5, planting_id = $6, updated_at = $7
            WHERE id = $8"#,
        )
        .bind(&series.name)
        .bind(&series.description)
        .bind(&series.recurrence_rule)
        .bind(series.start_date)
        .bind(series.recurrence_end_date)
        .bind(series.planting_id)
        .bind(series.updated_at)
        .bind(series.id)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!(
                "Series with id {} not found",
                series.id
            )));
        }

        Self::write_exdates_in_transaction(&mut self.tx, series).await
    }

    async fn delete_series(&mut self, id: Uuid) -> Result<bool, CoreError> {
        // Explicit cascade; does not rely on the foreign_keys pragma
        sqlx::query("DELETE FROM tasks WHERE series_id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        sqlx::query("DELETE FROM series_exdates WHERE series_id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        let result = sqlx::query("DELETE FROM recurring_series WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_plan_series(&mut self, plan_id: Uuid) -> Result<Vec<RecurringSeries>, CoreError> {
        let rows: Vec<SeriesRow> = sqlx::query_as(
            "SELECT * FROM recurring_series WHERE plan_id = $1 ORDER BY start_date, name",
        )
        .bind(plan_id)
        .fetch_all(&mut *self.tx)
        .await?;

        let mut series = Vec::with_capacity(rows.len());
        for row in rows {
            let exdates = Self::load_exdates_in_transaction(&mut self.tx, row.id).await?;
            series.push(row.into_series(exdates));
        }
        Ok(series)
    }
}

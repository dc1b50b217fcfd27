use crate::error::CoreError;
use crate::models::{TaskInstance, TaskStatus};
use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use super::sqlite::SqliteStore;
use super::{rows_into_tasks, TaskRow};

const TASK_ORDER: &str = "ORDER BY due_date IS NULL, due_date, created_at";

#[async_trait]
impl super::InstanceStore for SqliteStore {
    async fn create_instance(&mut self, instance: &TaskInstance) -> Result<(), CoreError> {
        sqlx::query(
            r#"INSERT INTO tasks (id, name, description, due_date, status, plan_id, planting_id, series_id, recurrence_rule, exdates, completed_dates, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)"#,
        )
        .bind(instance.id)
        .bind(&instance.name)
        .bind(&instance.description)
        .bind(instance.due_date)
        .bind(instance.status)
        .bind(instance.plan_id)
        .bind(instance.planting_id)
        .bind(instance.series_id)
        .bind(&instance.recurrence_rule)
        .bind(serde_json::to_string(&instance.exdates)?)
        .bind(serde_json::to_string(&instance.completed_dates)?)
        .bind(instance.created_at)
        .bind(instance.updated_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn find_instance(
        &mut self,
        series_id: Uuid,
        due_date: NaiveDate,
    ) -> Result<Option<TaskInstance>, CoreError> {
        let row: Option<TaskRow> =
            sqlx::query_as("SELECT * FROM tasks WHERE series_id = $1 AND due_date = $2")
                .bind(series_id)
                .bind(due_date)
                .fetch_optional(&mut *self.tx)
                .await?;
        row.map(TaskInstance::try_from).transpose()
    }

    async fn find_instance_by_id(&mut self, id: Uuid) -> Result<Option<TaskInstance>, CoreError> {
        let row: Option<TaskRow> = sqlx::query_as("SELECT * FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.map(TaskInstance::try_from).transpose()
    }

    async fn update_instance(&mut self, instance: &TaskInstance) -> Result<(), CoreError> {
        let result = sqlx::query(
            r#"UPDATE tasks
            SET name = $1, description = $2, due_date = $3, status = $4, planting_id = $5,
                series_id = $6, recurrence_rule = $7, exdates = $8, completed_dates = $9,
                updated_at = $10
            WHERE id = $11"#,
        )
        .bind(&instance.name)
        .bind(&instance.description)
        .bind(instance.due_date)
        .bind(instance.status)
        .bind(instance.planting_id)
        .bind(instance.series_id)
        .bind(&instance.recurrence_rule)
        .bind(serde_json::to_string(&instance.exdates)?)
        .bind(serde_json::to_string(&instance.completed_dates)?)
        .bind(instance.updated_at)
        .bind(instance.id)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!(
                "Task with id {} not found",
                instance.id
            )));
        }
        Ok(())
    }

    async fn delete_instance(&mut self, id: Uuid) -> Result<bool, CoreError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_pending_instances_from(
        &mut self,
        series_id: Uuid,
        from: NaiveDate,
    ) -> Result<u64, CoreError> {
        let result = sqlx::query(
            "DELETE FROM tasks WHERE series_id = $1 AND status = $2 AND due_date >= $3",
        )
        .bind(series_id)
        .bind(TaskStatus::Pending)
        .bind(from)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected())
    }

    async fn list_series_instances(&mut self, series_id: Uuid) -> Result<Vec<TaskInstance>, CoreError> {
        let rows: Vec<TaskRow> =
            sqlx::query_as(&format!("SELECT * FROM tasks WHERE series_id = $1 {}", TASK_ORDER))
                .bind(series_id)
                .fetch_all(&mut *self.tx)
                .await?;
        rows_into_tasks(rows)
    }

    async fn list_plan_tasks(&mut self, plan_id: Uuid) -> Result<Vec<TaskInstance>, CoreError> {
        let rows: Vec<TaskRow> =
            sqlx::query_as(&format!("SELECT * FROM tasks WHERE plan_id = $1 {}", TASK_ORDER))
                .bind(plan_id)
                .fetch_all(&mut *self.tx)
                .await?;
        rows_into_tasks(rows)
    }
}

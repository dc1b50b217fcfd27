use anyhow::Result;
use mockable::Clock;
use tilth_core::models::{TaskStatus, UpdateTaskData};
use tilth_core::repository::Storage;
use tilth_core::tasks::TaskService;

use crate::cli::{EditCommand, TaskFields};
use crate::commands::r#do::report_outcome;
use crate::parser::parse_date;
use crate::util::parse_id;

pub async fn edit_task<S, C>(tasks: &TaskService<S, C>, command: EditCommand) -> Result<()>
where
    S: Storage,
    C: Clock + Send + Sync,
{
    let task_id = parse_id(&command.id)?;
    let update_data = update_data_from(command.fields)?;

    let outcome = tasks.update_task(task_id, update_data).await?;
    report_outcome(&outcome);

    Ok(())
}

/// Turns the edit flags into an update; `--*-clear` flags set a field to none.
pub fn update_data_from(fields: TaskFields) -> Result<UpdateTaskData> {
    let description = if fields.description_clear {
        Some(None)
    } else {
        fields.description.map(Some)
    };

    let due_date = if fields.due_clear {
        Some(None)
    } else if let Some(due_str) = fields.due {
        Some(Some(parse_date(&due_str)?))
    } else {
        None
    };

    let status = fields
        .status
        .map(|s| s.parse::<TaskStatus>())
        .transpose()?;

    Ok(UpdateTaskData {
        name: fields.name,
        description,
        due_date,
        status,
    })
}

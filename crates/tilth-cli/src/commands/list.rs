use anyhow::Result;
use mockable::Clock;
use tilth_core::repository::Storage;
use tilth_core::tasks::TaskService;
use uuid::Uuid;

use crate::cli::ListCommand;
use crate::parser::parse_optional_date;
use crate::views::table::display_tasks;

pub async fn list_tasks<S, C>(
    tasks: &TaskService<S, C>,
    plan_id: Uuid,
    command: ListCommand,
) -> Result<()>
where
    S: Storage,
    C: Clock + Send + Sync,
{
    let from = parse_optional_date(command.from.as_deref())?;
    let to = parse_optional_date(command.to.as_deref())?;

    let listed = tasks.list_plan_tasks(plan_id, from, to).await?;
    display_tasks(&listed);

    Ok(())
}

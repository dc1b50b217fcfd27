use anyhow::Result;
use dialoguer::Confirm;
use mockable::Clock;
use tilth_core::repository::Storage;
use tilth_core::tasks::TaskService;

use crate::cli::DeleteCommand;
use crate::util::parse_id;

pub async fn delete_task<S, C>(tasks: &TaskService<S, C>, command: DeleteCommand) -> Result<()>
where
    S: Storage,
    C: Clock + Send + Sync,
{
    let task_id = parse_id(&command.id)?;
    let task = tasks.get_task(task_id).await?;

    if !command.force && !confirm(&format!("Are you sure you want to delete task '{}'?", task.name)) {
        println!("Deletion cancelled.");
        return Ok(());
    }

    tasks.delete_task(task_id).await?;
    println!("Deleted task: '{}'", task.name);
    if task.series_id.is_some() {
        if let Some(due_date) = task.due_date {
            println!("  {} will not be scheduled again", due_date);
        }
    }

    Ok(())
}

/// Asks for a yes/no answer; anything but an explicit yes is a no.
pub fn confirm(prompt: &str) -> bool {
    Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .unwrap_or(false)
}

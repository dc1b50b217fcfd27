use anyhow::Result;
use mockable::Clock;
use owo_colors::{OwoColorize, Style};
use tilth_core::models::TaskUpdateOutcome;
use tilth_core::repository::Storage;
use tilth_core::tasks::TaskService;

use crate::cli::{DoCommand, DoneOnCommand};
use crate::parser::parse_date;
use crate::util::parse_id;

pub async fn do_task<S, C>(tasks: &TaskService<S, C>, command: DoCommand) -> Result<()>
where
    S: Storage,
    C: Clock + Send + Sync,
{
    let task_id = parse_id(&command.id)?;
    let outcome = tasks.complete_task(task_id).await?;
    report_outcome(&outcome);
    Ok(())
}

pub async fn done_on<S, C>(tasks: &TaskService<S, C>, command: DoneOnCommand) -> Result<()>
where
    S: Storage,
    C: Clock + Send + Sync,
{
    let task_id = parse_id(&command.id)?;
    let date = parse_date(&command.date)?;
    let task = tasks.complete_task_occurrence(task_id, date).await?;

    println!(
        "{} Completed '{}' for {}",
        "✓".style(Style::new().green().bold()),
        task.name,
        date
    );
    Ok(())
}

/// Prints a completion, and the instance it generated if there is one.
pub fn report_outcome(outcome: &TaskUpdateOutcome) {
    match outcome {
        TaskUpdateOutcome::Updated(task) => {
            println!("Updated task: '{}'", task.name);
        }
        TaskUpdateOutcome::Completed { completed, next } => {
            println!(
                "{} Completed task: '{}'",
                "✓".style(Style::new().green().bold()),
                completed.name
            );
            if let Some(next) = next {
                let due = next
                    .due_date
                    .map_or_else(|| "no date".to_string(), |d| d.to_string());
                println!("  {} Next instance due {}", "→".style(Style::new().blue()), due);
                println!("  {} ID: {}", "→".style(Style::new().blue()), next.id);
            }
        }
    }
}

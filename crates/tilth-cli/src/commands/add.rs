use anyhow::Result;
use mockable::Clock;
use owo_colors::{OwoColorize, Style};
use tilth_core::models::NewTaskData;
use tilth_core::repository::Storage;
use tilth_core::tasks::TaskService;
use uuid::Uuid;

use crate::cli::{rule_from_args, AddCommand};
use crate::parser::{parse_dates, parse_optional_date};
use crate::util::parse_optional_id;

pub async fn add_task<S, C>(tasks: &TaskService<S, C>, plan_id: Uuid, command: AddCommand) -> Result<()>
where
    S: Storage,
    C: Clock + Send + Sync,
{
    let due_date = parse_optional_date(command.due.as_deref())?;
    let recurrence_rule = rule_from_args(command.rule, command.every);

    let new_task_data = NewTaskData {
        name: command.name,
        description: command.description,
        due_date,
        status: None,
        plan_id,
        planting_id: parse_optional_id(command.planting.as_deref())?,
        recurrence_rule,
        exdates: parse_dates(&command.exdate)?,
    };

    let added_task = tasks.create_task(new_task_data).await?;

    let success_style = Style::new().green().bold();
    let info_style = Style::new().blue();

    if let Some(rule) = &added_task.recurrence_rule {
        println!(
            "{} Created recurring task: {}",
            "✓".style(success_style),
            added_task.name.bright_white().bold()
        );
        println!("  {} Rule: {}", "→".style(info_style), rule);
    } else {
        println!(
            "{} Created task: {}",
            "✓".style(success_style),
            added_task.name.bright_white().bold()
        );
    }
    if let Some(due_date) = added_task.due_date {
        println!("  {} Due: {}", "→".style(info_style), due_date);
    }
    println!("  {} ID: {}", "→".style(info_style), added_task.id);

    Ok(())
}

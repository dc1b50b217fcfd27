use anyhow::Result;
use mockable::Clock;
use owo_colors::{OwoColorize, Style};
use tilth_core::models::{NewSeriesData, UpdateSeriesData};
use tilth_core::repository::Storage;
use tilth_core::series::SeriesManager;
use uuid::Uuid;

use crate::cli::{
    rule_from_args, AddSeriesCommand, DeleteSeriesCommand, EditInstanceCommand,
    EditSeriesCommand, InstanceCommand, PreviewCommand, SeriesCommand, SeriesIdCommand,
    SeriesSubcommand,
};
use crate::commands::delete::confirm;
use crate::commands::edit::update_data_from;
use crate::parser::{parse_date, parse_dates, parse_optional_date};
use crate::util::{parse_id, parse_optional_id};
use crate::views::table::{display_dates, display_series, display_series_details, display_tasks};

pub async fn series_command<S, C>(
    manager: &SeriesManager<S, C>,
    plan_id: Uuid,
    command: SeriesCommand,
) -> Result<()>
where
    S: Storage,
    C: Clock + Send + Sync,
{
    match command.command {
        SeriesSubcommand::Add(cmd) => add_series(manager, plan_id, cmd).await,
        SeriesSubcommand::List => {
            let series = manager.list_plan_series(plan_id).await?;
            display_series(&series);
            Ok(())
        }
        SeriesSubcommand::Show(cmd) => show_series(manager, cmd).await,
        SeriesSubcommand::Edit(cmd) => edit_series(manager, cmd).await,
        SeriesSubcommand::Preview(cmd) => preview_series(manager, cmd).await,
        SeriesSubcommand::Detach(cmd) => detach_instance(manager, cmd).await,
        SeriesSubcommand::EditInstance(cmd) => edit_instance(manager, cmd).await,
        SeriesSubcommand::DeleteInstance(cmd) => delete_instance(manager, cmd).await,
        SeriesSubcommand::Delete(cmd) => delete_series(manager, cmd).await,
    }
}

async fn add_series<S, C>(
    manager: &SeriesManager<S, C>,
    plan_id: Uuid,
    command: AddSeriesCommand,
) -> Result<()>
where
    S: Storage,
    C: Clock + Send + Sync,
{
    let start_date = parse_optional_date(command.start.as_deref())?
        .unwrap_or_else(|| manager.today());
    let recurrence_rule = rule_from_args(command.rule, command.every).unwrap_or_default();

    let data = NewSeriesData {
        name: command.name,
        description: command.description,
        recurrence_rule,
        start_date,
        recurrence_end_date: parse_optional_date(command.end.as_deref())?,
        plan_id,
        planting_id: parse_optional_id(command.planting.as_deref())?,
        exdates: parse_dates(&command.exdate)?,
    };

    let series = manager.create_series(data).await?;
    let scheduled = manager.list_instances(series.id).await?.len();

    let info_style = Style::new().blue();
    println!(
        "{} Created series: {}",
        "✓".style(Style::new().green().bold()),
        series.name.bright_white().bold()
    );
    println!("  {} Rule: {}", "→".style(info_style), series.recurrence_rule);
    println!("  {} {} instances scheduled", "→".style(info_style), scheduled);
    println!("  {} ID: {}", "→".style(info_style), series.id);

    Ok(())
}

async fn show_series<S, C>(manager: &SeriesManager<S, C>, command: SeriesIdCommand) -> Result<()>
where
    S: Storage,
    C: Clock + Send + Sync,
{
    let series_id = parse_id(&command.id)?;
    let series = manager.get_series(series_id).await?;
    let instances = manager.list_instances(series_id).await?;

    display_series_details(&series);
    println!();
    display_tasks(&instances);

    Ok(())
}

async fn edit_series<S, C>(manager: &SeriesManager<S, C>, command: EditSeriesCommand) -> Result<()>
where
    S: Storage,
    C: Clock + Send + Sync,
{
    let series_id = parse_id(&command.id)?;

    let description = if command.description_clear {
        Some(None)
    } else {
        command.description.map(Some)
    };
    let recurrence_end_date = if command.end_clear {
        Some(None)
    } else if let Some(end) = command.end {
        Some(Some(parse_date(&end)?))
    } else {
        None
    };
    let exdates = if command.exdates_clear {
        Some(Default::default())
    } else if command.exdates.is_empty() {
        None
    } else {
        Some(parse_dates(&command.exdates)?)
    };

    let update = UpdateSeriesData {
        name: command.name,
        description,
        recurrence_rule: rule_from_args(command.rule, command.every),
        recurrence_end_date,
        exdates,
    };

    let series = manager.update_series(series_id, update).await?;
    println!(
        "{} Updated series: {}",
        "✓".style(Style::new().green().bold()),
        series.name
    );

    Ok(())
}

async fn preview_series<S, C>(manager: &SeriesManager<S, C>, command: PreviewCommand) -> Result<()>
where
    S: Storage,
    C: Clock + Send + Sync,
{
    let series_id = parse_id(&command.id)?;
    let dates = manager.preview(series_id, command.count).await?;
    display_dates(&dates);
    Ok(())
}

async fn detach_instance<S, C>(manager: &SeriesManager<S, C>, command: InstanceCommand) -> Result<()>
where
    S: Storage,
    C: Clock + Send + Sync,
{
    let series_id = parse_id(&command.series_id)?;
    let instance_id = parse_id(&command.instance_id)?;

    let detached = manager.detach_instance(series_id, instance_id).await?;
    println!("Detached '{}' from its series", detached.name);
    println!("  {} ID: {}", "→".style(Style::new().blue()), detached.id);

    Ok(())
}

async fn edit_instance<S, C>(
    manager: &SeriesManager<S, C>,
    command: EditInstanceCommand,
) -> Result<()>
where
    S: Storage,
    C: Clock + Send + Sync,
{
    let series_id = parse_id(&command.series_id)?;
    let instance_id = parse_id(&command.instance_id)?;
    let update_data = update_data_from(command.fields)?;

    let edited = manager
        .edit_instance(series_id, instance_id, update_data)
        .await?;
    println!("Detached and updated '{}'", edited.name);
    println!("  {} ID: {}", "→".style(Style::new().blue()), edited.id);

    Ok(())
}

async fn delete_instance<S, C>(manager: &SeriesManager<S, C>, command: InstanceCommand) -> Result<()>
where
    S: Storage,
    C: Clock + Send + Sync,
{
    let series_id = parse_id(&command.series_id)?;
    let instance_id = parse_id(&command.instance_id)?;

    manager.delete_instance(series_id, instance_id).await?;
    println!("Deleted instance {}", instance_id);

    Ok(())
}

async fn delete_series<S, C>(manager: &SeriesManager<S, C>, command: DeleteSeriesCommand) -> Result<()>
where
    S: Storage,
    C: Clock + Send + Sync,
{
    let series_id = parse_id(&command.id)?;
    let series = manager.get_series(series_id).await?;

    if !command.force
        && !confirm(&format!(
            "Delete series '{}' and all of its instances?",
            series.name
        ))
    {
        println!("Deletion cancelled.");
        return Ok(());
    }

    manager.delete_series(series_id).await?;
    println!("Deleted series: '{}'", series.name);

    Ok(())
}

use chrono::{NaiveDate, Utc};
use comfy_table::{Attribute, Cell, Color, Row, Table};
use tilth_core::models::{RecurringSeries, TaskInstance, TaskStatus};

pub fn display_tasks(tasks: &[TaskInstance]) {
    if tasks.is_empty() {
        println!("No tasks found.");
        return;
    }

    let today = Utc::now().date_naive();
    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Status", "Due Date", "Planting"]);

    for task in tasks {
        let mut row = Row::new();
        row.add_cell(Cell::new(task.id));

        let mut display_name = String::new();
        if task.series_id.is_some() || task.recurrence_rule.is_some() {
            display_name.push('↻');
            display_name.push(' ');
        }
        display_name.push_str(&task.name);

        let name_cell = match task.status {
            TaskStatus::Completed => Cell::new(display_name)
                .add_attribute(Attribute::CrossedOut)
                .fg(Color::DarkGrey),
            TaskStatus::InProgress => Cell::new(display_name).fg(Color::Cyan),
            TaskStatus::Pending => Cell::new(display_name),
        };
        row.add_cell(name_cell);

        let status_cell = match task.status {
            TaskStatus::Completed => Cell::new(task.status).fg(Color::Green),
            TaskStatus::InProgress => Cell::new(task.status).fg(Color::Cyan),
            TaskStatus::Pending => Cell::new(task.status),
        };
        row.add_cell(status_cell);

        row.add_cell(due_date_cell(task.due_date, task.status, today));
        row.add_cell(Cell::new(
            task.planting_id
                .map_or_else(|| "None".to_string(), |id| id.to_string()),
        ));
        table.add_row(row);
    }

    println!("{table}");
}

fn due_date_cell(due_date: Option<NaiveDate>, status: TaskStatus, today: NaiveDate) -> Cell {
    let Some(due_date) = due_date else {
        return Cell::new("None");
    };
    let cell = Cell::new(due_date);
    if status == TaskStatus::Completed {
        return cell;
    }
    if due_date < today {
        cell.fg(Color::Red) // Overdue
    } else if due_date == today {
        cell.fg(Color::Yellow)
    } else {
        cell
    }
}

pub fn display_series(series: &[RecurringSeries]) {
    if series.is_empty() {
        println!("No series found.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Rule", "Start", "End", "Excluded"]);

    for s in series {
        let mut row = Row::new();
        row.add_cell(Cell::new(s.id));
        row.add_cell(Cell::new(&s.name).add_attribute(Attribute::Bold));
        row.add_cell(Cell::new(&s.recurrence_rule));
        row.add_cell(Cell::new(s.start_date));
        row.add_cell(Cell::new(
            s.recurrence_end_date
                .map_or_else(|| "None".to_string(), |d| d.to_string()),
        ));
        row.add_cell(Cell::new(s.exdates.len()));
        table.add_row(row);
    }

    println!("{table}");
}

pub fn display_series_details(series: &RecurringSeries) {
    println!("Series: {}", series.name);
    println!("ID: {}", series.id);
    if let Some(description) = &series.description {
        println!("Description: {}", description);
    }
    println!("Rule: {}", series.recurrence_rule);
    println!("Start: {}", series.start_date);
    match series.recurrence_end_date {
        Some(end) => println!("End: {}", end),
        None => println!("End: None"),
    }
    if series.exdates.is_empty() {
        println!("Excluded: None");
    } else {
        let dates: Vec<String> = series.exdates.iter().map(|d| d.to_string()).collect();
        println!("Excluded: {}", dates.join(", "));
    }
}

pub fn display_dates(dates: &[NaiveDate]) {
    if dates.is_empty() {
        println!("No upcoming dates.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["#", "Date", "Weekday"]);
    for (i, date) in dates.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(date),
            Cell::new(date.format("%A")),
        ]);
    }

    println!("{table}");
}

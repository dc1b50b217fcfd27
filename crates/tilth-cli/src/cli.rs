use clap::{Parser, Subcommand, ValueEnum};

/// Recurring garden task planner
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Garden plan to operate on (defaults to `default_plan_id` from config)
    #[arg(long, global = true)]
    pub plan: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Add a standalone task, optionally with its own recurrence rule
    Add(AddCommand),
    /// List the plan's tasks, expanding tasks that carry their own rule
    List(ListCommand),
    /// Mark a task as completed
    Do(DoCommand),
    /// Mark one occurrence of a self-recurring task as done
    DoneOn(DoneOnCommand),
    /// Edit a task
    Edit(EditCommand),
    /// Delete a task
    Delete(DeleteCommand),
    /// Manage recurring series
    Series(SeriesCommand),
}

#[derive(Parser, Debug, Clone)]
pub struct AddCommand {
    /// The name of the task
    pub name: String,
    /// The description of the task
    #[arg(short, long)]
    pub description: Option<String>,
    /// The due date of the task (ISO date or e.g. "next monday")
    #[arg(long)]
    pub due: Option<String>,
    /// Raw RFC 5545 recurrence rule, expanded when listing
    #[arg(long, conflicts_with = "every", requires = "due")]
    pub rule: Option<String>,
    /// Human-friendly recurrence frequency
    #[arg(long, value_enum, requires = "due")]
    pub every: Option<RecurrenceShortcut>,
    /// Dates skipped when the rule is expanded
    #[arg(long, num_args = 1..)]
    pub exdate: Vec<String>,
    /// Planting this task belongs to
    #[arg(long)]
    pub planting: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct ListCommand {
    /// First day of the expansion window (defaults to today)
    #[arg(long)]
    pub from: Option<String>,
    /// Last day of the expansion window
    #[arg(long)]
    pub to: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct DoCommand {
    /// The ID of the task to mark as completed
    pub id: String,
}

#[derive(Parser, Debug, Clone)]
pub struct DoneOnCommand {
    /// The ID of the self-recurring task
    pub id: String,
    /// The occurrence date that was done
    pub date: String,
}

#[derive(Parser, Debug, Clone)]
pub struct EditCommand {
    /// The ID of the task to edit
    pub id: String,
    #[command(flatten)]
    pub fields: TaskFields,
}

/// Editable task fields, shared by `edit` and `series edit-instance`.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct TaskFields {
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub description: Option<String>,
    #[arg(long, conflicts_with = "description")]
    pub description_clear: bool,

    #[arg(long)]
    pub due: Option<String>,
    #[arg(long, conflicts_with = "due")]
    pub due_clear: bool,

    /// pending, in_progress or completed
    #[arg(long)]
    pub status: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct DeleteCommand {
    /// The ID of the task to delete
    pub id: String,
    /// Force deletion without confirmation
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct SeriesCommand {
    #[command(subcommand)]
    pub command: SeriesSubcommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SeriesSubcommand {
    /// Create a series and schedule its first window of instances
    Add(AddSeriesCommand),
    /// List the plan's series
    List,
    /// Show a series with its instances
    Show(SeriesIdCommand),
    /// Edit a series; rule or end date changes reschedule pending instances
    Edit(EditSeriesCommand),
    /// Show the next dates a series will produce
    Preview(PreviewCommand),
    /// Unlink an instance from its series, keeping it as a standalone task
    Detach(InstanceCommand),
    /// Detach an instance and edit it
    EditInstance(EditInstanceCommand),
    /// Delete one instance and exclude its date from the series
    DeleteInstance(InstanceCommand),
    /// Delete a series and all of its instances
    Delete(DeleteSeriesCommand),
}

#[derive(Parser, Debug, Clone)]
pub struct AddSeriesCommand {
    /// The name of the series
    pub name: String,
    #[arg(short, long)]
    pub description: Option<String>,
    /// Raw RFC 5545 recurrence rule
    #[arg(long, conflicts_with = "every", required_unless_present = "every")]
    pub rule: Option<String>,
    /// Human-friendly recurrence frequency
    #[arg(long, value_enum)]
    pub every: Option<RecurrenceShortcut>,
    /// Anchor date (defaults to today)
    #[arg(long)]
    pub start: Option<String>,
    /// Last date an instance may fall on
    #[arg(long)]
    pub end: Option<String>,
    /// Dates never to schedule
    #[arg(long, num_args = 1..)]
    pub exdate: Vec<String>,
    /// Planting the series belongs to
    #[arg(long)]
    pub planting: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct SeriesIdCommand {
    /// The ID of the series
    pub id: String,
}

#[derive(Parser, Debug, Clone)]
pub struct EditSeriesCommand {
    /// The ID of the series to edit
    pub id: String,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub description: Option<String>,
    #[arg(long, conflicts_with = "description")]
    pub description_clear: bool,

    #[arg(long, conflicts_with = "every")]
    pub rule: Option<String>,
    #[arg(long, value_enum)]
    pub every: Option<RecurrenceShortcut>,

    #[arg(long)]
    pub end: Option<String>,
    #[arg(long, conflicts_with = "end")]
    pub end_clear: bool,

    /// Replace the excluded dates
    #[arg(long, num_args = 1.., conflicts_with = "exdates_clear")]
    pub exdates: Vec<String>,
    #[arg(long)]
    pub exdates_clear: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct PreviewCommand {
    /// The ID of the series
    pub id: String,
    /// Number of dates to show
    #[arg(short = 'n', long, default_value_t = 10)]
    pub count: usize,
}

#[derive(Parser, Debug, Clone)]
pub struct InstanceCommand {
    /// The ID of the series
    pub series_id: String,
    /// The ID of the instance
    pub instance_id: String,
}

#[derive(Parser, Debug, Clone)]
pub struct EditInstanceCommand {
    /// The ID of the series
    pub series_id: String,
    /// The ID of the instance
    pub instance_id: String,
    #[command(flatten)]
    pub fields: TaskFields,
}

#[derive(Parser, Debug, Clone)]
pub struct DeleteSeriesCommand {
    /// The ID of the series to delete
    pub id: String,
    /// Force deletion without confirmation
    #[arg(short, long)]
    pub force: bool,
}

/// Human-friendly recurrence patterns
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecurrenceShortcut {
    /// Every day
    Daily,
    /// Every week (same day)
    Weekly,
    /// Every other week (same day)
    Biweekly,
    /// Every month (same date)
    Monthly,
    /// Every year (same date)
    Yearly,
    /// Saturday and Sunday
    Weekends,
}

impl RecurrenceShortcut {
    /// Convert shortcut to RRULE pattern
    pub fn to_rrule(self) -> &'static str {
        match self {
            RecurrenceShortcut::Daily => "FREQ=DAILY",
            RecurrenceShortcut::Weekly => "FREQ=WEEKLY",
            RecurrenceShortcut::Biweekly => "FREQ=WEEKLY;INTERVAL=2",
            RecurrenceShortcut::Monthly => "FREQ=MONTHLY",
            RecurrenceShortcut::Yearly => "FREQ=YEARLY",
            RecurrenceShortcut::Weekends => "FREQ=WEEKLY;BYDAY=SA,SU",
        }
    }
}

/// Picks the raw rule when given, otherwise the shortcut's rule.
pub fn rule_from_args(rule: Option<String>, every: Option<RecurrenceShortcut>) -> Option<String> {
    rule.or_else(|| every.map(|shortcut| shortcut.to_rrule().to_string()))
}

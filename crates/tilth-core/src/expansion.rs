//! Read-time expansion of tasks that carry their own recurrence rule.
//!
//! Nothing here touches storage: expansion is a pure function of the task
//! rows and the window.

use chrono::NaiveDate;

use crate::error::RuleParseError;
use crate::models::{TaskInstance, TaskStatus};
use crate::recurrence::RuleEvaluator;

/// Expands one task into its virtual occurrences inside `[start, end]`.
///
/// A task without a rule or without a due date (the anchor) yields itself.
/// Each occurrence copies the task with its own due date; dates found in
/// `completed_dates` come back as Completed.
pub fn expand_for_window(
    task: &TaskInstance,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<TaskInstance>, RuleParseError> {
    let (Some(rule), Some(anchor)) = (task.recurrence_rule.as_deref(), task.due_date) else {
        return Ok(vec![task.clone()]);
    };

    let evaluator = RuleEvaluator::new(rule, anchor)?;
    let occurrences = evaluator
        .occurrences_between(start, end, &task.exdates)
        .into_iter()
        .map(|date| {
            let mut occurrence = task.clone();
            occurrence.due_date = Some(date);
            if task.completed_dates.contains(&date) {
                occurrence.status = TaskStatus::Completed;
            }
            occurrence
        })
        .collect();

    Ok(occurrences)
}

/// Expands every task, degrading a task with a malformed rule to its single
/// raw record instead of failing the listing.
pub fn expand_tasks_for_window(
    tasks: &[TaskInstance],
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<TaskInstance> {
    let mut expanded = Vec::with_capacity(tasks.len());

    for task in tasks {
        match expand_for_window(task, start, end) {
            Ok(occurrences) => expanded.extend(occurrences),
            Err(err) => {
                tracing::warn!(task_id = %task.id, error = %err, "could not expand task, listing it unexpanded");
                expanded.push(task.clone());
            }
        }
    }

    expanded
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn recurring_task(rule: &str, due: NaiveDate) -> TaskInstance {
        TaskInstance {
            name: "Check seedlings".to_string(),
            plan_id: Uuid::now_v7(),
            due_date: Some(due),
            recurrence_rule: Some(rule.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_plain_task_yields_itself() {
        let task = TaskInstance {
            name: "Order seeds".to_string(),
            due_date: Some(date(2030, 1, 1)),
            ..Default::default()
        };
        let expanded = expand_for_window(&task, date(2025, 1, 1), date(2025, 1, 31)).unwrap();
        assert_eq!(expanded, vec![task]);
    }

    #[test]
    fn test_rule_without_due_date_yields_itself() {
        let mut task = recurring_task("FREQ=DAILY", date(2025, 1, 1));
        task.due_date = None;
        let expanded = expand_for_window(&task, date(2025, 1, 1), date(2025, 1, 31)).unwrap();
        assert_eq!(expanded.len(), 1);
        assert_eq!(expanded[0].due_date, None);
    }

    #[test]
    fn test_expansion_marks_completed_and_skips_exdates() {
        let mut task = recurring_task("FREQ=WEEKLY", date(2025, 1, 1));
        task.exdates.insert(date(2025, 1, 15));
        task.completed_dates.insert(date(2025, 1, 8));

        let expanded = expand_for_window(&task, date(2025, 1, 1), date(2025, 1, 22)).unwrap();

        let dates: Vec<_> = expanded.iter().map(|t| t.due_date.unwrap()).collect();
        assert_eq!(dates, vec![date(2025, 1, 1), date(2025, 1, 8), date(2025, 1, 22)]);
        assert_eq!(expanded[0].status, TaskStatus::Pending);
        assert_eq!(expanded[1].status, TaskStatus::Completed);
        assert!(expanded.iter().all(|t| t.id == task.id && t.name == task.name));
    }

    #[test]
    fn test_expansion_is_idempotent() {
        let task = recurring_task("FREQ=DAILY;INTERVAL=3", date(2025, 2, 1));
        let first = expand_for_window(&task, date(2025, 2, 1), date(2025, 3, 1)).unwrap();
        let second = expand_for_window(&task, date(2025, 2, 1), date(2025, 3, 1)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_malformed_rule_is_reported() {
        let task = recurring_task("FREQ=SOMETIMES", date(2025, 1, 1));
        assert!(expand_for_window(&task, date(2025, 1, 1), date(2025, 2, 1)).is_err());
    }

    #[test]
    fn test_malformed_rule_degrades_without_hiding_others() {
        let broken = recurring_task("NOT A RULE", date(2025, 1, 1));
        let weekly = recurring_task("FREQ=WEEKLY", date(2025, 1, 1));
        let plain = TaskInstance {
            name: "Turn compost".to_string(),
            due_date: Some(date(2025, 1, 3)),
            ..Default::default()
        };

        let expanded = expand_tasks_for_window(
            &[broken.clone(), weekly.clone(), plain.clone()],
            date(2025, 1, 1),
            date(2025, 1, 15),
        );

        assert_eq!(expanded.iter().filter(|t| t.id == broken.id).count(), 1);
        assert_eq!(expanded.iter().filter(|t| t.id == weekly.id).count(), 3);
        assert_eq!(expanded.iter().filter(|t| t.id == plain.id).count(), 1);
        let raw = expanded.iter().find(|t| t.id == broken.id).unwrap();
        assert_eq!(raw, &broken);
    }
}

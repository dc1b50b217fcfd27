//! Completion-driven generation: completing one series instance
//! materializes the next occurrence that does not exist yet.

use chrono::Datelike;
use std::collections::HashSet;

use crate::error::CoreError;
use crate::models::TaskInstance;
use crate::recurrence::RuleEvaluator;
use crate::repository::OccurrenceStore;

/// Default number of years a completion scan may run past its anchor.
pub const HORIZON_YEARS: i32 = 5;

/// Generates at most one follow-up instance for a freshly completed one.
///
/// Callers invoke this only on the transition into Completed.
///
/// # Arguments
/// * `store` - Unit of work the new instance is written into
/// * `completed` - The instance that was just completed
/// * `horizon_years` - Scan stops once a candidate's year exceeds the anchor year by this much
///
/// # Returns
/// * `Ok(Some(instance))` - the newly created Pending instance
/// * `Ok(None)` - standalone task, series gone, end date or horizon reached,
///   or the rule ran out of occurrences
///
/// # Behavior
/// The rule is re-anchored at the completed instance's due date and scanned
/// forward one date at a time, skipping excluded dates and dates the series
/// already has an instance for.
pub async fn on_instance_completed<S>(
    store: &mut S,
    completed: &TaskInstance,
    horizon_years: i32,
) -> Result<Option<TaskInstance>, CoreError>
where
    S: OccurrenceStore,
{
    let (Some(series_id), Some(anchor)) = (completed.series_id, completed.due_date) else {
        return Ok(None);
    };

    let Some(series) = store.get_series(series_id).await? else {
        tracing::warn!(%series_id, task_id = %completed.id, "completed instance points at a missing series");
        return Ok(None);
    };

    let evaluator = match RuleEvaluator::new(&series.recurrence_rule, anchor) {
        Ok(evaluator) => evaluator,
        // An UNTIL term earlier than the new anchor no longer validates; the
        // rule is simply exhausted at this point.
        Err(err) => {
            if RuleEvaluator::validate(&series.recurrence_rule, series.start_date).is_ok() {
                tracing::debug!(%series_id, %anchor, "rule has no occurrences after anchor");
                return Ok(None);
            }
            return Err(err.into());
        }
    };

    let existing: HashSet<_> = store
        .list_series_instances(series_id)
        .await?
        .into_iter()
        .filter_map(|instance| instance.due_date)
        .collect();

    let horizon_year = anchor.year() + horizon_years;
    let mut next_date = None;

    for candidate in evaluator.occurrences_after(anchor) {
        if series.is_past_end(candidate) {
            tracing::debug!(%series_id, %candidate, "series end date reached");
            break;
        }
        if candidate.year() > horizon_year {
            tracing::warn!(%series_id, %candidate, horizon_year, "completion scan hit the horizon");
            break;
        }
        if series.is_excluded(candidate) || existing.contains(&candidate) {
            continue;
        }
        next_date = Some(candidate);
        break;
    }

    let Some(due_date) = next_date else {
        return Ok(None);
    };

    let next = TaskInstance::for_occurrence(&series, due_date);
    store.create_instance(&next).await?;

    tracing::info!(%series_id, %due_date, task_id = %next.id, "generated next instance");
    Ok(Some(next))
}

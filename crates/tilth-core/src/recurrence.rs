use chrono::NaiveDate;
use rrule::RRuleSet;
use std::collections::BTreeSet;

use crate::error::RuleParseError;

/// Upper bound on dates returned by a single window evaluation.
pub const MAX_WINDOW_OCCURRENCES: usize = 10_000;

/// Upper bound on raw rule instants inspected by any single scan.
const MAX_RAW_OCCURRENCES: usize = 200_000;

/// Frequencies finer than a day; occurrences are whole dates.
const SUB_DAILY_FREQUENCIES: [&str; 3] = ["HOURLY", "MINUTELY", "SECONDLY"];

/// RuleEvaluator: expands an RRULE anchored at a calendar date into dates.
///
/// Responsibilities:
/// 1. Normalize rule text coming from editors into the RFC 5545 subset rrule parses
/// 2. Anchor the rule at midnight UTC of the anchor date
/// 3. Produce sorted, duplicate-free dates inside inclusive windows
/// 4. Provide an open-ended forward scan for completion-driven generation
#[derive(Debug, Clone)]
pub struct RuleEvaluator {
    /// Normalized RRULE body (no `RRULE:` prefix, no DTSTART)
    rule: String,
    anchor: NaiveDate,
    rrule_set: RRuleSet,
}

impl RuleEvaluator {
    /// Parses `rule` anchored at `anchor`.
    ///
    /// # Arguments
    /// * `rule` - RRULE text, with or without an `RRULE:` prefix
    /// * `anchor` - Series start date; time of day is fixed at 00:00 UTC
    ///
    /// # Returns
    /// * `Result<Self, RuleParseError>` - evaluator or the parser's complaint
    pub fn new(rule: &str, anchor: NaiveDate) -> Result<Self, RuleParseError> {
        let normalized = normalize_rule(rule);
        if normalized.is_empty() {
            return Err(RuleParseError::new(rule, "rule is empty"));
        }
        if let Some(freq) = frequency(&normalized) {
            if SUB_DAILY_FREQUENCIES.contains(&freq.as_str()) {
                return Err(RuleParseError::new(
                    rule,
                    format!("FREQ={} is finer than a day", freq),
                ));
            }
        }

        let rrule_string = format!(
            "DTSTART:{}T000000Z\nRRULE:{}",
            anchor.format("%Y%m%d"),
            normalized
        );

        let rrule_set = rrule_string
            .parse::<RRuleSet>()
            .map_err(|e| RuleParseError::new(rule, e))?;

        Ok(Self {
            rule: normalized,
            anchor,
            rrule_set,
        })
    }

    /// Checks that `rule` parses when anchored at `anchor`.
    pub fn validate(rule: &str, anchor: NaiveDate) -> Result<(), RuleParseError> {
        Self::new(rule, anchor).map(|_| ())
    }

    pub fn rule(&self) -> &str {
        &self.rule
    }

    pub fn anchor(&self) -> NaiveDate {
        self.anchor
    }

    /// Every date the rule produces, ascending.
    ///
    /// Scans stop after [`MAX_RAW_OCCURRENCES`] instants counted from the
    /// anchor, with a warning, so a window that lies past the cap comes back
    /// short rather than hanging.
    fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        IntoIterator::into_iter(&self.rrule_set)
            .take(MAX_RAW_OCCURRENCES)
            .enumerate()
            .map(move |(index, dt)| {
                if index + 1 == MAX_RAW_OCCURRENCES {
                    tracing::warn!(
                        rule = %self.rule,
                        anchor = %self.anchor,
                        "rule scan stopped after {} instants",
                        MAX_RAW_OCCURRENCES
                    );
                }
                dt.date_naive()
            })
    }

    /// Generates the occurrence dates inside `[start, end]`.
    ///
    /// # Arguments
    /// * `start` - First date of the window (inclusive)
    /// * `end` - Last date of the window (inclusive)
    /// * `exdates` - Dates to leave out
    ///
    /// # Behavior
    /// - Bounds are inclusive on both ends, the anchor included
    /// - Output is sorted and contains each date at most once
    /// - Stops after [`MAX_WINDOW_OCCURRENCES`] dates
    pub fn occurrences_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        exdates: &BTreeSet<NaiveDate>,
    ) -> Vec<NaiveDate> {
        let mut occurrences: Vec<NaiveDate> = Vec::new();
        if start > end {
            return occurrences;
        }

        for date in self.dates() {
            if date > end {
                break;
            }
            if date < start || exdates.contains(&date) || occurrences.last() == Some(&date) {
                continue;
            }
            occurrences.push(date);
            if occurrences.len() >= MAX_WINDOW_OCCURRENCES {
                tracing::warn!(
                    rule = %self.rule,
                    %start,
                    %end,
                    "window evaluation truncated at {} occurrences",
                    MAX_WINDOW_OCCURRENCES
                );
                break;
            }
        }

        occurrences
    }

    /// Lazily yields the distinct occurrence dates strictly after `after`.
    ///
    /// The stream is open-ended for infinite rules; callers bound it.
    pub fn occurrences_after(&self, after: NaiveDate) -> impl Iterator<Item = NaiveDate> + '_ {
        let mut last: Option<NaiveDate> = None;
        self.dates().filter(move |date| {
            if *date <= after || last == Some(*date) {
                return false;
            }
            last = Some(*date);
            true
        })
    }

    /// First occurrence on or after `date`, if the rule reaches it.
    pub fn first_occurrence_on_or_after(&self, date: NaiveDate) -> Option<NaiveDate> {
        self.dates().find(|d| *d >= date)
    }

    /// The next `count` distinct occurrences on or after `from`.
    pub fn preview(&self, from: NaiveDate, count: usize) -> Vec<NaiveDate> {
        let mut result = Vec::with_capacity(count.min(64));
        for date in self.dates() {
            if result.len() >= count {
                break;
            }
            if date < from || result.last() == Some(&date) {
                continue;
            }
            result.push(date);
        }
        result
    }
}

/// Normalizes editor-produced rule text into the RRULE body rrule parses.
///
/// - drops `RRULE:` prefixes and any DTSTART (the anchor date wins)
/// - rewrites the `BYWEEKDAY` alias to `BYDAY`
/// - turns a date-only `UNTIL=YYYYMMDD` into the last second of that day in UTC
pub fn normalize_rule(rule: &str) -> String {
    let mut parts: Vec<String> = Vec::new();

    for line in rule.lines() {
        let line = line.trim();
        let upper = line.to_ascii_uppercase();
        if line.is_empty() || upper.starts_with("DTSTART") || upper.starts_with("EXDATE") {
            continue;
        }
        let body = if upper.starts_with("RRULE:") { &line[6..] } else { line };

        for token in body.split(';').map(str::trim).filter(|t| !t.is_empty()) {
            let Some((key, value)) = token.split_once('=') else {
                parts.push(token.to_string());
                continue;
            };
            let key = key.trim().to_ascii_uppercase();
            let value = value.trim();
            match key.as_str() {
                "DTSTART" => continue,
                "BYWEEKDAY" => parts.push(format!("BYDAY={}", value)),
                "UNTIL" => parts.push(format!("UNTIL={}", normalize_until(value))),
                _ => parts.push(format!("{}={}", key, value)),
            }
        }
    }

    parts.join(";")
}

/// Upper-cased FREQ value of a normalized rule body.
fn frequency(normalized: &str) -> Option<String> {
    normalized
        .split(';')
        .filter_map(|token| token.split_once('='))
        .find(|(key, _)| *key == "FREQ")
        .map(|(_, value)| value.trim().to_ascii_uppercase())
}

fn normalize_until(value: &str) -> String {
    let value = value.to_ascii_uppercase();
    let all_digits = value.chars().all(|c| c.is_ascii_digit());
    if value.len() == 8 && all_digits {
        format!("{}T235959Z", value)
    } else if value.len() == 15 && !value.ends_with('Z') {
        format!("{}Z", value)
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    mod normalize_tests {
        use super::*;

        #[rstest]
        #[case("FREQ=WEEKLY", "FREQ=WEEKLY")]
        #[case("RRULE:FREQ=DAILY;INTERVAL=2", "FREQ=DAILY;INTERVAL=2")]
        #[case("DTSTART:20250101T000000Z\nRRULE:FREQ=DAILY", "FREQ=DAILY")]
        #[case("FREQ=WEEKLY;INTERVAL=1;BYWEEKDAY=MO", "FREQ=WEEKLY;INTERVAL=1;BYDAY=MO")]
        #[case("FREQ=DAILY;UNTIL=20250115", "FREQ=DAILY;UNTIL=20250115T235959Z")]
        #[case("FREQ=DAILY;UNTIL=20250115T120000", "FREQ=DAILY;UNTIL=20250115T120000Z")]
        #[case("freq=weekly;byday=we;", "FREQ=weekly;BYDAY=we")]
        fn test_normalize_rule(#[case] input: &str, #[case] expected: &str) {
            assert_eq!(normalize_rule(input), expected);
        }
    }

    mod evaluator_tests {
        use super::*;

        #[test]
        fn test_new_invalid_rule() {
            let result = RuleEvaluator::new("INVALID_RRULE", date(2025, 1, 1));
            let err = result.unwrap_err();
            assert_eq!(err.rule, "INVALID_RRULE");
        }

        #[test]
        fn test_new_empty_rule() {
            assert!(RuleEvaluator::new("   ", date(2025, 1, 1)).is_err());
        }

        #[test]
        fn test_validate_success() {
            assert!(RuleEvaluator::validate("FREQ=DAILY;INTERVAL=1", date(2025, 1, 1)).is_ok());
            assert!(RuleEvaluator::validate("FREQ=WEEKLY;BYDAY=MO,WE,FR", date(2025, 1, 1)).is_ok());
            assert!(RuleEvaluator::validate("FREQ=MONTHLY;BYMONTHDAY=1;COUNT=6", date(2025, 1, 1)).is_ok());
        }

        #[test]
        fn test_weekly_window_includes_anchor() {
            let evaluator = RuleEvaluator::new("FREQ=WEEKLY", date(2025, 1, 1)).unwrap();
            let dates = evaluator.occurrences_between(date(2025, 1, 1), date(2025, 1, 29), &BTreeSet::new());
            assert_eq!(
                dates,
                vec![
                    date(2025, 1, 1),
                    date(2025, 1, 8),
                    date(2025, 1, 15),
                    date(2025, 1, 22),
                    date(2025, 1, 29),
                ]
            );
        }

        #[test]
        fn test_window_bounds_are_inclusive() {
            let evaluator = RuleEvaluator::new("FREQ=WEEKLY", date(2025, 1, 1)).unwrap();
            let dates = evaluator.occurrences_between(date(2025, 1, 8), date(2025, 1, 15), &BTreeSet::new());
            assert_eq!(dates, vec![date(2025, 1, 8), date(2025, 1, 15)]);
        }

        #[test]
        fn test_exdates_are_skipped() {
            let evaluator = RuleEvaluator::new("FREQ=DAILY", date(2025, 1, 1)).unwrap();
            let exdates: BTreeSet<_> = [date(2025, 1, 2), date(2025, 1, 4)].into_iter().collect();
            let dates = evaluator.occurrences_between(date(2025, 1, 1), date(2025, 1, 5), &exdates);
            assert_eq!(dates, vec![date(2025, 1, 1), date(2025, 1, 3), date(2025, 1, 5)]);
        }

        #[test]
        fn test_byday_rule_skips_non_matching_anchor() {
            // 2025-01-01 is a Wednesday
            let evaluator = RuleEvaluator::new("FREQ=WEEKLY;BYDAY=MO", date(2025, 1, 1)).unwrap();
            let dates = evaluator.occurrences_between(date(2025, 1, 1), date(2025, 1, 20), &BTreeSet::new());
            assert_eq!(dates, vec![date(2025, 1, 6), date(2025, 1, 13), date(2025, 1, 20)]);
        }

        #[test]
        fn test_byweekday_alias_is_accepted() {
            let evaluator = RuleEvaluator::new("FREQ=WEEKLY;INTERVAL=1;BYWEEKDAY=WE", date(2025, 11, 26)).unwrap();
            let dates = evaluator.occurrences_between(date(2025, 11, 18), date(2025, 12, 10), &BTreeSet::new());
            assert_eq!(dates, vec![date(2025, 11, 26), date(2025, 12, 3), date(2025, 12, 10)]);
        }

        #[test]
        fn test_date_only_until_includes_last_day() {
            let evaluator = RuleEvaluator::new("FREQ=DAILY;UNTIL=20250115", date(2025, 1, 1)).unwrap();
            let dates = evaluator.occurrences_between(date(2025, 1, 1), date(2025, 12, 31), &BTreeSet::new());
            assert_eq!(dates.len(), 15);
            assert_eq!(dates.last(), Some(&date(2025, 1, 15)));
        }

        #[rstest]
        #[case("FREQ=HOURLY;INTERVAL=6")]
        #[case("FREQ=MINUTELY")]
        #[case("freq=secondly;interval=30")]
        #[case("RRULE:FREQ=minutely;UNTIL=20250115")]
        fn test_sub_daily_rule_is_rejected(#[case] rule: &str) {
            let err = RuleEvaluator::new(rule, date(2024, 1, 1)).unwrap_err();
            assert_eq!(err.rule, rule);
            assert!(err.reason.contains("finer than a day"), "{}", err.reason);
            assert!(RuleEvaluator::validate(rule, date(2024, 1, 1)).is_err());
        }

        #[test]
        fn test_long_running_daily_rule_reaches_distant_window() {
            let evaluator = RuleEvaluator::new("FREQ=DAILY", date(2024, 1, 1)).unwrap();
            let dates = evaluator.occurrences_between(date(2125, 1, 1), date(2125, 1, 3), &BTreeSet::new());
            assert_eq!(dates, vec![date(2125, 1, 1), date(2125, 1, 2), date(2125, 1, 3)]);
        }

        #[test]
        fn test_empty_window_when_start_after_end() {
            let evaluator = RuleEvaluator::new("FREQ=DAILY", date(2025, 1, 1)).unwrap();
            assert!(evaluator
                .occurrences_between(date(2025, 2, 1), date(2025, 1, 1), &BTreeSet::new())
                .is_empty());
        }

        #[test]
        fn test_occurrences_after_is_strict() {
            let evaluator = RuleEvaluator::new("FREQ=WEEKLY", date(2025, 1, 1)).unwrap();
            let next: Vec<_> = evaluator.occurrences_after(date(2025, 1, 1)).take(2).collect();
            assert_eq!(next, vec![date(2025, 1, 8), date(2025, 1, 15)]);
        }

        #[test]
        fn test_occurrences_after_exhausts_finite_rule() {
            let evaluator = RuleEvaluator::new("FREQ=DAILY;COUNT=3", date(2025, 1, 1)).unwrap();
            let rest: Vec<_> = evaluator.occurrences_after(date(2025, 1, 2)).collect();
            assert_eq!(rest, vec![date(2025, 1, 3)]);
        }

        #[test]
        fn test_first_occurrence_on_or_after() {
            let evaluator = RuleEvaluator::new("FREQ=WEEKLY;BYDAY=WE", date(2025, 11, 18)).unwrap();
            assert_eq!(
                evaluator.first_occurrence_on_or_after(date(2025, 11, 18)),
                Some(date(2025, 11, 19))
            );
            assert_eq!(
                evaluator.first_occurrence_on_or_after(date(2025, 11, 19)),
                Some(date(2025, 11, 19))
            );
        }

        #[test]
        fn test_preview_limits_count() {
            let evaluator = RuleEvaluator::new("FREQ=MONTHLY", date(2025, 1, 31)).unwrap();
            let preview = evaluator.preview(date(2025, 1, 1), 3);
            // months without a 31st are skipped
            assert_eq!(preview, vec![date(2025, 1, 31), date(2025, 3, 31), date(2025, 5, 31)]);
        }
    }

    proptest! {
        #[test]
        fn prop_window_is_sorted_unique_and_bounded(
            interval in 1u32..10,
            offset in 0i64..60,
            span in 0i64..120,
        ) {
            let anchor = date(2025, 3, 1);
            let rule = format!("FREQ=DAILY;INTERVAL={}", interval);
            let evaluator = RuleEvaluator::new(&rule, anchor).unwrap();
            let start = anchor + chrono::Duration::days(offset);
            let end = start + chrono::Duration::days(span);

            let dates = evaluator.occurrences_between(start, end, &BTreeSet::new());

            prop_assert!(dates.windows(2).all(|w| w[0] < w[1]));
            prop_assert!(dates.iter().all(|d| *d >= start && *d <= end));
            for d in &dates {
                prop_assert_eq!((*d - anchor).num_days() % i64::from(interval), 0);
            }
        }
    }
}

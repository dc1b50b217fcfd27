use anyhow::{anyhow, Result};
use chrono::{NaiveDate, Utc};
use chrono_english::{parse_date_string, Dialect};
use std::collections::BTreeSet;

/// Parses an ISO date, falling back to English phrases like "next monday".
pub fn parse_date(date_str: &str) -> Result<NaiveDate> {
    let trimmed = date_str.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    parse_date_string(trimmed, Utc::now(), Dialect::Us)
        .map(|datetime| datetime.date_naive())
        .map_err(|e| anyhow!("Failed to parse date '{}': {}", date_str, e))
}

pub fn parse_optional_date(date_str: Option<&str>) -> Result<Option<NaiveDate>> {
    date_str.map(parse_date).transpose()
}

pub fn parse_dates(dates: &[String]) -> Result<BTreeSet<NaiveDate>> {
    dates.iter().map(|d| parse_date(d)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso_dates_parse_exactly() {
        assert_eq!(
            parse_date("2025-04-01").unwrap(),
            NaiveDate::from_ymd_opt(2025, 4, 1).unwrap()
        );
        assert_eq!(
            parse_date(" 2025-12-31 ").unwrap(),
            NaiveDate::from_ymd_opt(2025, 12, 31).unwrap()
        );
    }

    #[test]
    fn test_english_fallback() {
        let today = Utc::now().date_naive();
        assert_eq!(parse_date("today").unwrap(), today);
        assert!(parse_date("tomorrow").unwrap() > today);
    }

    #[test]
    fn test_garbage_is_rejected() {
        let err = parse_date("when the frost lifts").unwrap_err();
        assert!(err.to_string().contains("Failed to parse date"));
    }

    #[test]
    fn test_date_lists_collapse_to_a_set() {
        let dates = parse_dates(&[
            "2025-01-08".to_string(),
            "2025-01-01".to_string(),
            "2025-01-08".to_string(),
        ])
        .unwrap();
        assert_eq!(dates.len(), 2);
        assert_eq!(dates.iter().next(), NaiveDate::from_ymd_opt(2025, 1, 1).as_ref());
    }
}

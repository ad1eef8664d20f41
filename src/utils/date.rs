use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};

/// Parse a `YYYY-MM-DD` filter into local midnight of that day, expressed in UTC.
pub fn parse_since(s: &str) -> AppResult<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::InvalidDate(s.to_string()))?;
    let midnight = date.and_hms_opt(0, 0, 0).ok_or_else(|| AppError::InvalidDate(s.to_string()))?;

    Local
        .from_local_datetime(&midnight)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| AppError::InvalidDate(s.to_string()))
}

pub fn parse_since_opt(s: Option<&str>) -> AppResult<Option<DateTime<Utc>>> {
    s.map(parse_since).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_iso_dates() {
        let dt = parse_since("2025-03-10").unwrap();
        assert_eq!(dt.with_timezone(&Local).date_naive().to_string(), "2025-03-10");
    }

    #[test]
    fn rejects_other_formats() {
        assert!(matches!(parse_since("10/03/2025"), Err(AppError::InvalidDate(_))));
        assert!(matches!(parse_since("2025-13-01"), Err(AppError::InvalidDate(_))));
    }
}

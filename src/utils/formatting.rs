//! Formatting utilities used for CLI and export outputs.

use chrono::{DateTime, Local, TimeDelta, Utc};

pub fn bold(s: &str) -> String {
    format!("\x1b[1m{}\x1b[0m", s)
}

/// `HH:MM:SS`; hours are not wrapped at 24. Negative values render as zero.
pub fn format_duration(d: TimeDelta) -> String {
    let total = d.num_seconds().max(0);
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Timestamp in the local timezone, e.g. `2025-03-10 09:00:00`.
pub fn format_local(t: DateTime<Utc>) -> String {
    t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}

/// `-` for an empty optional column.
pub fn or_dash(v: Option<&str>) -> String {
    v.filter(|s| !s.is_empty()).unwrap_or("-").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_are_zero_padded() {
        assert_eq!(format_duration(TimeDelta::hours(1)), "01:00:00");
        assert_eq!(format_duration(TimeDelta::minutes(90)), "01:30:00");
        assert_eq!(format_duration(TimeDelta::seconds(45 * 60 + 30)), "00:45:30");
        assert_eq!(format_duration(TimeDelta::seconds(30)), "00:00:30");
        assert_eq!(format_duration(TimeDelta::hours(26)), "26:00:00");
        assert_eq!(format_duration(TimeDelta::seconds(-5)), "00:00:00");
    }
}

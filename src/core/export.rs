//! CSV / JSON export of times reports.

use crate::core::report::{TIME_HEADERS, TimeRow};
use crate::errors::AppResult;
use chrono::{DateTime, Local};
use clap::ValueEnum;
use csv::Writer;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

/// `<YYYYmmddHHMMSS>_times.<ext>`
pub fn default_file_name(now: DateTime<Local>, format: ExportFormat) -> String {
    format!("{}_times.{}", now.format("%Y%m%d%H%M%S"), format.extension())
}

/// Write `rows` to `path` and return how many were written.
pub fn export(rows: &[TimeRow], path: &Path, format: ExportFormat) -> AppResult<usize> {
    match format {
        ExportFormat::Csv => write_csv(path, rows)?,
        ExportFormat::Json => write_json(path, rows)?,
    }
    Ok(rows.len())
}

fn write_csv(path: &Path, rows: &[TimeRow]) -> AppResult<()> {
    let mut wtr = Writer::from_path(path)?;
    wtr.write_record(TIME_HEADERS)?;

    for row in rows {
        wtr.write_record(row.cells())?;
    }

    wtr.flush()?;
    Ok(())
}

fn write_json(path: &Path, rows: &[TimeRow]) -> AppResult<()> {
    let json = serde_json::to_string_pretty(rows)?;
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row() -> TimeRow {
        TimeRow {
            start_time: "2025-03-10 09:00:00".into(),
            end_time: "2025-03-10 10:00:00".into(),
            project: "alpha".into(),
            category: "dev".into(),
            duration: "01:00:00".into(),
            pauses: 1,
            pause_time: "00:10:00".into(),
            effective_work_time: "00:50:00".into(),
        }
    }

    #[test]
    fn default_name_uses_timestamp_prefix() {
        let now = Local.with_ymd_and_hms(2025, 3, 10, 14, 5, 9).unwrap();
        assert_eq!(default_file_name(now, ExportFormat::Csv), "20250310140509_times.csv");
        assert_eq!(default_file_name(now, ExportFormat::Json), "20250310140509_times.json");
    }

    #[test]
    fn csv_has_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        assert_eq!(export(&[row()], &path, ExportFormat::Csv).unwrap(), 1);

        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Start Time,End Time,Project,Category,Duration,Pauses,Pause Time,Effective Work Time"
        );
        assert!(lines.next().unwrap().starts_with("2025-03-10 09:00:00,"));
    }

    #[test]
    fn json_is_an_array_of_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");

        export(&[row(), row()], &path, ExportFormat::Json).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);
        assert_eq!(value[0]["effective_work_time"], "00:50:00");
    }
}

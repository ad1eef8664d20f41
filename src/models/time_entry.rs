use super::project::Project;
use chrono::{DateTime, TimeDelta, Utc};

/// A tracked session for one project.
///
/// `end_time` is `None` while the session is active. `duration` holds the
/// worked time (elapsed minus pauses) and is only set when the session stops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeEntry {
    pub id: i64,
    pub project_id: i64,
    pub project: Project,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration: Option<TimeDelta>,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A time entry joined with the aggregate of its closed pauses.
#[derive(Debug, Clone)]
pub struct TimeEntryWithPauses {
    pub entry: TimeEntry,
    pub pause_count: i64,
    pub pause_time: TimeDelta,
}

impl TimeEntryWithPauses {
    /// Worked time plus paused time, i.e. the wall-clock length of a closed entry.
    pub fn gross_duration(&self) -> Option<TimeDelta> {
        self.entry.duration.map(|d| d + self.pause_time)
    }
}

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A named project time is tracked against.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Project {
    pub id: i64,                                  // ⇔ projects.id
    pub name: String,                             // ⇔ projects.name (UNIQUE)
    pub created_at: DateTime<Utc>,                // ⇔ projects.created_at
    pub last_tracked_at: Option<DateTime<Utc>>,   // derived: MAX(time_entries.end_time)
}

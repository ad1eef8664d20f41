use chrono::{DateTime, TimeDelta, Utc};

/// One pause interval inside a time entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pause {
    pub id: i64,
    pub time_entry_id: i64,
    pub pause_start: DateTime<Utc>,
    pub pause_end: Option<DateTime<Utc>>,
    /// Whole seconds, set when the pause is closed.
    pub duration: Option<TimeDelta>,
    pub created_at: DateTime<Utc>,
}

impl Pause {
    /// Time spent in this pause up to `now` (or up to its end when closed).
    pub fn elapsed(&self, now: DateTime<Utc>) -> TimeDelta {
        match (self.duration, self.pause_end) {
            (Some(d), _) => d,
            (None, Some(end)) => (end - self.pause_start).max(TimeDelta::zero()),
            (None, None) => (now - self.pause_start).max(TimeDelta::zero()),
        }
    }
}

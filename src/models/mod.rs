pub mod pause;
pub mod project;
pub mod sort_order;
pub mod time_entry;

pub use pause::Pause;
pub use project::Project;
pub use sort_order::SortOrder;
pub use time_entry::{TimeEntry, TimeEntryWithPauses};

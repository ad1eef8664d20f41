pub mod category;
pub mod clock;
pub mod export;
pub mod ledger;
pub mod report;
pub mod tracker;

pub mod builder;
pub mod calendar;
pub mod snapshot;
pub mod stats;

pub use builder::ReportBuilder;
pub use snapshot::Report;
pub use stats::{GroupEntry, Stat};

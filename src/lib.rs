pub mod config;
pub mod dataset;
pub mod error;
pub mod output;
pub mod report;

pub use dataset::{Dataset, DatasetCache, DatasetLoader, Field, Record};
pub use error::{Error, Result};
pub use report::{Report, ReportBuilder, Stat};

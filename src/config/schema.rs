use crate::dataset::loader::DEFAULT_MAX_NULL_FRACTION;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReportConfig {
    /// Title shown above the report.
    #[serde(default)]
    #[validate(length(min = 1))]
    pub name: String,

    /// CSV export to read, relative to the config file.
    #[serde(default)]
    #[validate(length(min = 1))]
    pub source: String,

    /// Columns with at least this fraction of missing cells are dropped.
    #[serde(default)]
    #[validate(range(min = 0.0, max = 1.0))]
    pub max_null_fraction: Option<f64>,

    #[serde(default)]
    pub output: Option<OutputConfig>,

    /// Optional path to a parent configuration file to inherit from
    #[serde(default)]
    pub extends: Option<String>,
}

impl ReportConfig {
    /// Null threshold, falling back to the loader default when unset.
    pub fn max_null_fraction(&self) -> f64 {
        self.max_null_fraction.unwrap_or(DEFAULT_MAX_NULL_FRACTION)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutputConfig {
    Console,
    Json {
        #[serde(default = "default_pretty")]
        pretty: bool,
    },
}

fn default_pretty() -> bool {
    true
}

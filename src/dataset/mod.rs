pub mod cache;
pub mod loader;
pub mod schema;

pub use cache::{CacheLookup, DatasetCache};
pub use loader::DatasetLoader;
pub use schema::Field;

use crate::error::{Error, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One crawl/extraction job from the export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub created: NaiveDateTime,
    pub status: Option<String>,
    pub successful_urls: Option<u64>,
    pub extract_time: Option<f64>,
    pub mapping_time: Option<f64>,
    pub response_time: Option<f64>,
    pub total_credits: Option<f64>,
    pub total_llm_calls: Option<u64>,
    pub extract_depth: Option<String>,
}

impl Record {
    pub fn new(created: NaiveDateTime) -> Self {
        Self {
            created,
            status: None,
            successful_urls: None,
            extract_time: None,
            mapping_time: None,
            response_time: None,
            total_credits: None,
            total_llm_calls: None,
            extract_depth: None,
        }
    }
}

/// Normalized job records together with the columns that survived loading.
///
/// Every record carries a `created` timestamp; the loader has already
/// applied the null-column gate and dropped rows without one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    records: Vec<Record>,
}

impl Dataset {
    pub fn new(columns: Vec<String>, records: Vec<Record>) -> Self {
        Self { columns, records }
    }

    /// Dataset whose schema is exactly `fields`.
    pub fn with_fields(fields: &[Field], records: Vec<Record>) -> Self {
        let columns = fields.iter().map(|f| f.column_name().to_string()).collect();
        Self::new(columns, records)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_field(&self, field: Field) -> bool {
        self.columns.iter().any(|c| c == field.column_name())
    }

    /// Fails on the first of `fields` missing from the schema.
    pub fn require(&self, fields: &[Field]) -> Result<()> {
        match fields.iter().find(|f| !self.has_field(**f)) {
            Some(missing) => Err(Error::MissingField(*missing)),
            None => Ok(()),
        }
    }
}

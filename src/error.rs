use crate::dataset::schema::Field;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid config: {0}")]
    Validation(validator::ValidationErrors),

    #[error("Missing required field: {0}")]
    MissingField(Field),

    #[error("Row {row}: invalid {field} value {value:?} ({reason})")]
    InvalidValue {
        row: usize,
        field: Field,
        value: String,
        reason: String,
    },

    #[error("Row {row}: expected {expected} fields, found {found}")]
    RowLength {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

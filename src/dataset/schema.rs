use serde::{Deserialize, Serialize};
use std::fmt;

/// A column of the crawl job export that the report reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Field {
    Created,
    Status,
    SuccessfulUrls,
    ExtractTime,
    MappingTime,
    ResponseTime,
    TotalCredits,
    TotalLlmCalls,
    ExtractDepth,
}

impl Field {
    pub const ALL: [Field; 9] = [
        Field::Created,
        Field::Status,
        Field::SuccessfulUrls,
        Field::ExtractTime,
        Field::MappingTime,
        Field::ResponseTime,
        Field::TotalCredits,
        Field::TotalLlmCalls,
        Field::ExtractDepth,
    ];

    /// Upper-cased header name of the column.
    pub fn column_name(&self) -> &'static str {
        match self {
            Field::Created => "CREATED",
            Field::Status => "STATUS",
            Field::SuccessfulUrls => "SUCCESSFUL_URLS",
            Field::ExtractTime => "EXTRACT_TIME",
            Field::MappingTime => "MAPPING_TIME",
            Field::ResponseTime => "RESPONSE_TIME",
            Field::TotalCredits => "TOTAL_CREDITS",
            Field::TotalLlmCalls => "TOTAL_LLM_CALLS",
            Field::ExtractDepth => "EXTRACT_DEPTH",
        }
    }

    pub fn from_column_name(name: &str) -> Option<Field> {
        let upper = name.trim().to_uppercase();
        Field::ALL.into_iter().find(|f| f.column_name() == upper)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// Cell values the loader treats as missing.
pub const NULL_TOKENS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "NULL", "null", "None", "<NA>",
    "#N/A", "#NA", "#N/A N/A", "1.#IND", "-1.#IND", "1.#QNAN", "-1.#QNAN",
];

pub fn is_null(cell: &str) -> bool {
    NULL_TOKENS.contains(&cell.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_names_match_case_insensitively() {
        assert_eq!(Field::from_column_name("created"), Some(Field::Created));
        assert_eq!(
            Field::from_column_name(" Total_LLM_Calls "),
            Some(Field::TotalLlmCalls)
        );
        assert_eq!(Field::from_column_name("user_id"), None);
    }

    #[test]
    fn null_tokens() {
        assert!(is_null(""));
        assert!(is_null("  "));
        assert!(is_null("NaN"));
        assert!(is_null("None"));
        assert!(!is_null("0"));
        assert!(!is_null("done"));
    }
}

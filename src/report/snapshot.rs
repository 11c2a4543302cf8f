use super::stats::{GroupEntry, Stat};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub type Series = Vec<GroupEntry<NaiveDate, u64>>;
pub type Counts = Vec<GroupEntry<String, u64>>;
pub type Means = Vec<GroupEntry<String, Stat>>;

/// Aggregates computed from one dataset.
///
/// Rates are fractions in `[0, 1]`; formatting them is left to the
/// renderers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub total_records: u64,
    pub success_rate: Stat,
    pub failure_rate: Stat,
    /// Averaged over jobs with at least one successful URL only.
    pub avg_successful_url_count: Stat,
    pub avg_extract_time: Stat,
    pub avg_total_credits: Stat,
    pub avg_mapping_time: Stat,
    pub avg_response_time: Stat,
    pub avg_llm_calls: Stat,

    pub activity_by_day: Series,
    pub activity_by_week: Series,
    pub activity_by_month: Series,

    pub status_distribution: Counts,
    pub extract_depth_distribution: Counts,
    pub avg_llm_calls_by_extract_depth: Means,
    pub avg_response_time_by_status: Means,
}

impl Report {
    pub const SCALARS: [&'static str; 8] = [
        "success_rate",
        "failure_rate",
        "avg_successful_url_count",
        "avg_extract_time",
        "avg_total_credits",
        "avg_mapping_time",
        "avg_response_time",
        "avg_llm_calls",
    ];

    pub fn scalar(&self, name: &str) -> Option<Stat> {
        let stat = match name {
            "success_rate" => self.success_rate,
            "failure_rate" => self.failure_rate,
            "avg_successful_url_count" => self.avg_successful_url_count,
            "avg_extract_time" => self.avg_extract_time,
            "avg_total_credits" => self.avg_total_credits,
            "avg_mapping_time" => self.avg_mapping_time,
            "avg_response_time" => self.avg_response_time,
            "avg_llm_calls" => self.avg_llm_calls,
            _ => return None,
        };
        Some(stat)
    }

    pub fn scalars(&self) -> Vec<(&'static str, Stat)> {
        Self::SCALARS
            .iter()
            .filter_map(|name| self.scalar(name).map(|s| (*name, s)))
            .collect()
    }
}

use super::calendar::{day_of, month_of, week_of};
use super::snapshot::Report;
use super::stats::{count_by, count_by_desc, mean_by, Mean, Stat};
use crate::dataset::{Dataset, Field, Record};
use crate::error::Result;

const STATUS_DONE: &str = "done";
const STATUS_FAILED: &str = "failed";

pub struct ReportBuilder;

impl ReportBuilder {
    /// Fields the report reads. All of them must be in the dataset schema.
    pub const REQUIRED_FIELDS: [Field; 9] = Field::ALL;

    pub fn build(dataset: &Dataset) -> Result<Report> {
        dataset.require(&Self::REQUIRED_FIELDS)?;

        let records = dataset.records();
        let total = records.len() as u64;
        log::debug!("Building report over {} records", total);

        let with_status = |wanted: &str| {
            records
                .iter()
                .filter(|r| r.status.as_deref() == Some(wanted))
                .count() as u64
        };

        let successful_urls: Mean = records
            .iter()
            .map(|r| r.successful_urls.filter(|n| *n > 0).map(|n| n as f64))
            .collect();
        let mean_of = |f: fn(&Record) -> Option<f64>| -> Stat {
            records.iter().map(f).collect::<Mean>().stat()
        };

        Ok(Report {
            total_records: total,
            success_rate: Stat::ratio(with_status(STATUS_DONE), total),
            failure_rate: Stat::ratio(with_status(STATUS_FAILED), total),
            avg_successful_url_count: successful_urls.stat(),
            avg_extract_time: mean_of(|r| r.extract_time),
            avg_total_credits: mean_of(|r| r.total_credits),
            avg_mapping_time: mean_of(|r| r.mapping_time),
            avg_response_time: mean_of(|r| r.response_time),
            avg_llm_calls: mean_of(|r| r.total_llm_calls.map(|n| n as f64)),

            activity_by_day: count_by(records.iter().map(|r| Some(day_of(&r.created)))),
            activity_by_week: count_by(records.iter().map(|r| Some(week_of(&r.created)))),
            activity_by_month: count_by(records.iter().map(|r| Some(month_of(&r.created)))),

            status_distribution: count_by_desc(records.iter().map(|r| r.status.clone())),
            extract_depth_distribution: count_by_desc(
                records.iter().map(|r| r.extract_depth.clone()),
            ),
            avg_llm_calls_by_extract_depth: mean_by(records.iter().map(|r| {
                (
                    r.extract_depth.clone(),
                    r.total_llm_calls.map(|n| n as f64),
                )
            })),
            avg_response_time_by_status: mean_by(
                records
                    .iter()
                    .map(|r| (r.status.clone(), r.response_time)),
            ),
        })
    }
}

use super::schema::{is_null, Field};
use super::{Dataset, Record};
use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use indicatif::ProgressBar;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

pub const DEFAULT_MAX_NULL_FRACTION: f64 = 0.4;

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M:%S%.f %#z",
    "%Y-%m-%dT%H:%M:%S%.f%#z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// Reads a job export into a normalized [`Dataset`].
///
/// Normalization happens in a fixed order: headers are upper-cased, columns
/// at or above the null threshold are dropped, then rows without `CREATED`
/// are dropped and the remaining cells are parsed into typed records.
#[derive(Clone)]
pub struct DatasetLoader {
    max_null_fraction: f64,
    progress: Option<ProgressBar>,
}

struct RawRow {
    line: u64,
    cells: Vec<Option<String>>,
}

struct RawTable {
    headers: Vec<String>,
    rows: Vec<RawRow>,
}

impl Default for DatasetLoader {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_NULL_FRACTION)
    }
}

impl DatasetLoader {
    pub fn new(max_null_fraction: f64) -> Self {
        Self {
            max_null_fraction,
            progress: None,
        }
    }

    /// Ticks `progress` once per CSV row read.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<Dataset> {
        let path = path.as_ref();
        log::info!("Loading dataset from {}", path.display());

        let file = File::open(path)
            .map_err(|e| Error::Io(io::Error::new(e.kind(), format!("{}: {}", path.display(), e))))?;
        self.from_reader(file)
    }

    pub fn from_reader<R: Read>(&self, reader: R) -> Result<Dataset> {
        let table = self.read_table(reader)?;
        let table = self.drop_sparse_columns(table);
        self.build_dataset(table)
    }

    fn read_table<R: Read>(&self, reader: R) -> Result<RawTable> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = rdr
            .headers()?
            .iter()
            .map(|h| h.trim().to_uppercase())
            .collect();

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            if record.len() > headers.len() {
                return Err(Error::RowLength {
                    row: line as usize,
                    expected: headers.len(),
                    found: record.len(),
                });
            }
            let cells = (0..headers.len())
                .map(|i| record.get(i).filter(|c| !is_null(c)).map(str::to_string))
                .collect();
            rows.push(RawRow { line, cells });

            if let Some(pb) = &self.progress {
                pb.inc(1);
            }
        }

        log::debug!("Read {} rows with {} columns", rows.len(), headers.len());
        Ok(RawTable { headers, rows })
    }

    fn drop_sparse_columns(&self, table: RawTable) -> RawTable {
        let total = table.rows.len();
        if total == 0 {
            return table;
        }

        let keep: Vec<bool> = (0..table.headers.len())
            .map(|i| {
                let nulls = table.rows.iter().filter(|r| r.cells[i].is_none()).count();
                (nulls as f64 / total as f64) < self.max_null_fraction
            })
            .collect();

        for (header, kept) in table.headers.iter().zip(&keep) {
            if !kept {
                log::info!(
                    "Dropping column {} (null fraction >= {})",
                    header,
                    self.max_null_fraction
                );
            }
        }

        let headers = table
            .headers
            .into_iter()
            .zip(&keep)
            .filter_map(|(h, k)| k.then_some(h))
            .collect();
        let rows = table
            .rows
            .into_iter()
            .map(|row| RawRow {
                line: row.line,
                cells: row
                    .cells
                    .into_iter()
                    .zip(&keep)
                    .filter_map(|(c, k)| k.then_some(c))
                    .collect(),
            })
            .collect();

        RawTable { headers, rows }
    }

    fn build_dataset(&self, table: RawTable) -> Result<Dataset> {
        let mut index: HashMap<Field, usize> = HashMap::new();
        for (i, header) in table.headers.iter().enumerate() {
            if let Some(field) = Field::from_column_name(header) {
                index.entry(field).or_insert(i);
            }
        }

        let created_idx = *index
            .get(&Field::Created)
            .ok_or(Error::MissingField(Field::Created))?;

        let mut records = Vec::with_capacity(table.rows.len());
        let mut dropped = 0usize;
        for row in &table.rows {
            if row.cells[created_idx].is_none() {
                dropped += 1;
                continue;
            }
            records.push(RowReader { row, index: &index }.record()?);
        }

        if dropped > 0 {
            log::info!("Dropped {} rows without {}", dropped, Field::Created);
        }
        log::debug!("Dataset ready: {} records", records.len());

        Ok(Dataset::new(table.headers, records))
    }
}

struct RowReader<'a> {
    row: &'a RawRow,
    index: &'a HashMap<Field, usize>,
}

impl<'a> RowReader<'a> {
    fn record(&self) -> Result<Record> {
        let raw_created = self.cell(Field::Created).unwrap_or_default();
        let created = parse_timestamp(raw_created)
            .ok_or_else(|| self.invalid(Field::Created, raw_created, "unrecognized timestamp"))?;

        Ok(Record {
            created,
            status: self.text(Field::Status),
            successful_urls: self.count(Field::SuccessfulUrls)?,
            extract_time: self.real(Field::ExtractTime)?,
            mapping_time: self.real(Field::MappingTime)?,
            response_time: self.real(Field::ResponseTime)?,
            total_credits: self.real(Field::TotalCredits)?,
            total_llm_calls: self.count(Field::TotalLlmCalls)?,
            extract_depth: self.text(Field::ExtractDepth),
        })
    }

    fn cell(&self, field: Field) -> Option<&'a str> {
        let row = self.row;
        self.index
            .get(&field)
            .and_then(|&i| row.cells[i].as_deref())
    }

    fn text(&self, field: Field) -> Option<String> {
        self.cell(field).map(str::to_string)
    }

    fn count(&self, field: Field) -> Result<Option<u64>> {
        self.cell(field)
            .map(|raw| parse_count(raw).map_err(|reason| self.invalid(field, raw, reason)))
            .transpose()
    }

    fn real(&self, field: Field) -> Result<Option<f64>> {
        self.cell(field)
            .map(|raw| parse_real(raw).map_err(|reason| self.invalid(field, raw, reason)))
            .transpose()
    }

    fn invalid(&self, field: Field, value: &str, reason: &str) -> Error {
        Error::InvalidValue {
            row: self.row.line as usize,
            field,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Parses the export's `CREATED` column. Offsets are discarded and the
/// wall-clock time is kept.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(raw, fmt) {
            return Some(dt.naive_local());
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn parse_real(raw: &str) -> std::result::Result<f64, &'static str> {
    let value: f64 = raw.parse().map_err(|_| "not a number")?;
    if !value.is_finite() {
        return Err("not a finite number");
    }
    if value < 0.0 {
        return Err("negative value");
    }
    Ok(value)
}

fn parse_count(raw: &str) -> std::result::Result<u64, &'static str> {
    if let Ok(n) = raw.parse::<u64>() {
        return Ok(n);
    }
    let value = parse_real(raw)?;
    if value.fract() != 0.0 {
        return Err("expected a whole number");
    }
    Ok(value as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};

    fn load(csv: &str) -> Result<Dataset> {
        DatasetLoader::default().from_reader(csv.as_bytes())
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn parses_timestamp_variants() {
        let expected = at(2024, 3, 1, 10, 15, 0);
        assert_eq!(parse_timestamp("2024-03-01 10:15:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T10:15:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T10:15:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T10:15:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01 10:15:00+00:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01 10:15"), Some(expected));
        assert_eq!(parse_timestamp("03/01/2024 10:15:00"), Some(expected));
        assert_eq!(
            parse_timestamp("2024-03-01"),
            Some(at(2024, 3, 1, 0, 0, 0))
        );
        assert_eq!(
            parse_timestamp("2024-03-01 10:15:00.250").map(|t| t.nanosecond()),
            Some(250_000_000)
        );
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn counts_accept_integral_floats() {
        assert_eq!(parse_count("4"), Ok(4));
        assert_eq!(parse_count("4.0"), Ok(4));
        assert!(parse_count("4.5").is_err());
        assert!(parse_count("-1").is_err());
        assert!(parse_count("many").is_err());
        assert!(parse_real("inf").is_err());
    }

    #[test]
    fn headers_are_upper_cased() {
        let ds = load("created,Status,extract_depth\n2024-01-01 00:00:00,done,basic\n").unwrap();
        assert_eq!(ds.columns(), ["CREATED", "STATUS", "EXTRACT_DEPTH"]);
        assert_eq!(ds.records()[0].status.as_deref(), Some("done"));
        assert_eq!(ds.records()[0].extract_depth.as_deref(), Some("basic"));
    }

    #[test]
    fn drops_columns_at_or_above_null_threshold() {
        // NOTES is 60% null, MAPPING_TIME exactly 40%, RESPONSE_TIME 20%.
        let csv = "\
CREATED,NOTES,MAPPING_TIME,RESPONSE_TIME
2024-01-01 00:00:00,a,1.0,2.0
2024-01-02 00:00:00,b,1.0,2.0
2024-01-03 00:00:00,,1.0,2.0
2024-01-04 00:00:00,,,2.0
2024-01-05 00:00:00,,,
";
        let ds = load(csv).unwrap();
        assert_eq!(ds.columns(), ["CREATED", "RESPONSE_TIME"]);
        assert!(!ds.has_field(Field::MappingTime));
        assert!(ds.records().iter().all(|r| r.mapping_time.is_none()));
        assert_eq!(ds.records()[4].response_time, None);
    }

    #[test]
    fn null_gate_runs_before_created_filter() {
        // STATUS is 40% null across all rows but only 25% null once the
        // row without CREATED is gone.
        let csv = "\
CREATED,STATUS
2024-01-01 00:00:00,done
,
2024-01-03 00:00:00,
2024-01-04 00:00:00,done
2024-01-05 00:00:00,failed
";
        let ds = load(csv).unwrap();
        assert_eq!(ds.columns(), ["CREATED"]);
        assert_eq!(ds.len(), 4);
    }

    #[test]
    fn rows_without_created_are_dropped() {
        let csv = "\
CREATED,STATUS
2024-01-01 00:00:00,done
,done
2024-01-03 00:00:00,failed
2024-01-04 00:00:00,done
2024-01-05 00:00:00,done
";
        let ds = load(csv).unwrap();
        assert_eq!(ds.len(), 4);
        assert_eq!(ds.records()[1].status.as_deref(), Some("failed"));
    }

    #[test]
    fn sparse_created_column_is_a_missing_field() {
        let csv = "CREATED,STATUS\n,done\n,done\n2024-01-01,done\n";
        let err = load(csv).unwrap_err();
        assert!(matches!(err, Error::MissingField(Field::Created)));
    }

    #[test]
    fn missing_created_header_is_a_missing_field() {
        let err = load("STATUS\ndone\n").unwrap_err();
        assert!(matches!(err, Error::MissingField(Field::Created)));
    }

    #[test]
    fn header_only_file_keeps_schema() {
        let ds = load("CREATED,STATUS,EXTRACT_DEPTH\n").unwrap();
        assert!(ds.is_empty());
        assert_eq!(ds.columns().len(), 3);
    }

    #[test]
    fn bad_timestamp_reports_line() {
        let csv = "CREATED\n2024-01-01\nnot-a-date\n";
        match load(csv).unwrap_err() {
            Error::InvalidValue { row, field, value, .. } => {
                assert_eq!(row, 3);
                assert_eq!(field, Field::Created);
                assert_eq!(value, "not-a-date");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn bad_number_is_rejected() {
        let csv = "CREATED,TOTAL_LLM_CALLS\n2024-01-01,two\n";
        assert!(matches!(
            load(csv).unwrap_err(),
            Error::InvalidValue { field: Field::TotalLlmCalls, .. }
        ));
    }

    #[test]
    fn short_rows_are_padded_with_nulls() {
        let csv = "\
CREATED,STATUS,SUCCESSFUL_URLS
2024-01-01,done,3
2024-01-02,failed
2024-01-03,done,1.0
";
        let ds = load(csv).unwrap();
        let urls: Vec<_> = ds.records().iter().map(|r| r.successful_urls).collect();
        assert_eq!(urls, [Some(3), None, Some(1)]);
    }

    #[test]
    fn long_rows_are_rejected() {
        let csv = "CREATED,STATUS\n2024-01-01,done\n2024-01-02,failed,surprise,more\n";
        match load(csv).unwrap_err() {
            Error::RowLength { row, expected, found } => {
                assert_eq!(row, 3);
                assert_eq!(expected, 2);
                assert_eq!(found, 4);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn cells_are_trimmed_before_null_matching() {
        let csv = "CREATED,STATUS\n2024-01-01, done \n2024-01-02,   \n2024-01-03,done\n";
        let ds = load(csv).unwrap();
        let status: Vec<_> = ds.records().iter().map(|r| r.status.as_deref()).collect();
        assert_eq!(status, [Some("done"), None, Some("done")]);
    }
}

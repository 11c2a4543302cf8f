use super::ReportRenderer;
use crate::error::Result;
use crate::report::snapshot::{Counts, Means, Series};
use crate::report::{Report, Stat};
use std::io::{self, Stdout, Write};

const LABEL_WIDTH: usize = 32;

/// Plain-text rendering of the dashboard: KPI block, activity series and
/// breakdown tables.
pub struct ConsoleOutput<W: Write = Stdout> {
    writer: W,
    title: String,
}

impl ConsoleOutput<Stdout> {
    pub fn stdout(title: impl Into<String>) -> Self {
        Self::new(io::stdout(), title)
    }
}

impl<W: Write> ConsoleOutput<W> {
    pub fn new(writer: W, title: impl Into<String>) -> Self {
        Self {
            writer,
            title: title.into(),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn heading(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.writer)?;
        writeln!(self.writer, "{}", text)?;
        writeln!(self.writer, "{}", "-".repeat(text.chars().count()))
    }

    fn kpi(&mut self, label: &str, value: String) -> io::Result<()> {
        writeln!(self.writer, "  {:<width$} {}", label, value, width = LABEL_WIDTH)
    }

    fn series(&mut self, title: &str, series: &Series) -> io::Result<()> {
        self.heading(title)?;
        if series.is_empty() {
            return writeln!(self.writer, "  (no data)");
        }
        for entry in series {
            writeln!(self.writer, "  {}  {:>8}", entry.key, entry.value)?;
        }
        Ok(())
    }

    fn counts(&mut self, title: &str, counts: &Counts, with_share: bool) -> io::Result<()> {
        self.heading(title)?;
        if counts.is_empty() {
            return writeln!(self.writer, "  (no data)");
        }
        let total: u64 = counts.iter().map(|e| e.value).sum();
        let width = key_width(counts.iter().map(|e| e.key.as_str()));
        for entry in counts {
            if with_share {
                let share = Stat::ratio(entry.value, total);
                writeln!(
                    self.writer,
                    "  {:<width$}  {:>8}  {:>6}",
                    entry.key,
                    entry.value,
                    percent(share, 1),
                    width = width
                )?;
            } else {
                writeln!(self.writer, "  {:<width$}  {:>8}", entry.key, entry.value, width = width)?;
            }
        }
        Ok(())
    }

    fn means(&mut self, title: &str, means: &Means, precision: usize) -> io::Result<()> {
        self.heading(title)?;
        if means.is_empty() {
            return writeln!(self.writer, "  (no data)");
        }
        let width = key_width(means.iter().map(|e| e.key.as_str()));
        for entry in means {
            let value = format!("{:.*}", precision, entry.value);
            writeln!(self.writer, "  {:<width$}  {:>8}", entry.key, value, width = width)?;
        }
        Ok(())
    }

    fn write_report(&mut self, report: &Report) -> io::Result<()> {
        writeln!(self.writer, "📊 {}", self.title)?;
        writeln!(self.writer, "   {} records", report.total_records)?;

        self.heading("Key Performance Indicators")?;
        self.kpi("Success Rate", percent(report.success_rate, 2))?;
        self.kpi("Failure Rate", percent(report.failure_rate, 2))?;
        self.kpi(
            "Average Successful URL Count",
            format!("{:.1}", report.avg_successful_url_count),
        )?;
        self.kpi("Avg Extract Time (s)", format!("{:.1}", report.avg_extract_time))?;

        self.heading("Additional KPIs")?;
        self.kpi("Avg Total Credits Used", format!("{:.1}", report.avg_total_credits))?;
        self.kpi("Avg Mapping Time (s)", format!("{:.2}", report.avg_mapping_time))?;
        self.kpi("Avg Response Time (s)", format!("{:.2}", report.avg_response_time))?;
        self.kpi("Avg LLM Calls", format!("{:.1}", report.avg_llm_calls))?;

        self.series("Daily Activity", &report.activity_by_day)?;
        self.series("Weekly Activity", &report.activity_by_week)?;
        self.series("Monthly Activity", &report.activity_by_month)?;

        self.counts("Status Distribution", &report.status_distribution, true)?;
        self.counts(
            "Extract Depth Distribution",
            &report.extract_depth_distribution,
            false,
        )?;
        self.means(
            "Avg LLM Calls by Extract Depth",
            &report.avg_llm_calls_by_extract_depth,
            1,
        )?;
        self.means(
            "Avg Response Time by Status (s)",
            &report.avg_response_time_by_status,
            2,
        )?;
        Ok(())
    }
}

impl<W: Write> ReportRenderer for ConsoleOutput<W> {
    fn render(&mut self, report: &Report) -> Result<()> {
        self.write_report(report)?;
        self.writer.flush()?;
        Ok(())
    }
}

fn percent(stat: Stat, precision: usize) -> String {
    match stat {
        Stat::Value(v) => format!("{:.*}%", precision, v * 100.0),
        Stat::Undefined => "n/a".to_string(),
    }
}

fn key_width<'a>(keys: impl Iterator<Item = &'a str>) -> usize {
    keys.map(|k| k.chars().count()).max().unwrap_or(0)
}

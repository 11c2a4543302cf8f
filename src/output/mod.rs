use crate::error::Result;
use crate::report::Report;

pub mod console;
pub mod json;

pub trait ReportRenderer {
    fn render(&mut self, report: &Report) -> Result<()>;
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

use super::ReportRenderer;
use crate::error::Result;
use crate::report::Report;
use std::io::{self, Stdout, Write};

pub struct JsonOutput<W: Write = Stdout> {
    writer: W,
    pretty: bool,
}

impl JsonOutput<Stdout> {
    pub fn stdout(pretty: bool) -> Self {
        Self::new(io::stdout(), pretty)
    }
}

impl<W: Write> JsonOutput<W> {
    pub fn new(writer: W, pretty: bool) -> Self {
        Self { writer, pretty }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ReportRenderer for JsonOutput<W> {
    fn render(&mut self, report: &Report) -> Result<()> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut self.writer, report)?;
        } else {
            serde_json::to_writer(&mut self.writer, report)?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

//! CSV export of a presence report.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use presence_core::Report;

/// Writes the heading row, the column headers and one record per person.
/// Returns the number of people written.
pub fn write_csv<W: Write>(report: &Report, writer: W) -> Result<usize> {
    let mut csv = csv::WriterBuilder::new().flexible(true).from_writer(writer);
    csv.write_record([report.heading()])?;
    csv.write_record(report.headers())?;
    let records = report.records();
    for record in &records {
        csv.write_record(record)?;
    }
    csv.flush()?;
    Ok(records.len())
}

/// Exports to `out`, or to stdout when no path is given.
pub fn export(report: &Report, out: Option<&Path>) -> Result<usize> {
    match out {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
            write_csv(report, file)
        }
        None => write_csv(report, io::stdout().lock()),
    }
}

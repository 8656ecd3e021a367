//! CSV writer

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::CsvResult;
use crate::options::{CsvWriteOptions, LineTerminator};
use gridcalc_core::Grid;

/// CSV file writer
pub struct CsvWriter;

impl CsvWriter {
    /// Write a grid to a CSV file
    pub fn write_file<P: AsRef<Path>>(
        grid: &Grid,
        path: P,
        options: &CsvWriteOptions,
    ) -> CsvResult<()> {
        let file = File::create(path)?;
        Self::write(grid, file, options)
    }

    /// Write a grid to a writer
    ///
    /// Every column is written, identifier included, in definition order.
    pub fn write<W: Write>(grid: &Grid, writer: W, options: &CsvWriteOptions) -> CsvResult<()> {
        let terminator = match options.line_terminator {
            LineTerminator::LF => csv::Terminator::Any(b'\n'),
            LineTerminator::CRLF => csv::Terminator::CRLF,
        };

        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(options.delimiter)
            .quote(options.quote)
            .terminator(terminator)
            .from_writer(writer);

        if options.write_header && !grid.columns().is_empty() {
            csv_writer.write_record(grid.columns().iter().map(|c| {
                if c.title.is_empty() {
                    c.key.as_str()
                } else {
                    c.title.as_str()
                }
            }))?;
        }

        for row in grid.rows() {
            csv_writer.write_record(
                grid.columns()
                    .iter()
                    .map(|c| row.get(&c.key).unwrap_or("")),
            )?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}

//! CSV reader

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{CsvError, CsvResult};
use crate::options::CsvReadOptions;
use gridcalc_core::{CellAddress, ColumnDef, Grid, Row, ID_COLUMN_KEY};

/// CSV file reader
pub struct CsvReader;

impl CsvReader {
    /// Read a CSV file into a grid
    pub fn read_file<P: AsRef<Path>>(path: P, options: &CsvReadOptions) -> CsvResult<Grid> {
        let file = File::open(path)?;
        Self::read(file, options)
    }

    /// Read CSV from a reader into a grid
    ///
    /// Short records are padded with blanks; a record longer than the header
    /// (or the first record, without a header) is an error.
    pub fn read<R: Read>(reader: R, options: &CsvReadOptions) -> CsvResult<Grid> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .quote(options.quote)
            .has_headers(false)
            .flexible(true)
            .trim(if options.trim {
                csv::Trim::All
            } else {
                csv::Trim::None
            })
            .from_reader(reader);

        let mut records = csv_reader.records();

        let columns = if options.has_header {
            match records.next() {
                Some(header) => Self::columns_from_header(&header?),
                None => Vec::new(),
            }
        } else {
            Vec::new()
        };

        let mut raw_rows = Vec::new();
        for result in records {
            raw_rows.push(result?);
        }

        let columns = if options.has_header {
            columns
        } else {
            let width = raw_rows.iter().map(|r| r.len()).max().unwrap_or(0);
            (0..width as u32).map(ColumnDef::generated).collect()
        };

        let header_rows = usize::from(options.has_header);
        let mut rows = Vec::with_capacity(raw_rows.len());
        for (row_idx, record) in raw_rows.iter().enumerate() {
            if record.len() > columns.len() {
                return Err(CsvError::Parse {
                    row: row_idx + header_rows + 1,
                    column: columns.len() + 1,
                    message: format!(
                        "record has {} fields but there are {} columns",
                        record.len(),
                        columns.len()
                    ),
                });
            }

            let row: Row = columns
                .iter()
                .enumerate()
                .map(|(col, column)| (column.key.clone(), record.get(col).unwrap_or("")))
                .collect();
            rows.push(row);
        }

        Ok(Grid::new(columns, rows)?)
    }

    /// Build column definitions from a header record
    ///
    /// The first `id` header (any case) is the identifier column. The rest are
    /// keyed by their letter among the addressable columns and keep the header
    /// text as their title.
    fn columns_from_header(header: &csv::StringRecord) -> Vec<ColumnDef> {
        let mut columns = Vec::with_capacity(header.len());
        let mut has_id = false;
        let mut position = 0u32;

        for title in header.iter() {
            if !has_id && title.trim().eq_ignore_ascii_case(ID_COLUMN_KEY) {
                has_id = true;
                let mut id = ColumnDef::identifier();
                id.title = title.to_string();
                columns.push(id);
            } else {
                columns.push(ColumnDef::new(
                    CellAddress::column_to_letters(position),
                    title,
                ));
                position += 1;
            }
        }

        columns
    }
}

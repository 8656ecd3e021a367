//! Grid snapshot type

use std::collections::HashSet;
use std::fmt;

use crate::cell::{CellAddress, CellRange};
use crate::column::ColumnDef;
use crate::error::{Error, Result};
use crate::row::Row;

/// Extent of a grid's addressable area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GridBounds {
    /// Number of rows
    pub rows: u32,
    /// Number of addressable columns
    pub cols: u32,
}

impl GridBounds {
    /// Create bounds from row and column counts
    pub fn new(rows: u32, cols: u32) -> Self {
        Self { rows, cols }
    }

    /// Check if the grid has no cells
    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    /// Check if an address falls inside the grid
    pub fn contains(&self, addr: &CellAddress) -> bool {
        addr.row < self.rows && addr.col < self.cols
    }

    /// Bottom-right cell, if the grid has any cells
    pub fn last_address(&self) -> Option<CellAddress> {
        if self.is_empty() {
            None
        } else {
            Some(CellAddress::new(self.rows - 1, self.cols - 1))
        }
    }

    /// The whole grid as a range
    pub fn as_range(&self) -> Option<CellRange> {
        self.last_address()
            .map(|last| CellRange::new(CellAddress::new(0, 0), last))
    }
}

impl fmt::Display for GridBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_range() {
            Some(range) => write!(
                f,
                "{}:{}",
                range.start.to_a1_string(),
                range.end.to_a1_string()
            ),
            None => write!(f, "empty grid"),
        }
    }
}

/// A snapshot of the editable dataset
///
/// Rows map column keys to raw cell content. Formula addresses resolve against
/// the addressable columns (see [`ColumnDef::is_addressable`]) in their
/// definition order: the first addressable column is `A`, the second `B`, and
/// so on.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Grid {
    columns: Vec<ColumnDef>,
    #[cfg_attr(feature = "serde", serde(rename = "data"))]
    rows: Vec<Row>,
    /// Indices into `columns` of the addressable columns, in order
    #[cfg_attr(feature = "serde", serde(skip))]
    addressable: Vec<usize>,
}

/// Wire shape of a grid: `{ "columns": [...], "data": [...] }`
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct GridDocument {
    columns: Vec<ColumnDef>,
    #[serde(alias = "rows")]
    data: Vec<Row>,
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Grid {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let doc = GridDocument::deserialize(deserializer)?;
        Grid::new(doc.columns, doc.data).map_err(serde::de::Error::custom)
    }
}

impl Grid {
    /// Create a grid, checking that column keys are unique and that every row
    /// has an entry for every addressable column
    pub fn new(columns: Vec<ColumnDef>, rows: Vec<Row>) -> Result<Self> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.key.as_str()) {
                return Err(Error::DuplicateColumnKey(column.key.clone()));
            }
        }

        let addressable: Vec<usize> = columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_addressable())
            .map(|(i, _)| i)
            .collect();

        for (row_idx, row) in rows.iter().enumerate() {
            for &col_idx in &addressable {
                let key = &columns[col_idx].key;
                if !row.contains_key(key) {
                    return Err(Error::MissingCell {
                        row: row_idx + 1,
                        key: key.clone(),
                    });
                }
            }
        }

        Ok(Self {
            columns,
            rows,
            addressable,
        })
    }

    /// Build a grid from plain values with an identifier column and
    /// letter-titled columns
    ///
    /// Short rows are padded with blanks.
    ///
    /// ```
    /// use gridcalc_core::Grid;
    ///
    /// let grid = Grid::from_values(&[vec!["10", "20"], vec!["=A1+B1"]]);
    /// assert_eq!(grid.row_count(), 2);
    /// assert_eq!(grid.col_count(), 2);
    /// assert_eq!(grid.get("B2").unwrap(), Some(""));
    /// ```
    pub fn from_values<R, S>(values: &[R]) -> Self
    where
        R: AsRef<[S]>,
        S: AsRef<str>,
    {
        let width = values.iter().map(|r| r.as_ref().len()).max().unwrap_or(0);

        let mut columns = Vec::with_capacity(width + 1);
        columns.push(ColumnDef::identifier());
        columns.extend((0..width).map(|i| ColumnDef::generated(i as u32)));

        let rows = values
            .iter()
            .enumerate()
            .map(|(row_idx, values)| {
                let values = values.as_ref();
                let mut row = Row::new();
                row.set(crate::ID_COLUMN_KEY, (row_idx + 1).to_string());
                for (col_idx, column) in columns.iter().skip(1).enumerate() {
                    let value = values.get(col_idx).map(|v| v.as_ref()).unwrap_or("");
                    row.set(column.key.clone(), value);
                }
                row
            })
            .collect();

        let addressable = (1..=width).collect();
        Self {
            columns,
            rows,
            addressable,
        }
    }

    /// All column definitions, in order
    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// All rows, in order
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of rows
    pub fn row_count(&self) -> u32 {
        u32::try_from(self.rows.len()).unwrap_or(u32::MAX)
    }

    /// Number of addressable columns
    pub fn col_count(&self) -> u32 {
        u32::try_from(self.addressable.len()).unwrap_or(u32::MAX)
    }

    /// Extent of the addressable area
    pub fn bounds(&self) -> GridBounds {
        GridBounds::new(self.row_count(), self.col_count())
    }

    /// Column key for an address column index
    pub fn column_key(&self, col: u32) -> Option<&str> {
        self.addressable
            .get(col as usize)
            .map(|&i| self.columns[i].key.as_str())
    }

    /// Address column index for a column key
    pub fn column_index(&self, key: &str) -> Option<u32> {
        self.addressable
            .iter()
            .position(|&i| self.columns[i].key == key)
            .map(|pos| pos as u32)
    }

    /// Raw content at an address, or `None` outside the grid
    pub fn raw(&self, addr: CellAddress) -> Option<&str> {
        let key = self.column_key(addr.col)?;
        self.rows.get(addr.row as usize)?.get(key)
    }

    /// Raw content at an A1-style address
    pub fn get(&self, address: &str) -> Result<Option<&str>> {
        let addr = CellAddress::parse(address)?;
        Ok(self.raw(addr))
    }

    /// Overwrite the content at an address
    pub fn set_raw<V: Into<String>>(&mut self, addr: CellAddress, value: V) -> Result<()> {
        let col_count = self.col_count();
        let row_count = self.row_count();
        let col_idx = *self
            .addressable
            .get(addr.col as usize)
            .ok_or(Error::ColumnOutOfBounds(addr.col, col_count))?;
        let row = self
            .rows
            .get_mut(addr.row as usize)
            .ok_or(Error::RowOutOfBounds(addr.row, row_count))?;
        row.set(self.columns[col_idx].key.clone(), value);
        Ok(())
    }

    /// Overwrite the content at an A1-style address
    pub fn set<V: Into<String>>(&mut self, address: &str, value: V) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_raw(addr, value)
    }

    /// Iterate over every addressable cell in row-major order
    pub fn cells(&self) -> impl Iterator<Item = (CellAddress, &str)> {
        self.rows.iter().enumerate().flat_map(move |(row_idx, row)| {
            self.addressable
                .iter()
                .enumerate()
                .map(move |(col_idx, &i)| {
                    (
                        CellAddress::new(row_idx as u32, col_idx as u32),
                        row.get(&self.columns[i].key).unwrap_or(""),
                    )
                })
        })
    }

    /// Iterate over cells whose content is a formula, in row-major order
    pub fn formula_cells(&self) -> impl Iterator<Item = (CellAddress, &str)> {
        self.cells().filter(|(_, raw)| raw.starts_with('='))
    }
}

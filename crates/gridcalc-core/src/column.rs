//! Column definitions

use crate::cell::CellAddress;

/// Key of the identifier column, which never holds formulas and is not addressable
pub const ID_COLUMN_KEY: &str = "id";

/// Column definition supplied by the grid's owner
///
/// `title` is only a display label. Formulas address columns by their position
/// among the addressable columns, so renaming a title never changes what `A1`
/// refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColumnDef {
    /// Unique key used in row maps
    pub key: String,
    /// Display label
    #[cfg_attr(feature = "serde", serde(default))]
    pub title: String,
    /// Whether the column can hold user content (and formulas)
    #[cfg_attr(feature = "serde", serde(default = "default_editable"))]
    pub editable: bool,
}

#[cfg(feature = "serde")]
fn default_editable() -> bool {
    true
}

impl ColumnDef {
    /// Create an editable column
    pub fn new<K: Into<String>, T: Into<String>>(key: K, title: T) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            editable: true,
        }
    }

    /// Create the identifier column
    pub fn identifier() -> Self {
        Self {
            key: ID_COLUMN_KEY.to_string(),
            title: "ID".to_string(),
            editable: false,
        }
    }

    /// Create a column for the given position, keyed and titled by its letters
    pub fn generated(index: u32) -> Self {
        let letters = CellAddress::column_to_letters(index);
        Self::new(letters.clone(), letters)
    }

    /// Check if this is the identifier column
    pub fn is_identifier(&self) -> bool {
        self.key == ID_COLUMN_KEY
    }

    /// Check if formulas can address this column
    pub fn is_addressable(&self) -> bool {
        self.editable && !self.is_identifier()
    }
}

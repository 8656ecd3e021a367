//! Row type

use indexmap::IndexMap;

/// One row of a grid snapshot: column key → raw cell content
///
/// Insertion order is kept so a row serializes back the way it was received.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Row {
    cells: IndexMap<String, String>,
}

impl Row {
    /// Create an empty row
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the raw content for a column key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.cells.get(key).map(String::as_str)
    }

    /// Set the raw content for a column key
    pub fn set<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.cells.insert(key.into(), value.into());
    }

    /// Check if the row has an entry for a column key
    pub fn contains_key(&self, key: &str) -> bool {
        self.cells.contains_key(key)
    }

    /// Iterate over (key, content) pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cells.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            cells: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Cell content as it may arrive from a JSON client: numbers, booleans and
/// nulls are accepted and turned into their text form.
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum RawContent {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Null,
}

#[cfg(feature = "serde")]
impl From<RawContent> for String {
    fn from(content: RawContent) -> Self {
        match content {
            RawContent::Text(s) => s,
            RawContent::Integer(n) => n.to_string(),
            RawContent::Float(n) => n.to_string(),
            RawContent::Boolean(b) => if b { "TRUE" } else { "FALSE" }.to_string(),
            RawContent::Null => String::new(),
        }
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Row {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = IndexMap::<String, RawContent>::deserialize(deserializer)?;
        Ok(raw.into_iter().map(|(k, v)| (k, String::from(v))).collect())
    }
}

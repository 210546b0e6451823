//! Core table types for representing one AHB check-id table

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Name of the key column every AHB table carries
pub const KEY_COLUMN: &str = "Segmentname";

/// A parsed table from a single `<checkId>.csv` file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    /// Column definitions, in file order
    pub columns: Vec<Column>,
    /// Row data, in file order
    pub rows: Vec<Row>,
    /// Index of the key column within `columns`
    pub key_index: usize,
    /// Source file path
    pub source_path: PathBuf,
}

impl Table {
    /// Create an empty table whose only column is the key column
    pub fn new(source_path: PathBuf) -> Self {
        Self {
            columns: vec![Column::new(KEY_COLUMN.to_string(), 0)],
            rows: Vec::new(),
            key_index: 0,
            source_path,
        }
    }

    /// Get the number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get the number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Find a column by name
    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Data columns: every column except the key column, in file order
    pub fn data_columns(&self) -> impl Iterator<Item = &Column> {
        let key_index = self.key_index;
        self.columns.iter().filter(move |c| c.index != key_index)
    }

    /// Key value of a row; missing keys read as the empty string
    pub fn key<'a>(&self, row: &'a Row) -> &'a str {
        row.get(self.key_index).unwrap_or("")
    }

    /// Key values of all rows, in order
    pub fn keys(&self) -> Vec<&str> {
        self.rows.iter().map(|r| self.key(r)).collect()
    }
}

/// A column definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name (e.g., "Segmentname" or "Bedingungsausdruck")
    pub name: String,
    /// Column index (0-based)
    pub index: usize,
}

impl Column {
    /// Create a new column
    pub fn new(name: String, index: usize) -> Self {
        Self { name, index }
    }
}

/// A row of text cells
///
/// `None` marks a field that was empty or absent in the source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub cells: Vec<Option<String>>,
}

impl Row {
    /// Create a new row
    pub fn new(cells: Vec<Option<String>>) -> Self {
        Self { cells }
    }

    /// Build a row from raw field text; empty fields become `None`
    pub fn from_fields<'a, I>(fields: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let cells = fields
            .into_iter()
            .map(|f| if f.is_empty() { None } else { Some(f.to_string()) })
            .collect();
        Self { cells }
    }

    /// Get a cell value by column index
    pub fn get(&self, index: usize) -> Option<&str> {
        self.cells.get(index).and_then(|c| c.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table {
            columns: vec![
                Column::new("Segmentgruppe".to_string(), 0),
                Column::new(KEY_COLUMN.to_string(), 1),
                Column::new("Code".to_string(), 2),
            ],
            rows: vec![
                Row::from_fields(["SG2", "Kopf", "E_01"]),
                Row::from_fields(["", "", "E_02"]),
            ],
            key_index: 1,
            source_path: PathBuf::from("55001.csv"),
        }
    }

    #[test]
    fn test_row_from_fields_maps_empty_to_none() {
        let row = Row::from_fields(["a", "", "c"]);
        assert_eq!(row.cells, vec![Some("a".to_string()), None, Some("c".to_string())]);
        assert_eq!(row.get(1), None);
        assert_eq!(row.get(7), None);
    }

    #[test]
    fn test_data_columns_skip_key() {
        let table = sample();
        let names: Vec<&str> = table.data_columns().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Segmentgruppe", "Code"]);
    }

    #[test]
    fn test_keys_default_to_empty() {
        let table = sample();
        assert_eq!(table.keys(), vec!["Kopf", ""]);
    }

    #[test]
    fn test_key_borrows_from_row() {
        let row = Row::from_fields(["SG4", "Datum", "E_03"]);
        let key = {
            let table = sample();
            table.key(&row)
        };
        assert_eq!(key, "Datum");

        let table = sample();
        let row = Row::from_fields(["SG4"]);
        assert_eq!(table.key(&row), "");
    }

    #[test]
    fn test_new_table_has_key_column() {
        let table = Table::new(PathBuf::from("x.csv"));
        assert!(table.is_empty());
        assert!(table.find_column(KEY_COLUMN).is_some());
        assert_eq!(table.data_columns().count(), 0);
    }
}

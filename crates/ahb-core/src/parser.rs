//! CSV parser for AHB check-id tables

use crate::error::{Error, Result};
use crate::table::{Column, Row, Table, KEY_COLUMN};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Parse a CSV file into a Table
pub fn parse_csv<P: AsRef<Path>>(path: P) -> Result<Table> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    parse_reader(BufReader::new(file), path.to_path_buf())
}

/// Parse CSV from a string (useful for testing)
pub fn parse_csv_str(content: &str, source_name: &str) -> Result<Table> {
    parse_reader(content.as_bytes(), PathBuf::from(source_name))
}

fn parse_reader<R: Read>(reader: R, path: PathBuf) -> Result<Table> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true) // Allow varying number of fields
        .from_reader(reader);

    let headers = csv_reader.headers().map_err(|e| Error::Csv {
        path: path.clone(),
        source: e,
    })?;

    let columns: Vec<Column> = unique_header_names(headers.iter(), &path)
        .into_iter()
        .enumerate()
        .map(|(i, name)| Column::new(name, i))
        .collect();

    if columns.is_empty() {
        return Err(Error::CsvParse {
            path,
            message: "no columns found in CSV".to_string(),
        });
    }

    let key_index = columns
        .iter()
        .position(|c| c.name == KEY_COLUMN)
        .ok_or_else(|| Error::MissingKeyColumn {
            path: path.clone(),
            column: KEY_COLUMN.to_string(),
        })?;

    let mut rows = Vec::new();
    for (row_idx, result) in csv_reader.records().enumerate() {
        let record = result.map_err(|e| Error::Csv {
            path: path.clone(),
            source: e,
        })?;

        let mut row = Row::from_fields(record.iter());

        // Pad short rows so every column resolves to a (missing) cell
        if row.cells.len() < columns.len() {
            row.cells.resize(columns.len(), None);
        }

        if row.cells.len() > columns.len() {
            warn!(
                row = row_idx + 1,
                path = %path.display(),
                "row has more cells than columns, truncating"
            );
            row.cells.truncate(columns.len());
        }

        rows.push(row);
    }

    Ok(Table {
        columns,
        rows,
        key_index,
        source_path: path,
    })
}

/// Rename repeated header names to `<name>.1`, `<name>.2`, ...
///
/// The first occurrence keeps its name, so a repeated key column still
/// resolves to the leftmost one.
fn unique_header_names<'a, I>(names: I, path: &Path) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let names: Vec<&str> = names.into_iter().collect();
    let taken: HashSet<&str> = names.iter().copied().collect();
    let mut emitted: HashSet<String> = HashSet::new();
    let mut repeats: HashMap<&str, usize> = HashMap::new();

    names
        .iter()
        .map(|&name| {
            if emitted.insert(name.to_string()) {
                return name.to_string();
            }
            let counter = repeats.entry(name).or_insert(0);
            let renamed = loop {
                *counter += 1;
                let candidate = format!("{}.{}", name, counter);
                if !taken.contains(candidate.as_str()) && !emitted.contains(&candidate) {
                    break candidate;
                }
            };
            warn!(
                column = name,
                renamed = %renamed,
                path = %path.display(),
                "duplicate column name"
            );
            emitted.insert(renamed.clone());
            renamed
        })
        .collect()
}

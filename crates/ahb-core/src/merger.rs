//! Merged diff table: one row per alignment decision, both versions side by side
//!
//! Column layout, fixed once per file pair:
//! `Segmentname_<prev>`, `<col>_<prev>`..., `diff`, `Segmentname_<next>`, `<col>_<next>`...

use crate::align::{align, Alignment, DiffTag, KeyMatching};
use crate::table::{Row, Table, KEY_COLUMN};
use crate::version::FormatVersion;
use serde::{Deserialize, Serialize};

/// Name of the diff-tag column
pub const DIFF_COLUMN: &str = "diff";

/// Which version a merged column belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Previous,
    Subsequent,
}

/// Column layout of a merged table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedLayout {
    pub previous_version: FormatVersion,
    pub subsequent_version: FormatVersion,
    /// Data columns of the previous table, key excluded, in file order
    pub previous_columns: Vec<String>,
    /// Data columns of the subsequent table, key excluded, in file order
    pub subsequent_columns: Vec<String>,
}

impl MergedLayout {
    pub fn new(
        previous: &Table,
        subsequent: &Table,
        previous_version: FormatVersion,
        subsequent_version: FormatVersion,
    ) -> Self {
        Self {
            previous_version,
            subsequent_version,
            previous_columns: previous.data_columns().map(|c| c.name.clone()).collect(),
            subsequent_columns: subsequent.data_columns().map(|c| c.name.clone()).collect(),
        }
    }

    /// Suffix a source column name with its version tag
    pub fn column_name(name: &str, version: FormatVersion) -> String {
        format!("{}_{}", name, version)
    }

    /// Full header in emission order
    pub fn header(&self) -> Vec<String> {
        let mut header = Vec::with_capacity(self.width());
        header.push(Self::column_name(KEY_COLUMN, self.previous_version));
        header.extend(
            self.previous_columns
                .iter()
                .map(|c| Self::column_name(c, self.previous_version)),
        );
        header.push(DIFF_COLUMN.to_string());
        header.push(Self::column_name(KEY_COLUMN, self.subsequent_version));
        header.extend(
            self.subsequent_columns
                .iter()
                .map(|c| Self::column_name(c, self.subsequent_version)),
        );
        header
    }

    /// Number of columns in every merged row
    pub fn width(&self) -> usize {
        self.previous_columns.len() + self.subsequent_columns.len() + 3
    }

    /// Index of the `diff` column
    pub fn diff_index(&self) -> usize {
        self.previous_columns.len() + 1
    }

    /// Side of a merged column, decided purely by its version suffix
    ///
    /// Returns `None` for the `diff` column and for names carrying neither tag.
    pub fn side_of(&self, column: &str) -> Option<Side> {
        let has_suffix = |version: FormatVersion| {
            column
                .strip_suffix(version.to_string().as_str())
                .is_some_and(|rest| rest.ends_with('_'))
        };

        if has_suffix(self.previous_version) {
            Some(Side::Previous)
        } else if has_suffix(self.subsequent_version) {
            Some(Side::Subsequent)
        } else {
            None
        }
    }
}

/// One merged output row, cells in layout order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedRow {
    pub diff: DiffTag,
    pub cells: Vec<String>,
}

impl MergedRow {
    /// Get a cell value by column index
    pub fn get(&self, index: usize) -> Option<&str> {
        self.cells.get(index).map(String::as_str)
    }
}

/// Counts of merged rows per diff tag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummary {
    pub unchanged: usize,
    pub new: usize,
    pub removed: usize,
}

impl DiffSummary {
    pub fn total(&self) -> usize {
        self.unchanged + self.new + self.removed
    }
}

/// The merged, annotated table for one file pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedTable {
    pub layout: MergedLayout,
    pub header: Vec<String>,
    pub rows: Vec<MergedRow>,
}

impl MergedTable {
    /// Get the number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Find a column by header name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    /// Side of a header column, see [`MergedLayout::side_of`]
    pub fn side_of(&self, column: &str) -> Option<Side> {
        self.layout.side_of(column)
    }

    pub fn summary(&self) -> DiffSummary {
        self.rows
            .iter()
            .fold(DiffSummary::default(), |mut acc, row| {
                match row.diff {
                    DiffTag::Unchanged => acc.unchanged += 1,
                    DiffTag::New => acc.new += 1,
                    DiffTag::Removed => acc.removed += 1,
                }
                acc
            })
    }
}

/// Materialize one merged row for an alignment decision
///
/// The side without a contributing row is filled with empty strings,
/// key column included. Missing source values also become empty strings.
pub fn build_row(previous: &Table, subsequent: &Table, alignment: &Alignment) -> MergedRow {
    let width = previous.column_count() + subsequent.column_count() + 1;
    let mut cells = Vec::with_capacity(width);

    push_side(&mut cells, previous, alignment.previous().map(|i| &previous.rows[i]));
    cells.push(alignment.diff_tag().as_str().to_string());
    push_side(
        &mut cells,
        subsequent,
        alignment.subsequent().map(|j| &subsequent.rows[j]),
    );

    MergedRow {
        diff: alignment.diff_tag(),
        cells,
    }
}

fn push_side(cells: &mut Vec<String>, table: &Table, row: Option<&Row>) {
    match row {
        Some(row) => {
            cells.push(table.key(row).to_string());
            cells.extend(
                table
                    .data_columns()
                    .map(|c| row.get(c.index).unwrap_or_default().to_string()),
            );
        }
        None => {
            let blanks = 1 + table.data_columns().count();
            cells.extend(std::iter::repeat_with(String::new).take(blanks));
        }
    }
}

/// Align two tables on their key column and build the merged table
pub fn merge_tables(
    previous: &Table,
    subsequent: &Table,
    previous_version: FormatVersion,
    subsequent_version: FormatVersion,
    matching: KeyMatching,
) -> MergedTable {
    let layout = MergedLayout::new(previous, subsequent, previous_version, subsequent_version);
    let header = layout.header();

    let previous_keys = previous.keys();
    let subsequent_keys = subsequent.keys();

    let rows = align(previous_keys.as_slice(), subsequent_keys.as_slice(), matching)
        .iter()
        .map(|alignment| build_row(previous, subsequent, alignment))
        .collect();

    MergedTable {
        layout,
        header,
        rows,
    }
}

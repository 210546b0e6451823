//! ahb-core: Core library for diffing Anwendungshandbuch (AHB) tables between format versions
//!
//! This library provides functionality to:
//! - Discover consecutive `FV<YY><MM>` format version directories and matching check-id files
//! - Parse check-id CSV files into tables keyed by their `Segmentname` column
//! - Align two versions of a table and build a merged table tagged NEW / REMOVED / unchanged
//! - Export merged tables to CSV and highlighted XLSX, and report on whole runs

pub mod align;
pub mod config;
pub mod error;
pub mod export;
pub mod merger;
pub mod parser;
pub mod pipeline;
pub mod report;
pub mod scanner;
pub mod table;
pub mod version;

pub use align::{align, Alignment, DiffTag, KeyMatching};
pub use config::Config;
pub use error::{Error, Result};
pub use export::{write_csv, write_xlsx};
pub use merger::{build_row, merge_tables, DiffSummary, MergedLayout, MergedRow, MergedTable, Side};
pub use parser::{parse_csv, parse_csv_str};
pub use pipeline::{compare_files, process_file_pair, process_version_pair, run};
pub use report::{FileOutcome, FileReport, PairReport, RunReport};
pub use scanner::{consecutive_pairs, matching_files, scan_format_versions, FilePair, VersionPair};
pub use table::{Column, Row, Table, KEY_COLUMN};
pub use version::FormatVersion;

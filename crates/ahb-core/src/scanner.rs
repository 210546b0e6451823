//! Directory scanner for discovering comparable format versions and check-id files
//!
//! Expected layout:
//! `<root>/<FVYYMM>/<message format>/csv/<checkId>.csv`

use crate::error::{Error, Result};
use crate::version::FormatVersion;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Name of the per-message-format subdirectory holding the tables
pub const CSV_DIR: &str = "csv";

/// Two consecutive format versions to compare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionPair {
    pub subsequent: FormatVersion,
    pub previous: FormatVersion,
}

impl VersionPair {
    /// Output directory name, `<subsequent>_<previous>`
    pub fn dir_name(&self) -> String {
        format!("{}_{}", self.subsequent, self.previous)
    }
}

/// A check-id present in both versions of one message format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePair {
    pub previous: PathBuf,
    pub subsequent: PathBuf,
    pub message_format: String,
    pub check_id: String,
}

/// Immediate children of `dir`; unreadable entries are logged and skipped
fn entries(dir: &Path, follow_links: bool) -> impl Iterator<Item = walkdir::DirEntry> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(follow_links)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "skipping unreadable directory entry");
                None
            }
        })
}

/// Immediate subdirectories of `dir`, sorted by name
fn subdirectories(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::DirectoryNotFound(dir.to_path_buf()));
    }

    let mut dirs: Vec<PathBuf> = entries(dir, true)
        .filter(|entry| entry.file_type().is_dir())
        .map(|entry| entry.into_path())
        .collect();
    dirs.sort();
    Ok(dirs)
}

fn dir_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|s| s.to_str())
}

/// All format version directories below `root`, newest first
///
/// Directory names that look like a tag but fail strict parsing abort the scan.
pub fn scan_format_versions<P: AsRef<Path>>(root: P) -> Result<Vec<FormatVersion>> {
    let root = root.as_ref();
    if !root.is_dir() {
        return Err(Error::DirectoryNotFound(root.to_path_buf()));
    }

    let mut versions = Vec::new();
    for dir in subdirectories(root)? {
        if let Some(name) = dir_name(&dir).filter(|n| FormatVersion::looks_like_tag(n)) {
            versions.push(FormatVersion::parse(name)?);
        }
    }

    versions.sort_by(|a, b| b.cmp(a));
    Ok(versions)
}

/// Message format directories of one version that contain a `csv` subdirectory
///
/// Keyed by message format name.
pub fn message_format_dirs(version_dir: &Path) -> Result<BTreeMap<String, PathBuf>> {
    if !version_dir.is_dir() {
        return Ok(BTreeMap::new());
    }

    let mut formats = BTreeMap::new();
    for dir in subdirectories(version_dir)? {
        if !dir.join(CSV_DIR).is_dir() {
            continue;
        }
        if let Some(name) = dir_name(&dir) {
            formats.insert(name.to_string(), dir.clone());
        }
    }
    Ok(formats)
}

/// Whether a version directory has nothing to compare
pub fn is_version_empty(root: &Path, version: FormatVersion) -> Result<bool> {
    Ok(message_format_dirs(&root.join(version.to_string()))?.is_empty())
}

/// Consecutive (newest-first) version pairs where both sides have content
pub fn consecutive_pairs<P: AsRef<Path>>(root: P) -> Result<Vec<VersionPair>> {
    let root = root.as_ref();
    let versions = scan_format_versions(root)?;
    let mut pairs = Vec::new();

    for window in versions.windows(2) {
        let pair = VersionPair {
            subsequent: window[0],
            previous: window[1],
        };

        if is_version_empty(root, pair.subsequent)? || is_version_empty(root, pair.previous)? {
            warn!(
                subsequent = %pair.subsequent,
                previous = %pair.previous,
                "skipping empty consecutive formatversions"
            );
            continue;
        }

        pairs.push(pair);
    }

    Ok(pairs)
}

/// `<checkId>.csv` files in a `csv` directory, keyed by check-id
fn csv_files(csv_dir: &Path) -> Result<BTreeMap<String, PathBuf>> {
    let mut files = BTreeMap::new();
    if !csv_dir.is_dir() {
        return Ok(files);
    }

    for entry in entries(csv_dir, false) {
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "csv") {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                files.insert(stem.to_string(), path.to_path_buf());
            }
        }
    }
    Ok(files)
}

/// Check-id files present in both versions, sorted by message format then check-id
pub fn matching_files<P: AsRef<Path>>(
    root: P,
    previous: FormatVersion,
    subsequent: FormatVersion,
) -> Result<Vec<FilePair>> {
    let root = root.as_ref();
    let previous_dir = root.join(previous.to_string());
    let subsequent_dir = root.join(subsequent.to_string());

    for dir in [&previous_dir, &subsequent_dir] {
        if !dir.is_dir() {
            return Err(Error::DirectoryNotFound(dir.clone()));
        }
    }

    let previous_formats = message_format_dirs(&previous_dir)?;
    let subsequent_formats = message_format_dirs(&subsequent_dir)?;

    let mut pairs = Vec::new();
    for (message_format, previous_format_dir) in &previous_formats {
        let Some(subsequent_format_dir) = subsequent_formats.get(message_format) else {
            debug!(%message_format, %subsequent, "message format missing in subsequent version");
            continue;
        };

        let previous_files = csv_files(&previous_format_dir.join(CSV_DIR))?;
        let subsequent_files = csv_files(&subsequent_format_dir.join(CSV_DIR))?;

        for (check_id, previous_path) in &previous_files {
            if let Some(subsequent_path) = subsequent_files.get(check_id) {
                pairs.push(FilePair {
                    previous: previous_path.clone(),
                    subsequent: subsequent_path.clone(),
                    message_format: message_format.clone(),
                    check_id: check_id.clone(),
                });
            }
        }
    }

    Ok(pairs)
}

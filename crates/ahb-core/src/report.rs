//! Run report: what was compared, what was written, what failed
//!
//! A run always produces a report, even when individual check-ids fail.

use crate::error::{Error, Result};
use crate::merger::DiffSummary;
use crate::scanner::VersionPair;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Result of one check-id comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    Compared {
        summary: DiffSummary,
        outputs: Vec<PathBuf>,
    },
    Failed {
        error: String,
    },
}

/// One check-id of one message format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReport {
    pub message_format: String,
    pub check_id: String,
    pub outcome: FileOutcome,
}

impl FileReport {
    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, FileOutcome::Failed { .. })
    }
}

/// All check-ids of one version pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairReport {
    pub pair: VersionPair,
    pub files: Vec<FileReport>,
    /// Set when the pair could not be listed at all
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PairReport {
    pub fn new(pair: VersionPair) -> Self {
        Self {
            pair,
            files: Vec::new(),
            error: None,
        }
    }
}

/// Report of a whole run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub pairs: Vec<PairReport>,
}

impl RunReport {
    /// Start a new report, stamped with the current time
    pub fn start(input_dir: PathBuf, output_dir: PathBuf) -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            input_dir,
            output_dir,
            pairs: Vec::new(),
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Number of check-ids compared successfully
    pub fn compared_count(&self) -> usize {
        self.files().filter(|(_, f)| !f.is_failure()).count()
    }

    /// Number of check-ids that failed
    pub fn failed_count(&self) -> usize {
        self.files().filter(|(_, f)| f.is_failure()).count()
    }

    /// Every file report with the version pair it belongs to
    pub fn files(&self) -> impl Iterator<Item = (&VersionPair, &FileReport)> {
        self.pairs
            .iter()
            .flat_map(|p| p.files.iter().map(move |f| (&p.pair, f)))
    }

    /// Per-check-id failures plus pairs that could not be listed
    pub fn has_errors(&self) -> bool {
        self.failed_count() > 0 || self.pairs.iter().any(|p| p.error.is_some())
    }

    /// Load a report from JSON
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| Error::FileRead {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(Error::Json)
    }

    /// Save the report to JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::FormatVersion;
    use tempfile::tempdir;

    fn pair() -> VersionPair {
        VersionPair {
            subsequent: FormatVersion::parse("FV2504").unwrap(),
            previous: FormatVersion::parse("FV2410").unwrap(),
        }
    }

    fn sample() -> RunReport {
        let mut report = RunReport::start(PathBuf::from("in"), PathBuf::from("out"));
        let mut pair_report = PairReport::new(pair());
        pair_report.files.push(FileReport {
            message_format: "UTILMD".to_string(),
            check_id: "55001".to_string(),
            outcome: FileOutcome::Compared {
                summary: DiffSummary {
                    unchanged: 3,
                    new: 1,
                    removed: 0,
                },
                outputs: vec![PathBuf::from("out/FV2504_FV2410/UTILMD/55001.csv")],
            },
        });
        pair_report.files.push(FileReport {
            message_format: "UTILMD".to_string(),
            check_id: "55002".to_string(),
            outcome: FileOutcome::Failed {
                error: "failed to parse CSV".to_string(),
            },
        });
        report.pairs.push(pair_report);
        report.finish();
        report
    }

    #[test]
    fn test_counts() {
        let report = sample();
        assert_eq!(report.compared_count(), 1);
        assert_eq!(report.failed_count(), 1);
        assert!(report.has_errors());
        assert!(report.finished_at.unwrap() >= report.started_at);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.json");
        let report = sample();
        report.save(&path).unwrap();

        let loaded = RunReport::load(&path).unwrap();
        assert_eq!(loaded.pairs, report.pairs);
        assert_eq!(loaded.started_at, report.started_at);

        let json = std::fs::read_to_string(&path).unwrap();
        assert!(json.contains("\"status\": \"failed\""));
        assert!(json.contains("\"subsequent\": \"FV2504\""));
    }

    #[test]
    fn test_empty_report_has_no_errors() {
        let report = RunReport::start(PathBuf::from("in"), PathBuf::from("out"));
        assert_eq!(report.compared_count(), 0);
        assert!(!report.has_errors());
    }
}

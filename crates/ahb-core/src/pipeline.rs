//! Batch orchestration: discover version pairs, compare matching check-ids, export
//!
//! Processing is sequential, one file pair at a time. Per-pair and
//! per-check-id failures are logged and recorded in the report; only
//! discovery failures (missing input root, malformed version tag) abort.

use crate::align::KeyMatching;
use crate::config::Config;
use crate::error::Result;
use crate::export::{write_csv, write_xlsx};
use crate::merger::{merge_tables, MergedTable};
use crate::parser::parse_csv;
use crate::report::{FileOutcome, FileReport, PairReport, RunReport};
use crate::scanner::{consecutive_pairs, matching_files, FilePair, VersionPair};
use crate::version::FormatVersion;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Load two check-id tables and merge them
pub fn compare_files<P: AsRef<Path>, Q: AsRef<Path>>(
    previous_path: P,
    subsequent_path: Q,
    previous_version: FormatVersion,
    subsequent_version: FormatVersion,
    matching: KeyMatching,
) -> Result<MergedTable> {
    let previous = parse_csv(previous_path)?;
    let subsequent = parse_csv(subsequent_path)?;
    Ok(merge_tables(
        &previous,
        &subsequent,
        previous_version,
        subsequent_version,
        matching,
    ))
}

/// Write `<check_id>.csv` and/or `<check_id>.xlsx` into `dir`, creating it if needed
///
/// On failure, files already written for this check-id are removed again so
/// a failed check-id leaves no partial output behind.
pub fn write_outputs(
    table: &MergedTable,
    dir: &Path,
    check_id: &str,
    csv: bool,
    xlsx: bool,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let mut outputs = Vec::new();

    if csv {
        let path = dir.join(format!("{}.csv", check_id));
        if let Err(e) = write_csv(table, &path) {
            discard_outputs(&outputs, &path);
            return Err(e);
        }
        outputs.push(path);
    }
    if xlsx {
        let path = dir.join(format!("{}.xlsx", check_id));
        if let Err(e) = write_xlsx(table, &path) {
            discard_outputs(&outputs, &path);
            return Err(e);
        }
        outputs.push(path);
    }

    Ok(outputs)
}

fn discard_outputs(written: &[PathBuf], failed: &Path) {
    let partial = failed.is_file().then_some(failed);
    for path in written.iter().map(PathBuf::as_path).chain(partial) {
        match fs::remove_file(path) {
            Ok(()) => debug!(path = %path.display(), "removed partial output"),
            Err(e) => warn!(path = %path.display(), error = %e, "failed to remove partial output"),
        }
    }
}

/// Output directory for one message format of a version pair
pub fn output_dir_for(config: &Config, pair: &VersionPair, message_format: &str) -> PathBuf {
    config.output_dir.join(pair.dir_name()).join(message_format)
}

/// Compare one check-id and write its outputs
pub fn process_file_pair(config: &Config, pair: &VersionPair, file: &FilePair) -> FileOutcome {
    let result = compare_files(
        &file.previous,
        &file.subsequent,
        pair.previous,
        pair.subsequent,
        config.key_matching,
    )
    .and_then(|table| {
        let dir = output_dir_for(config, pair, &file.message_format);
        let outputs = write_outputs(
            &table,
            &dir,
            &file.check_id,
            config.write_csv,
            config.write_xlsx,
        )?;
        Ok((table.summary(), outputs))
    });

    match result {
        Ok((summary, outputs)) => {
            info!(
                message_format = %file.message_format,
                check_id = %file.check_id,
                unchanged = summary.unchanged,
                new = summary.new,
                removed = summary.removed,
                "successfully processed"
            );
            FileOutcome::Compared { summary, outputs }
        }
        Err(e) => {
            error!(
                subsequent = %pair.subsequent,
                previous = %pair.previous,
                message_format = %file.message_format,
                check_id = %file.check_id,
                error = %e,
                "failed to process check-id"
            );
            FileOutcome::Failed {
                error: e.to_string(),
            }
        }
    }
}

/// Compare every matching check-id of one version pair
pub fn process_version_pair(config: &Config, pair: VersionPair) -> PairReport {
    let mut report = PairReport::new(pair);

    let files = match matching_files(&config.input_dir, pair.previous, pair.subsequent) {
        Ok(files) => files,
        Err(e) => {
            error!(
                subsequent = %pair.subsequent,
                previous = %pair.previous,
                error = %e,
                "error processing formatversions"
            );
            report.error = Some(e.to_string());
            return report;
        }
    };

    if files.is_empty() {
        warn!(
            subsequent = %pair.subsequent,
            previous = %pair.previous,
            "no matching files found to compare"
        );
        return report;
    }

    for file in &files {
        info!(
            message_format = %file.message_format,
            check_id = %file.check_id,
            "processing"
        );
        report.files.push(FileReport {
            message_format: file.message_format.clone(),
            check_id: file.check_id.clone(),
            outcome: process_file_pair(config, &pair, file),
        });
    }

    report
}

/// Process all consecutive version pairs below the configured input root
pub fn run(config: &Config) -> Result<RunReport> {
    config.validate()?;

    info!(input_dir = %config.input_dir.display(), "found AHB root directory");
    info!(output_dir = %config.output_dir.display(), "output directory");

    let mut report = RunReport::start(config.input_dir.clone(), config.output_dir.clone());
    let pairs = consecutive_pairs(&config.input_dir)?;

    if pairs.is_empty() {
        warn!("no valid consecutive formatversion subdirectories found to compare");
    }

    for pair in pairs {
        info!(
            subsequent = %pair.subsequent,
            previous = %pair.previous,
            "processing consecutive formatversions"
        );
        report.pairs.push(process_version_pair(config, pair));
    }

    report.finish();
    info!(
        compared = report.compared_count(),
        failed = report.failed_count(),
        "run complete"
    );
    Ok(report)
}

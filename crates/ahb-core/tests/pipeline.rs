//! End-to-end runs over a small AHB directory tree

use ahb_core::{
    consecutive_pairs, merge_tables, parse_csv_str, run, Config, DiffTag, FileOutcome,
    FormatVersion, KeyMatching, RunReport,
};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Three releases, one of them without any message format content
fn build_tree(root: &Path) {
    write(
        root,
        "FV2310/UTILMD/csv/55001.csv",
        "Segmentname,Segment,Bedingungsausdruck\nNachrichten-Kopfsegment,UNH,Muss\nBeginn der Nachricht,BGM,Muss\n",
    );
    write(
        root,
        "FV2410/UTILMD/csv/55001.csv",
        "Segmentname,Segment,Bedingungsausdruck\nNachrichten-Kopfsegment,UNH,Muss\nBeginn der Nachricht,BGM,Muss\nNachrichtendatum,DTM,Muss\n",
    );
    write(
        root,
        "FV2504/UTILMD/csv/55001.csv",
        "Segmentname,Segment,Bedingungsausdruck,Bedingung\nNachrichten-Kopfsegment,UNH,Muss,\nNachrichtendatum,DTM,Soll,[1]\n",
    );
    write(
        root,
        "FV2504/UTILMD/csv/55003.csv",
        "Segmentname\nOnly in FV2504\n",
    );
    write(root, "FV2504/MSCONS/csv/13002.csv", "Segmentname\nA\n");
    fs::create_dir_all(root.join("FV2404")).unwrap();
}

#[test]
fn test_full_run() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    build_tree(input.path());

    let config = Config::new(input.path(), output.path());
    let report = run(&config).unwrap();

    // FV2404 has no content, so both pairs touching it are skipped
    let pairs: Vec<String> = report.pairs.iter().map(|p| p.pair.dir_name()).collect();
    assert_eq!(pairs, vec!["FV2504_FV2410"]);
    assert_eq!(report.compared_count(), 1);
    assert!(!report.has_errors());

    let merged = fs::read_to_string(output.path().join("FV2504_FV2410/UTILMD/55001.csv")).unwrap();
    let lines: Vec<&str> = merged.lines().collect();
    assert_eq!(
        lines,
        vec![
            "Segmentname_FV2410,Segment_FV2410,Bedingungsausdruck_FV2410,diff,Segmentname_FV2504,Segment_FV2504,Bedingungsausdruck_FV2504,Bedingung_FV2504",
            "Nachrichten-Kopfsegment,UNH,Muss,,Nachrichten-Kopfsegment,UNH,Muss,",
            "Beginn der Nachricht,BGM,Muss,REMOVED,,,,",
            "Nachrichtendatum,DTM,Muss,,Nachrichtendatum,DTM,Soll,[1]",
        ]
    );
    assert!(output.path().join("FV2504_FV2410/UTILMD/55001.xlsx").exists());
    assert!(!output.path().join("FV2504_FV2410/UTILMD/55003.csv").exists());
    assert!(!output.path().join("FV2504_FV2410/MSCONS").exists());
}

#[test]
fn test_report_round_trip() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    build_tree(input.path());

    let report = run(&Config::new(input.path(), output.path())).unwrap();
    let path = output.path().join("report.json");
    report.save(&path).unwrap();

    let loaded = RunReport::load(&path).unwrap();
    let FileOutcome::Compared { summary, .. } = &loaded.pairs[0].files[0].outcome else {
        panic!("expected a comparison");
    };
    assert_eq!((summary.unchanged, summary.new, summary.removed), (2, 0, 1));
}

#[test]
fn test_invalid_version_directory_aborts() {
    let input = tempdir().unwrap();
    build_tree(input.path());
    fs::create_dir_all(input.path().join("FV2599")).unwrap();

    assert!(consecutive_pairs(input.path()).is_err());
}

#[test]
fn test_repeated_runs_are_identical() {
    let input = tempdir().unwrap();
    build_tree(input.path());

    let first = tempdir().unwrap();
    let second = tempdir().unwrap();
    run(&Config::new(input.path(), first.path())).unwrap();
    run(&Config::new(input.path(), second.path())).unwrap();

    let rel = "FV2504_FV2410/UTILMD/55001.csv";
    assert_eq!(
        fs::read(first.path().join(rel)).unwrap(),
        fs::read(second.path().join(rel)).unwrap()
    );
}

#[test]
fn test_unchanged_sides_carry_their_own_values() {
    let previous = parse_csv_str("Segmentname,Code\nA,old\nB,x\n", "prev.csv").unwrap();
    let subsequent = parse_csv_str("Segmentname,Code\nA,new\nB,x\n", "next.csv").unwrap();

    let table = merge_tables(
        &previous,
        &subsequent,
        FormatVersion::parse("FV2410").unwrap(),
        FormatVersion::parse("FV2504").unwrap(),
        KeyMatching::Exact,
    );

    assert!(table.rows.iter().all(|r| r.diff == DiffTag::Unchanged));
    let prev_code = table.column_index("Code_FV2410").unwrap();
    let next_code = table.column_index("Code_FV2504").unwrap();
    assert_eq!(table.rows[0].get(prev_code), Some("old"));
    assert_eq!(table.rows[0].get(next_code), Some("new"));
}

#[cfg(unix)]
#[test]
fn test_dangling_symlink_does_not_abort_run() {
    use std::os::unix::fs::symlink;

    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    build_tree(input.path());
    symlink(input.path().join("gone"), input.path().join("FV2504/stale_link")).unwrap();

    let report = run(&Config::new(input.path(), output.path())).unwrap();
    assert_eq!(report.compared_count(), 1);
    assert!(!report.has_errors());
    assert!(output.path().join("FV2504_FV2410/UTILMD/55001.csv").exists());
}

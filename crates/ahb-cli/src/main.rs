//! AHB Diff CLI
//!
//! Command-line tool for comparing Anwendungshandbuch tables between consecutive format versions.

use ahb_core::pipeline::write_outputs;
use ahb_core::{
    compare_files, consecutive_pairs, matching_files, run, Config, FileOutcome, FormatVersion,
    KeyMatching, RunReport,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "ahb-diff")]
#[command(about = "Diff machine-readable AHB tables between format versions", long_about = None)]
#[command(version)]
struct Cli {
    /// Log debug output (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Key comparison mode
#[derive(Clone, Copy, ValueEnum)]
enum Matching {
    Exact,
    IgnoreWhitespace,
}

impl From<Matching> for KeyMatching {
    fn from(value: Matching) -> Self {
        match value {
            Matching::Exact => KeyMatching::Exact,
            Matching::IgnoreWhitespace => KeyMatching::IgnoreWhitespace,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Compare all consecutive format versions below the input directory
    Run {
        /// Config file (JSON); flags override its values
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Directory containing the FV<YY><MM> directories
        #[arg(short, long, required_unless_present = "config")]
        input_dir: Option<PathBuf>,

        /// Destination directory for merged tables
        #[arg(short, long, required_unless_present = "config")]
        output_dir: Option<PathBuf>,

        /// How Segmentname keys are compared
        #[arg(long, value_enum)]
        matching: Option<Matching>,

        /// Skip the XLSX output
        #[arg(long)]
        no_xlsx: bool,

        /// Skip the CSV output
        #[arg(long)]
        no_csv: bool,

        /// Write a JSON run report to this path
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// List the format version pairs that would be compared
    Pairs {
        /// Directory containing the FV<YY><MM> directories
        #[arg(short, long)]
        input_dir: PathBuf,

        /// Also list matching check-id files per pair
        #[arg(short, long)]
        files: bool,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compare a single pair of check-id files
    Compare {
        /// Table of the previous format version
        #[arg(long)]
        previous: PathBuf,

        /// Table of the subsequent format version
        #[arg(long)]
        subsequent: PathBuf,

        /// Previous format version tag (e.g. FV2410)
        #[arg(long)]
        previous_version: String,

        /// Subsequent format version tag (e.g. FV2504)
        #[arg(long)]
        subsequent_version: String,

        /// Output directory; prints the merged table when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// How Segmentname keys are compared
        #[arg(long, value_enum, default_value = "exact")]
        matching: Matching,

        /// Maximum number of rows to display
        #[arg(short, long)]
        limit: Option<usize>,

        /// Skip the XLSX output
        #[arg(long)]
        no_xlsx: bool,
    },

    /// Create a config file template
    CreateConfig {
        /// Output path for the config file
        #[arg(short, long)]
        output: PathBuf,

        /// Input directory to include
        #[arg(short, long, default_value = "data/machine-readable_anwendungshandbuecher")]
        input_dir: PathBuf,

        /// Output directory to include
        #[arg(long, default_value = "data/output")]
        output_dir: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = execute(cli.command) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn execute(command: Commands) -> ahb_core::Result<()> {
    match command {
        Commands::Run {
            config,
            input_dir,
            output_dir,
            matching,
            no_xlsx,
            no_csv,
            report,
        } => {
            let mut cfg = match config {
                Some(path) => Config::load(path)?,
                None => Config::new(PathBuf::new(), PathBuf::new()),
            };
            if let Some(dir) = input_dir {
                cfg.input_dir = dir;
            }
            if let Some(dir) = output_dir {
                cfg.output_dir = dir;
            }
            if let Some(matching) = matching {
                cfg.key_matching = matching.into();
            }
            cfg.write_xlsx &= !no_xlsx;
            cfg.write_csv &= !no_csv;
            cmd_run(&cfg, report.as_deref())
        }
        Commands::Pairs {
            input_dir,
            files,
            json,
        } => cmd_pairs(&input_dir, files, json),
        Commands::Compare {
            previous,
            subsequent,
            previous_version,
            subsequent_version,
            output,
            matching,
            limit,
            no_xlsx,
        } => cmd_compare(
            &previous,
            &subsequent,
            &previous_version,
            &subsequent_version,
            output.as_deref(),
            matching.into(),
            limit,
            !no_xlsx,
        ),
        Commands::CreateConfig {
            output,
            input_dir,
            output_dir,
        } => cmd_create_config(&output, input_dir, output_dir),
    }
}

fn cmd_run(config: &Config, report_path: Option<&Path>) -> ahb_core::Result<()> {
    let report = run(config)?;

    if let Some(path) = report_path {
        report.save(path)?;
        info!(path = %path.display(), "wrote run report");
    }

    print_summary(&report);
    Ok(())
}

fn print_summary(report: &RunReport) {
    println!();
    println!("Run complete:");
    println!("  {} version pair(s)", report.pairs.len());
    println!("  {} check-id(s) compared", report.compared_count());

    let pair_errors: Vec<_> = report
        .pairs
        .iter()
        .filter_map(|p| p.error.as_ref().map(|e| (p.pair.dir_name(), e)))
        .collect();
    let failures: Vec<_> = report
        .files()
        .filter_map(|(pair, file)| match &file.outcome {
            FileOutcome::Failed { error } => Some((pair, file, error)),
            FileOutcome::Compared { .. } => None,
        })
        .collect();

    if pair_errors.is_empty() && failures.is_empty() {
        return;
    }

    println!("\nErrors ({}):", pair_errors.len() + failures.len());
    for (pair, error) in &pair_errors {
        println!("  {}: {}", pair, error);
    }
    for (pair, file, error) in &failures {
        println!(
            "  {}/{}/{}: {}",
            pair.dir_name(),
            file.message_format,
            file.check_id,
            error
        );
    }
}

fn cmd_pairs(input_dir: &Path, with_files: bool, json: bool) -> ahb_core::Result<()> {
    let pairs = consecutive_pairs(input_dir)?;

    if json {
        let mut entries = Vec::new();
        for pair in &pairs {
            let files = if with_files {
                matching_files(input_dir, pair.previous, pair.subsequent)?
            } else {
                Vec::new()
            };
            entries.push(serde_json::json!({
                "subsequent": pair.subsequent,
                "previous": pair.previous,
                "files": files,
            }));
        }
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("Version pairs ({}):", pairs.len());
    println!();

    for pair in &pairs {
        println!("  {} -> {}", pair.subsequent, pair.previous);
        if with_files {
            for file in matching_files(input_dir, pair.previous, pair.subsequent)? {
                println!("    {}/{}", file.message_format, file.check_id);
            }
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_compare(
    previous: &Path,
    subsequent: &Path,
    previous_version: &str,
    subsequent_version: &str,
    output: Option<&Path>,
    matching: KeyMatching,
    limit: Option<usize>,
    xlsx: bool,
) -> ahb_core::Result<()> {
    let previous_version = FormatVersion::parse(previous_version)?;
    let subsequent_version = FormatVersion::parse(subsequent_version)?;

    let merged = compare_files(
        previous,
        subsequent,
        previous_version,
        subsequent_version,
        matching,
    )?;
    let summary = merged.summary();

    if let Some(dir) = output {
        let check_id = subsequent
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("diff");
        for path in write_outputs(&merged, dir, check_id, true, xlsx)? {
            println!("Wrote {}", path.display());
        }
    } else {
        println!("{}", merged.header.join("\t"));
        println!("{}", "-".repeat(merged.header.len() * 12));

        let row_limit = limit.unwrap_or(merged.rows.len());
        for row in merged.rows.iter().take(row_limit) {
            println!("{}", row.cells.join("\t"));
        }
        if merged.rows.len() > row_limit {
            println!("... ({} more rows)", merged.rows.len() - row_limit);
        }
    }

    println!();
    println!(
        "{} rows: {} unchanged, {} new, {} removed",
        summary.total(),
        summary.unchanged,
        summary.new,
        summary.removed
    );

    Ok(())
}

fn cmd_create_config(output: &Path, input_dir: PathBuf, output_dir: PathBuf) -> ahb_core::Result<()> {
    let config = Config::new(input_dir, output_dir);
    config.save(output)?;

    println!("Created config file: {}", output.display());
    println!();
    println!("Edit the file to configure your run, then run:");
    println!("  ahb-diff run --config {}", output.display());

    Ok(())
}

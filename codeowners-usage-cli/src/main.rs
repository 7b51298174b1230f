use std::{
    fs::{self, File},
    io::{self, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use codeowners_usage::{
    Aggregator, IndexCell, IndexOptions, ManifestFile, MatchMode, ResultTable, UsageReport,
};

const DEFAULT_OUTPUT_DIR: &str = "output";
const DEFAULT_OUTPUT_FILENAME: &str = "usage-by-codeowner.json";
const LOG_ENV: &str = "USAGE_BY_CODEOWNER_LOG";

/// Count design system component usage by CODEOWNER.
#[derive(Parser)]
#[command(version)]
struct Cli {
    /// Path to the CODEOWNERS file
    #[arg(long = "codeowners")]
    codeowners_file: PathBuf,

    /// Path to the raw usage report produced by the component scanner, or `-`
    /// for stdin
    #[arg(short, long)]
    report: PathBuf,

    /// Output file or directory (defaults to ./output/usage-by-codeowner.json)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// How patterns are matched against file paths
    #[arg(long, value_enum, default_value_t = Mode::Substring)]
    match_mode: Mode,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Substring,
    Anchored,
}

impl From<Mode> for MatchMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Substring => MatchMode::Substring,
            Mode::Anchored => MatchMode::Anchored,
        }
    }
}

impl Cli {
    fn index_options(&self) -> IndexOptions {
        IndexOptions {
            match_mode: self.match_mode.into(),
        }
    }

    fn read_report(&self) -> Result<UsageReport> {
        let report = if self.report == Path::new("-") {
            UsageReport::from_reader(io::stdin().lock())
        } else {
            let file = File::open(&self.report).with_context(|| {
                format!("failed to open usage report {}", self.report.display())
            })?;
            UsageReport::from_reader(BufReader::new(file))
        };
        report.with_context(|| format!("failed to load usage report {}", self.report.display()))
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    match run(&cli) {
        Ok(output_path) => {
            println!("Component usage analysis completed successfully.");
            println!("Results written to {}", output_path.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<PathBuf> {
    let cell = IndexCell::new(ManifestFile::new(&cli.codeowners_file), cli.index_options());
    let index = cell.get()?;
    tracing::debug!(path = %cli.codeowners_file.display(), "CODEOWNERS path");

    let output_path = resolve_output_path(cli.output.as_deref())?;
    tracing::debug!(path = %output_path.display(), "output path");

    let report = cli.read_report()?;
    tracing::debug!(
        components = report.len(),
        instances = report.instance_count(),
        "loaded usage report"
    );

    let aggregation = Aggregator::new(index).run(&report);
    for unattributed in &aggregation.unattributed {
        tracing::debug!(
            component = %unattributed.component,
            instance = unattributed.instance,
            "{}",
            unattributed.reason
        );
    }

    write_results(&output_path, &aggregation.table)?;
    Ok(output_path)
}

/// Resolve where results go. An existing directory gets the default file
/// name appended, and missing parent directories are created.
fn resolve_output_path(output: Option<&Path>) -> Result<PathBuf> {
    let path = match output {
        None => std::env::current_dir()
            .context("failed to determine current directory")?
            .join(DEFAULT_OUTPUT_DIR)
            .join(DEFAULT_OUTPUT_FILENAME),
        Some(path) if path.is_dir() => path.join(DEFAULT_OUTPUT_FILENAME),
        Some(path) => path.to_path_buf(),
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    Ok(path)
}

fn write_results(path: &Path, table: &ResultTable) -> Result<()> {
    tracing::debug!(path = %path.display(), "writing results");
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, table)
        .with_context(|| format!("failed to write results to {}", path.display()))?;
    writer.flush()?;
    Ok(())
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

//! Command-line interface for goindex.

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{self, ThrottleConfig};
use crate::fs::{FileSystem, OsFs};
use crate::index::Indexer;
use crate::report::{self, JsonIndexReport, JsonPackage, JsonScanReport};
use crate::scan::{ScanProgress, Scanner};

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_ERROR: i32 = 2;

const FORMATS: &[&str] = &["pretty", "json"];

/// Index a Go source tree into one artifact per top-level declaration.
///
/// Every constant, variable, type, function and method becomes a small file
/// holding its package path, the imports of its file and its exact source
/// text, named so it can be found without a lookup table.
#[derive(Parser)]
#[command(name = "goindex")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan a source tree and write index artifacts
    Index(IndexArgs),
    /// List packages and symbols without writing anything
    #[command(visible_alias = "ls")]
    Scan(ScanArgs),
}

/// Options shared by both commands.
#[derive(Parser)]
pub struct SourceArgs {
    /// Root directory of the Go source tree
    pub path: PathBuf,

    /// Base module path (default: read from go.mod)
    #[arg(short, long)]
    pub module: Option<String>,

    /// Limit CPU usage to this percentage, 1-100 (default: $GOINDEX_CPU_LIMIT)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=100))]
    pub cpu_limit: Option<u32>,

    /// Skip directories matching this glob (repeatable)
    #[arg(short, long)]
    pub exclude: Vec<String>,

    /// Output format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: String,
}

/// Arguments for the index command.
#[derive(Parser)]
pub struct IndexArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Destination directory for index artifacts
    #[arg(short, long)]
    pub output: PathBuf,

    /// Do not show a progress bar
    #[arg(short, long)]
    pub quiet: bool,
}

/// Arguments for the scan command.
#[derive(Parser)]
pub struct ScanArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}

/// A validated source tree ready to scan.
struct Target {
    root: PathBuf,
    module: String,
    scanner: Scanner,
}

/// Validate shared arguments. `Err(code)` means a message was printed.
fn prepare(args: &SourceArgs, fs: Arc<dyn FileSystem>) -> anyhow::Result<Result<Target, i32>> {
    if !FORMATS.contains(&args.format.as_str()) {
        eprintln!(
            "Error: invalid format {:?}, must be 'pretty' or 'json'",
            args.format
        );
        return Ok(Err(EXIT_ERROR));
    }

    if !fs.is_dir(&args.path) {
        eprintln!("Error: not a directory: {}", args.path.display());
        return Ok(Err(EXIT_ERROR));
    }

    let module = match args
        .module
        .clone()
        .or_else(|| config::module_path_from_go_mod(fs.as_ref(), &args.path))
    {
        Some(m) => m,
        None => {
            eprintln!("Error: no go.mod found in {}", args.path.display());
            eprintln!("Pass --module to set the base module path");
            return Ok(Err(EXIT_ERROR));
        }
    };

    let throttle = match args.cpu_limit {
        Some(percent) => ThrottleConfig::for_percent(percent, config::available_cpus()),
        None => ThrottleConfig::from_env(),
    };

    let scanner = match Scanner::new(fs, &args.path)
        .with_throttle(throttle)
        .with_excludes(args.exclude.as_slice())
    {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return Ok(Err(EXIT_ERROR));
        }
    };

    Ok(Ok(Target {
        root: args.path.clone(),
        module,
        scanner,
    }))
}

fn progress_bar(hidden: bool) -> anyhow::Result<ProgressBar> {
    if hidden {
        return Ok(ProgressBar::hidden());
    }
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template("  {spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg:.dim}")?
            .progress_chars("=> "),
    );
    Ok(bar)
}

fn update_bar(bar: &ProgressBar, progress: &ScanProgress) {
    bar.set_length(progress.total as u64);
    bar.set_position(progress.completed as u64);
    bar.set_message(progress.current.clone());
}

/// Run the index command.
pub fn run_index(args: &IndexArgs) -> anyhow::Result<i32> {
    let fs = OsFs::shared();
    let target = match prepare(&args.source, fs.clone())? {
        Ok(t) => t,
        Err(code) => return Ok(code),
    };

    let hidden = args.quiet || args.source.format == "json";
    let bar = progress_bar(hidden)?;
    let throttle = *target.scanner.throttle();
    let indexer = Indexer::new(target.scanner, fs);

    let result = indexer.index_source_code(&target.module, &args.output, |p| update_bar(&bar, p));
    bar.finish_and_clear();

    let stats = match result {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    let report = JsonIndexReport::new(
        &display(&target.root),
        &target.module,
        &display(&args.output),
        &throttle,
        &stats,
    );
    match args.source.format.as_str() {
        "json" => report::write_index_json(&report)?,
        _ => report::write_index_pretty(&report),
    }

    Ok(EXIT_SUCCESS)
}

/// Run the scan command.
pub fn run_scan(args: &ScanArgs) -> anyhow::Result<i32> {
    let target = match prepare(&args.source, OsFs::shared())? {
        Ok(t) => t,
        Err(code) => return Ok(code),
    };

    let packages = Mutex::new(Vec::new());
    let scanned = target.scanner.scan_packages_recursively(
        &target.module,
        |result, url| packages.lock().push(JsonPackage::new(url, &result)),
        |_| {},
    );

    if let Err(e) = scanned {
        eprintln!("Error: {}", e);
        return Ok(EXIT_ERROR);
    }

    let report = JsonScanReport::new(&display(&target.root), &target.module, packages.into_inner());
    match args.source.format.as_str() {
        "json" => report::write_scan_json(&report)?,
        _ => report::write_scan_pretty(&report),
    }

    Ok(EXIT_SUCCESS)
}

fn display(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

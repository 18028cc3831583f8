//! Output formatting for goindex results.
//!
//! Two formats are supported:
//! - Pretty: colored terminal output for humans
//! - JSON: structured output for scripts and CI

use colored::*;
use serde::{Deserialize, Serialize};

use crate::analysis::{PackageResult, Symbol};
use crate::config::ThrottleConfig;
use crate::index::IndexStats;

// =============================================================================
// Index command
// =============================================================================

/// JSON summary of an `index` run.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonIndexReport {
    pub version: String,
    pub path: String,
    pub module: String,
    pub output: String,
    pub cpu_limit: u32,
    pub workers: usize,
    pub packages: usize,
    pub artifacts_written: usize,
    pub artifacts_skipped: usize,
}

impl JsonIndexReport {
    pub fn new(path: &str, module: &str, output: &str, throttle: &ThrottleConfig, stats: &IndexStats) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            path: path.to_string(),
            module: module.to_string(),
            output: output.to_string(),
            cpu_limit: throttle.cpu_limit_percent,
            workers: throttle.max_workers,
            packages: stats.packages,
            artifacts_written: stats.artifacts_written,
            artifacts_skipped: stats.artifacts_skipped,
        }
    }
}

/// Write an index summary as JSON on stdout.
pub fn write_index_json(report: &JsonIndexReport) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    println!("{}", json);
    Ok(())
}

/// Write an index summary for the terminal.
pub fn write_index_pretty(report: &JsonIndexReport) {
    write_header();

    print!("  {}", "Scanning: ".dimmed());
    println!("{}", report.path);
    print!("  {}", "Module:   ".dimmed());
    println!("{}", report.module);
    print!("  {}", "Output:   ".dimmed());
    println!("{}", report.output);
    if report.cpu_limit < 100 {
        print!("  {}", "CPU limit:".dimmed());
        println!(" {}% ({} workers)", report.cpu_limit, report.workers);
    }
    println!();

    print!("  {}", "✓ DONE".green());
    print!(
        "  {} packages, {} artifacts written",
        report.packages.to_string().bold(),
        report.artifacts_written.to_string().bold()
    );
    if report.artifacts_skipped > 0 {
        print!(
            "  {}",
            format!("({} skipped)", report.artifacts_skipped).yellow()
        );
    }
    println!();
    println!();
}

// =============================================================================
// Scan command
// =============================================================================

/// One symbol in a scan listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonSymbol {
    pub kind: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
    pub file: String,
    pub start_line: usize,
    pub end_line: usize,
    pub index_file: String,
}

impl From<&Symbol> for JsonSymbol {
    fn from(symbol: &Symbol) -> Self {
        let range = symbol.range();
        Self {
            kind: symbol.kind().as_str().to_string(),
            name: symbol.name().to_string(),
            receiver: symbol.receiver().map(str::to_string),
            file: range
                .unit()
                .map(|u| u.file_name().to_string())
                .unwrap_or_default(),
            start_line: range.start_line(),
            end_line: range.end_line(),
            index_file: symbol.index_file_name(),
        }
    }
}

/// One package in a scan listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonPackage {
    pub url: String,
    pub files: Vec<String>,
    pub symbols: Vec<JsonSymbol>,
}

impl JsonPackage {
    /// Build a listing entry. Files are sorted, symbols keep extraction order.
    pub fn new(url: &str, result: &PackageResult) -> Self {
        let mut files: Vec<String> = result
            .files
            .iter()
            .map(|u| u.file_name().to_string())
            .collect();
        files.sort();

        Self {
            url: url.to_string(),
            files,
            symbols: result.symbols().map(JsonSymbol::from).collect(),
        }
    }
}

/// JSON listing produced by the `scan` command.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonScanReport {
    pub version: String,
    pub path: String,
    pub module: String,
    pub packages: Vec<JsonPackage>,
}

impl JsonScanReport {
    /// Packages are sorted by URL so output is stable across runs.
    pub fn new(path: &str, module: &str, mut packages: Vec<JsonPackage>) -> Self {
        packages.sort_by(|a, b| a.url.cmp(&b.url));
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            path: path.to_string(),
            module: module.to_string(),
            packages,
        }
    }

    pub fn symbol_count(&self) -> usize {
        self.packages.iter().map(|p| p.symbols.len()).sum()
    }
}

/// Write a scan listing as JSON on stdout.
pub fn write_scan_json(report: &JsonScanReport) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    println!("{}", json);
    Ok(())
}

/// Write a scan listing for the terminal.
pub fn write_scan_pretty(report: &JsonScanReport) {
    write_header();

    print!("  {}", "Scanning: ".dimmed());
    println!("{}", report.path);
    print!("  {}", "Module:   ".dimmed());
    println!("{}", report.module);
    println!();

    for package in &report.packages {
        write_package(package);
    }

    print!("  {}", "✓ DONE".green());
    println!(
        "  {} packages, {} symbols",
        report.packages.len().to_string().bold(),
        report.symbol_count().to_string().bold()
    );
    println!();
}

fn write_header() {
    println!();
    print!("  ");
    print!("{}", "goindex".cyan().bold());
    println!(" v{}", env!("CARGO_PKG_VERSION"));
    println!();
}

fn write_package(package: &JsonPackage) {
    print!("  {}", package.url.bold());
    if package.symbols.is_empty() {
        print!("  {}", "(no symbols)".dimmed());
    }
    println!();

    for symbol in &package.symbols {
        let label = match &symbol.receiver {
            Some(receiver) => format!("({}) {}", receiver, symbol.name),
            None => symbol.name.clone(),
        };
        println!(
            "    {:<7}{:<40}{}",
            colored_kind(&symbol.kind),
            label,
            format!("{}:{}", symbol.file, symbol.start_line).dimmed()
        );
    }
    println!();
}

fn colored_kind(kind: &str) -> ColoredString {
    match kind {
        "const" | "var" => kind.yellow(),
        "type" => kind.cyan(),
        "method" => kind.magenta(),
        _ => kind.green(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{CompilationUnit, SourceRange, SymbolKind};
    use crate::fs::MemFs;
    use std::sync::Arc;

    fn package() -> PackageResult {
        let unit = Arc::new(CompilationUnit::with_content(
            MemFs::new().shared(),
            "src/shapes/shapes.go",
            "example.com/shapes",
            "package shapes\n\ntype Circle struct{}\n\nfunc (c *Circle) Area() float64 { return 0 }\n".to_string(),
        ));
        PackageResult {
            files: vec![unit.clone()],
            types: vec![Symbol::new(
                SymbolKind::Type,
                "Circle",
                "example.com/shapes",
                SourceRange::new(unit.clone(), 3, 3),
            )],
            functions: vec![Symbol::new(
                SymbolKind::Function {
                    receiver: Some("*Circle".to_string()),
                },
                "Area",
                "example.com/shapes",
                SourceRange::new(unit, 5, 5),
            )],
            ..Default::default()
        }
    }

    #[test]
    fn test_json_package_listing() {
        let listing = JsonPackage::new("example.com/shapes", &package());

        assert_eq!(listing.files, vec!["shapes.go".to_string()]);
        assert_eq!(listing.symbols.len(), 2);
        assert_eq!(listing.symbols[0].kind, "type");
        assert_eq!(listing.symbols[0].receiver, None);

        let method = &listing.symbols[1];
        assert_eq!(method.kind, "method");
        assert_eq!(method.receiver.as_deref(), Some("*Circle"));
        assert_eq!(method.index_file, "method.Circle.Area.goindex");
        assert_eq!((method.start_line, method.end_line), (5, 5));
    }

    #[test]
    fn test_scan_report_sorted_and_serialized() {
        let report = JsonScanReport::new(
            "src",
            "example.com",
            vec![
                JsonPackage::new("example.com/shapes", &package()),
                JsonPackage::new("example.com", &PackageResult::default()),
            ],
        );
        assert_eq!(report.packages[0].url, "example.com");
        assert_eq!(report.symbol_count(), 2);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["packages"][1]["symbols"][0]["name"], "Circle");
        // Plain functions and types omit the receiver key
        assert!(json["packages"][1]["symbols"][0].get("receiver").is_none());
        assert_eq!(json["packages"][1]["symbols"][1]["receiver"], "*Circle");
    }

    #[test]
    fn test_index_report_fields() {
        let stats = IndexStats {
            packages: 3,
            artifacts_written: 10,
            artifacts_skipped: 1,
        };
        let report = JsonIndexReport::new("src", "example.com", "out", &ThrottleConfig::for_percent(50, 8), &stats);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["cpu_limit"], 50);
        assert_eq!(json["workers"], 4);
        assert_eq!(json["artifacts_written"], 10);
        assert_eq!(json["artifacts_skipped"], 1);
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    }
}

//! End-to-end indexing of the `testdata/shop` fixture module.

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tempfile::TempDir;
use walkdir::WalkDir;

use goindex::config::ThrottleConfig;
use goindex::fs::OsFs;
use goindex::index::{IndexStats, Indexer};
use goindex::scan::Scanner;

const MODULE: &str = "example.com/shop";

fn fixture_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata").join("shop")
}

fn run_index(dest: &Path) -> IndexStats {
    let scanner = Scanner::new(OsFs::shared(), fixture_root()).with_throttle(ThrottleConfig::for_percent(100, 4));
    Indexer::new(scanner, OsFs::shared())
        .index_source_code(MODULE, dest, |_| {})
        .expect("fixture should index")
}

/// Every file below `root`, relative and `/`-separated, sorted.
fn written_files(root: &Path) -> Vec<String> {
    let mut files: Vec<String> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            e.path()
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect();
    files.sort();
    files
}

fn read(dest: &TempDir, rel: &str) -> String {
    fs::read_to_string(dest.path().join(rel)).unwrap()
}

#[test]
fn test_index_writes_one_artifact_per_symbol() {
    let dest = TempDir::new().unwrap();
    let stats = run_index(dest.path());

    assert_eq!(
        stats,
        IndexStats {
            packages: 7,
            artifacts_written: 21,
            artifacts_skipped: 0,
        }
    );
    assert_eq!(
        written_files(dest.path()),
        vec![
            "billing/internal/tax/func.Apply.goindex",
            "billing/internal/tax/var.StandardRate.goindex",
            "func.NewCart.goindex",
            "inventory/method.Stock.Reserve.goindex",
            "inventory/type.Stock.goindex",
            "method.Cart.Add.goindex",
            "method.Cart.Total.goindex",
            "method.Page.Len.goindex",
            "storage/func.Open.goindex",
            "storage/type.Store.goindex",
            "type.Cart.goindex",
            "type.Checkout.goindex",
            "type.Item.goindex",
            "type.Page.goindex",
            "type.SKU.goindex",
            "var.ErrEmptyCart.goindex",
            "var.MaxItems.goindex",
            "var.Version.goindex",
            "var.currency.goindex",
            "var.highWater.goindex",
            "var.lowWater.goindex",
        ]
    );
}

#[test]
fn test_method_artifact_content() {
    let dest = TempDir::new().unwrap();
    run_index(dest.path());

    assert_eq!(
        read(&dest, "method.Cart.Add.goindex"),
        "package example.com/shop\n\
         import (\n\t\"errors\"\n\t\"fmt\"\n)\n\
         func (c *Cart) Add(sku SKU, qty int) error {\n\
         \tif len(c.Items) >= MaxItems {\n\
         \t\treturn fmt.Errorf(\"cart full: %d items\", MaxItems)\n\
         \t}\n\
         \tc.Items = append(c.Items, Item{SKU: sku, Quantity: qty})\n\
         \treturn nil\n\
         }\n"
    );
}

#[test]
fn test_grouped_constant_artifact_holds_its_own_line() {
    let dest = TempDir::new().unwrap();
    run_index(dest.path());

    let body = read(&dest, "var.MaxItems.goindex");
    assert!(body.ends_with(")\n\tMaxItems = 64\n"));
    assert!(!body.contains("currency"));

    assert!(read(&dest, "var.lowWater.goindex").ends_with("var lowWater, highWater = 5, 500\n"));
}

#[test]
fn test_artifact_without_imports_has_blank_line() {
    let dest = TempDir::new().unwrap();
    run_index(dest.path());

    assert_eq!(
        read(&dest, "billing/internal/tax/var.StandardRate.goindex"),
        "package example.com/shop/billing/internal/tax\n\nconst StandardRate = 2100\n"
    );
}

#[test]
fn test_declared_package_name_used_in_header() {
    let dest = TempDir::new().unwrap();
    run_index(dest.path());

    // The directory is storage/ but the source declares package persist
    let body = read(&dest, "storage/type.Store.goindex");
    assert!(body.starts_with("package example.com/shop/persist\nimport (\n"));
    assert!(body.ends_with("type Store struct {\n\tdb *sql.DB\n}\n"));
}

#[test]
fn test_reindex_overwrites_existing_artifacts() {
    let dest = TempDir::new().unwrap();
    fs::create_dir_all(dest.path().join("inventory")).unwrap();
    fs::write(dest.path().join("inventory/type.Stock.goindex"), "stale").unwrap();

    let first = run_index(dest.path());
    let second = run_index(dest.path());

    assert_eq!(first, second);
    assert!(read(&dest, "inventory/type.Stock.goindex").starts_with("package example.com/shop/inventory\n"));
}

#[test]
fn test_progress_ends_at_full_percentage() {
    let dest = TempDir::new().unwrap();
    let scanner = Scanner::new(OsFs::shared(), fixture_root()).with_throttle(ThrottleConfig::for_percent(50, 4));
    let last = Mutex::new(None);

    Indexer::new(scanner, OsFs::shared())
        .index_source_code(MODULE, dest.path(), |p| *last.lock() = Some(p.clone()))
        .unwrap();

    let last = last.into_inner().unwrap();
    assert_eq!(last.percentage, 100.0);
    assert_eq!(last.current, "");
}

#[test]
fn test_syntax_errors_skip_only_broken_declarations() {
    let src = TempDir::new().unwrap();
    fs::create_dir_all(src.path().join("broken")).unwrap();
    fs::write(src.path().join("main.go"), "package main\n\nfunc main() {}\n").unwrap();
    fs::write(
        src.path().join("broken/bad.go"),
        "package broken\n\nconst Good = 1\n\nfunc Oops( {\n",
    )
    .unwrap();

    let dest = TempDir::new().unwrap();
    let scanner = Scanner::new(OsFs::shared(), src.path()).with_throttle(ThrottleConfig::for_percent(100, 2));
    let stats = Indexer::new(scanner, OsFs::shared())
        .index_source_code("example.com/broken", dest.path(), |_| {})
        .unwrap();

    assert_eq!(stats.packages, 2);
    assert_eq!(
        read(&dest, "broken/var.Good.goindex"),
        "package example.com/broken/broken\n\nconst Good = 1\n"
    );
    assert!(!dest.path().join("broken/func.Oops.goindex").exists());
}

#[test]
fn test_missing_package_clause_aborts_with_package() {
    let src = TempDir::new().unwrap();
    fs::create_dir_all(src.path().join("broken")).unwrap();
    fs::write(src.path().join("main.go"), "package main\n\nfunc main() {}\n").unwrap();
    fs::write(src.path().join("broken/bad.go"), "// no package clause\n").unwrap();

    let dest = TempDir::new().unwrap();
    let scanner = Scanner::new(OsFs::shared(), src.path()).with_throttle(ThrottleConfig::for_percent(100, 2));
    let err = Indexer::new(scanner, OsFs::shared())
        .index_source_code("example.com/broken", dest.path(), |_| {})
        .unwrap_err();

    assert_eq!(err.package(), Some("example.com/broken/broken"));
    assert!(err.to_string().contains("missing package clause"));
}

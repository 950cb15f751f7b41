use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("csv2ledger").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

const CONFIG: &str = r#"{
    "fields": ["date", "checknum", "desc", "amount"],
    "default_source": "Assets:Bank:Checking",
    "accounts": [
        {"match": "SHELL", "destination": "Expenses:Fuel", "category": "Car"}
    ]
}"#;

#[test]
fn convert_writes_entries_and_skips_duplicates_on_rerun() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(dir.path(), "config.json", CONFIG);
    let input = write(
        dir.path(),
        "bank.csv",
        "2008/08/08,2134,Exxon,20\n2008/08/09,,SHELL OIL,35.10\n",
    );
    let output = dir.path().join("out.ledger");
    let cache = dir.path().join("hashes.txt");

    cmd()
        .args(["convert", input.to_str().unwrap(), "-o", output.to_str().unwrap()])
        .args(["-c", config.to_str().unwrap(), "--cache-file", cache.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 records: "));

    let ledger = std::fs::read_to_string(&output).unwrap();
    assert!(ledger.contains("2008/08/08 (2134) Exxon\n"));
    assert!(ledger.contains("    Expense:Unknown    $20.00\n    Assets:Bank:Checking\n"));
    assert!(ledger.contains("2008/08/09 SHELL OIL\n"));
    assert!(ledger.contains("    ; category: Car\n"));
    assert!(ledger.contains("    Expenses:Fuel    $35.10\n"));
    assert_eq!(std::fs::read_to_string(&cache).unwrap().lines().count(), 2);

    cmd()
        .args(["convert", input.to_str().unwrap(), "-o", output.to_str().unwrap()])
        .args(["-c", config.to_str().unwrap(), "--cache-file", cache.to_str().unwrap(), "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"imported\": 0"))
        .stdout(predicate::str::contains("\"duplicates\": 2"));

    assert_eq!(std::fs::read_to_string(&output).unwrap(), ledger);
}

#[test]
fn dry_run_prints_and_leaves_files_alone() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(dir.path(), "config.json", CONFIG);
    let input = write(dir.path(), "bank.csv", "2008/08/08,2134,Exxon,20\n");
    let output = dir.path().join("out.ledger");
    let cache = dir.path().join("hashes.txt");

    cmd()
        .args(["convert", input.to_str().unwrap(), "-o", output.to_str().unwrap()])
        .args(["-c", config.to_str().unwrap(), "--cache-file", cache.to_str().unwrap()])
        .args(["--dry-run", "--negate", "--clear", "--meta", "import=test"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2008/08/08 * (2134) Exxon"))
        .stdout(predicate::str::contains("    ; import: test\n"))
        .stdout(predicate::str::contains("-$20.00"));

    assert!(!output.exists());
    assert!(!cache.exists());
}

#[test]
fn metadata_renders_in_flag_order() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(dir.path(), "config.json", CONFIG);
    let input = write(dir.path(), "bank.csv", "2008/08/08,2134,Exxon,20\n");

    cmd()
        .args(["convert", input.to_str().unwrap(), "--dry-run"])
        .args(["-c", config.to_str().unwrap()])
        .args(["--cache-file", dir.path().join("hashes.txt").to_str().unwrap()])
        .args(["--meta", "b=1", "--meta", "a=2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("    ; b: 1\n    ; a: 2\n"));
}

#[test]
fn oversized_fuzzy_window_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(dir.path(), "config.json", CONFIG);
    let input = write(dir.path(), "bank.csv", "2008/08/08,2134,Exxon,20\n");

    cmd()
        .args(["convert", input.to_str().unwrap(), "--dry-run"])
        .args(["-c", config.to_str().unwrap(), "--fuzzy-days", "200000000"])
        .args(["--cache-file", dir.path().join("hashes.txt").to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: Config error: fuzzy_days"));
}

#[test]
fn column_mismatch_fails_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(dir.path(), "config.json", CONFIG);
    let input = write(dir.path(), "bank.csv", "2008/08/08,Exxon,20\n");
    let output = dir.path().join("out.ledger");

    cmd()
        .args(["convert", input.to_str().unwrap(), "-o", output.to_str().unwrap()])
        .args(["-c", config.to_str().unwrap(), "--no-dedup"])
        .args(["--cache-file", dir.path().join("hashes.txt").to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: Line 1: expected 4 columns"));
}

#[test]
fn missing_input_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(dir.path(), "config.json", CONFIG);

    cmd()
        .args(["convert", dir.path().join("nope.csv").to_str().unwrap(), "-o", "out.ledger"])
        .args(["-c", config.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn malformed_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(dir.path(), "config.json", r#"{"accounts": [{"match": "(oops"}]}"#);

    cmd()
        .args(["rules", "-c", config.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("accounts rule #1"));
}

#[test]
fn rules_lists_tables() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(dir.path(), "config.json", CONFIG);

    cmd()
        .args(["rules", "-c", config.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Account rules (1)"))
        .stdout(predicate::str::contains("Expenses:Fuel"));
}

#[test]
fn hash_prints_both_variants() {
    cmd()
        .args(["hash", "2008/08/08,2134,Exxon,20"])
        .assert()
        .success()
        .stdout(predicate::str::is_match("^[0-9a-f]{64}\n[0-9a-f]{64}  \\(with trailing CR\\)\n$").unwrap());
}

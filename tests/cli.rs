//! Integration tests for the expense-tracker CLI
//!
//! Each test runs the binary against a database in its own temp directory.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper to get an expense-tracker command bound to a temp database
fn tracker(tmp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("expense-tracker").unwrap();
    cmd.current_dir(tmp.path())
        .env_remove("EXPENSE_TRACKER_LOG")
        .env_remove("EXPENSE_TRACKER_DB")
        .arg("--db")
        .arg(tmp.path().join("test.db"));
    cmd
}

/// Helper to add an expense and return its printed id (e.g. "#1")
fn add_expense(tmp: &TempDir, category: &str, amount: &str, date: &str, description: &str) -> String {
    let output = tracker(tmp)
        .args([
            "add",
            "--category",
            category,
            "--amount",
            amount,
            "--date",
            date,
            "--description",
            description,
        ])
        .output()
        .unwrap();
    assert!(output.status.success(), "add failed: {:?}", output);

    // Output format: "✓ Added expense #1: Food $12.00 on 2024-03-01"
    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout
        .split_whitespace()
        .find(|w| w.starts_with('#'))
        .map(|s| s.trim_end_matches(':').to_string())
        .unwrap_or_default()
}

#[test]
fn test_init_creates_database() {
    let tmp = TempDir::new().unwrap();

    tracker(&tmp)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("0 expenses stored"));

    assert!(tmp.path().join("test.db").exists());
}

#[test]
fn test_add_and_list() {
    let tmp = TempDir::new().unwrap();
    let id = add_expense(&tmp, "Food", "12", "2024-03-01", "Lunch");
    assert_eq!(id, "#1");

    tracker(&tmp)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Lunch"))
        .stdout(predicate::str::contains("$12.00"));
}

#[test]
fn test_list_json() {
    let tmp = TempDir::new().unwrap();
    add_expense(&tmp, "transport", "3.5", "2024-03-02", "Bus");

    let output = tracker(&tmp).args(["list", "--json"]).output().unwrap();
    assert!(output.status.success());

    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(rows[0]["id"], 1);
    assert_eq!(rows[0]["category"], "Transport");
    assert_eq!(rows[0]["amount"], 3.5);
}

#[test]
fn test_add_rejects_negative_amount() {
    let tmp = TempDir::new().unwrap();

    tracker(&tmp)
        .args(["add", "-c", "Food", "--amount=-4", "-D", "refund"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("negative"));
}

#[test]
fn test_add_rejects_unknown_category() {
    let tmp = TempDir::new().unwrap();

    tracker(&tmp)
        .args(["add", "-c", "Groceries", "-a", "4", "-D", "milk"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown category"));
}

#[test]
fn test_add_requires_description_by_default() {
    let tmp = TempDir::new().unwrap();

    tracker(&tmp)
        .args(["add", "-c", "Food", "-a", "4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("description"));
}

#[test]
fn test_config_can_make_description_optional() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("expense-tracker.toml"),
        "require_description = false\ncurrency = \"EUR \"\n",
    )
    .unwrap();

    tracker(&tmp)
        .args(["add", "-c", "Food", "-a", "4", "--date", "2024-01-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("EUR 4.00"));
}

#[test]
fn test_edit_keeps_unspecified_fields() {
    let tmp = TempDir::new().unwrap();
    let id = add_expense(&tmp, "Food", "10", "2024-03-01", "Pizza");

    tracker(&tmp)
        .args(["edit", &id, "--amount", "11.5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated expense #1"));

    tracker(&tmp)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("$11.50"))
        .stdout(predicate::str::contains("Pizza"));
}

#[test]
fn test_remove_keeps_other_ids() {
    let tmp = TempDir::new().unwrap();
    let first = add_expense(&tmp, "Food", "1", "2024-03-01", "first");
    add_expense(&tmp, "Food", "2", "2024-03-02", "second");

    tracker(&tmp).args(["remove", &first]).assert().success();

    let output = tracker(&tmp).args(["list", "--json"]).output().unwrap();
    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(rows.as_array().unwrap().len(), 1);
    assert_eq!(rows[0]["id"], 2);
    assert_eq!(rows[0]["description"], "second");
}

#[test]
fn test_remove_missing_is_reported() {
    let tmp = TempDir::new().unwrap();

    tracker(&tmp)
        .args(["remove", "42"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no longer exists"));
}

#[test]
fn test_clear_requires_yes() {
    let tmp = TempDir::new().unwrap();
    add_expense(&tmp, "Food", "1", "2024-03-01", "x");

    tracker(&tmp).arg("clear").assert().failure();
    tracker(&tmp)
        .args(["clear", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleared 1 expenses"));

    tracker(&tmp)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No expenses recorded yet"));
}

#[test]
fn test_totals_by_category_and_month() {
    let tmp = TempDir::new().unwrap();
    add_expense(&tmp, "Food", "10", "2024-01-05", "a");
    add_expense(&tmp, "Food", "5", "2024-01-20", "b");
    add_expense(&tmp, "Transport", "3", "2024-02-01", "c");

    tracker(&tmp)
        .arg("totals")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"Food\s+\$15\.00").unwrap())
        .stdout(predicate::str::is_match(r"Transport\s+\$3\.00").unwrap());

    let output = tracker(&tmp).args(["totals", "--by", "month"]).output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    let jan = stdout.find("2024-01").unwrap();
    let feb = stdout.find("2024-02").unwrap();
    assert!(jan < feb, "months should be in chronological order");
}

#[test]
fn test_import_rejects_missing_column() {
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("upload.csv");
    fs::write(&file, "Category,Amount,Date\nFood,1,2024-01-01\n").unwrap();

    tracker(&tmp)
        .args(["import", file.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Category, Amount, Date, Description"));
}

#[test]
fn test_import_save_persists_rows() {
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("upload.csv");
    fs::write(
        &file,
        "Category,Amount,Date,Description\nFood,4,2024-02-01,Bagel\nOther,,2024-02-02,incomplete\n",
    )
    .unwrap();

    tracker(&tmp)
        .args(["import", file.to_str().unwrap(), "--save"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 incomplete rows dropped"))
        .stdout(predicate::str::contains("Saved 1 expenses"));

    tracker(&tmp)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Bagel"));
}

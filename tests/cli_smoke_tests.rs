mod common;

use std::path::Path;

use assert_cmd::Command;
use predicates::{prelude::PredicateBooleanExt, str::contains};

const BIN_NAME: &str = "shop_ledger_cli";

fn cli(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin(BIN_NAME).expect("binary exists");
    cmd.env("SHOP_LEDGER_HOME", home)
        .env_remove("SHOP_LEDGER_DRIVE_TOKEN")
        .env_remove("SHOP_LEDGER_PIN")
        .env("RUST_LOG", "off")
        .env("NO_COLOR", "1");
    cmd
}

#[test]
fn version_prints_package_version() {
    let home = common::temp_base();
    cli(&home)
        .arg("version")
        .assert()
        .success()
        .stdout(contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn unknown_command_fails_with_usage() {
    let home = common::temp_base();
    cli(&home)
        .arg("frobnicate")
        .assert()
        .failure()
        .stderr(contains("Usage").and(contains("unknown command")));
}

#[test]
fn add_then_summarize_offline() {
    let home = common::temp_base();
    cli(&home)
        .args(["add", "2024-01-05", "income", "100", "--category", "Printing"])
        .assert()
        .success()
        .stdout(contains("Added entry 2024-01-05_"))
        .stderr(contains("saved on this device only"));
    cli(&home)
        .args(["add", "2024-01-10", "expense", "40"])
        .assert()
        .success();

    cli(&home)
        .args(["summary", "--all-time", "--mode", "monthly"])
        .assert()
        .success()
        .stdout(contains("All time").and(contains("Jan 2024")).and(contains("60.00")));

    cli(&home)
        .arg("export")
        .assert()
        .success()
        .stdout(contains("\"closedDays\"").and(contains("\"pinHash\"")));
}

#[test]
fn invalid_amount_is_rejected() {
    let home = common::temp_base();
    cli(&home)
        .args(["add", "2024-01-05", "income", "0"])
        .assert()
        .failure()
        .stderr(contains("Amount must be a positive number"));
}

#[test]
fn closing_a_day_needs_the_pin() {
    let home = common::temp_base();
    cli(&home)
        .args(["close-day", "2024-02-01"])
        .assert()
        .failure()
        .stderr(contains("Enter the PIN"));

    cli(&home)
        .args(["--pin", "2807", "close-day", "2024-02-01"])
        .assert()
        .success()
        .stdout(contains("Marked 2024-02-01 as closed"));

    cli(&home)
        .args(["--pin", "2807", "close-day", "2024-02-01"])
        .assert()
        .success()
        .stderr(contains("already marked closed"));
}

#[test]
fn wrong_pin_blocks_only_gated_commands() {
    let home = common::temp_base();
    cli(&home)
        .args(["--pin", "0000", "summary"])
        .assert()
        .success()
        .stderr(contains("Incorrect PIN"));
    cli(&home)
        .args(["--pin", "0000", "add", "2024-01-05", "income", "25"])
        .assert()
        .success()
        .stdout(contains("Added entry"));
    cli(&home)
        .args(["--pin", "0000", "close-day", "2024-02-01"])
        .assert()
        .failure()
        .stderr(contains("Incorrect PIN"));
}

#[test]
fn oversized_lookback_is_rejected() {
    let home = common::temp_base();
    cli(&home)
        .args(["missing", "--days", "4000000000"])
        .assert()
        .failure()
        .stderr(contains("--days must be at most"));
}

#[test]
fn change_pin_replaces_the_old_one() {
    let home = common::temp_base();
    cli(&home)
        .args(["change-pin", "2807", "1234", "1234"])
        .assert()
        .success()
        .stdout(contains("PIN updated"));
    cli(&home)
        .args(["--pin", "2807", "close-day", "2024-02-01"])
        .assert()
        .failure()
        .stderr(contains("Incorrect PIN"));
    cli(&home)
        .args(["--pin", "1234", "close-day", "2024-02-01"])
        .assert()
        .success();
}

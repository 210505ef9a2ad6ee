use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

fn handpay() -> Command {
    let mut cmd = Command::new(cargo_bin!("handpay"));
    cmd.env_remove("HANDPAY_DB_PATH").env("RUST_LOG", "info");
    cmd
}

#[test]
fn test_verify_empty_ledger() -> Result<(), Box<dyn std::error::Error>> {
    handpay()
        .arg("verify")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "ledger ok: 0 transactions, head GENESIS",
        ));

    Ok(())
}

#[test]
fn test_export_empty_ledger_writes_nothing() {
    handpay()
        .arg("export")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_rejects_malformed_opening_balance() {
    handpay()
        .args(["--opening-balance", "lots", "verify"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("opening-balance"));
}

#[test]
fn test_requires_a_subcommand() {
    handpay().assert().failure();
}

use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

mod common;

#[test]
fn test_cli_end_to_end() -> Result<(), Box<dyn std::error::Error>> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, "type, account, from, to, amount, tx")?;
    writeln!(file, "open, alice, , , 100,")?;
    writeln!(file, "open, bob, , , 0,")?;
    writeln!(file, "transfer, , alice, bob, 30, t-1")?;
    writeln!(file, "transfer, , alice, bob, 80, t-2")?; // Insufficient funds
    writeln!(file, "transfer, , alice, bob, 30, t-1")?; // Replay, applied once

    let mut cmd = Command::new(cargo_bin!("ledger-core"));
    cmd.arg(file.path());

    let output = cmd.assert().success().stdout(predicate::str::contains(
        "account,alias,balance",
    ));
    let stdout = String::from_utf8_lossy(&output.get_output().stdout).to_string();
    assert_eq!(common::balance_of(&stdout, "alice"), Some(70));
    assert_eq!(common::balance_of(&stdout, "bob"), Some(30));

    output.stderr(predicate::str::contains("failed to execute command"));
    Ok(())
}

#[test]
fn test_self_transfer_reported() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "type, account, from, to, amount, tx").unwrap();
    writeln!(file, "open, solo, , , 10,").unwrap();
    writeln!(file, "transfer, , solo, solo, 10,").unwrap();

    let mut cmd = Command::new(cargo_bin!("ledger-core"));
    cmd.arg(file.path());

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("same account"))
        .stdout(predicate::str::contains(",solo,10"));
}

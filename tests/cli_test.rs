use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

#[test]
fn test_cli_simulated_payment_completes() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin!("autocare-pay"));
    cmd.args([
        "pay",
        "--amount",
        "500",
        "--phone",
        "0712345678",
        "--simulate",
        "--initial-delay-secs",
        "0",
        "--poll-interval-secs",
        "0",
    ]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "Payment initiated! Please check your phone for the M-Pesa prompt.",
        ))
        .stdout(predicate::str::contains("Phone: +254 712 345 678"))
        .stdout(predicate::str::contains("Transaction ID: ws_CO_SIMULATED"))
        .stdout(predicate::str::contains(
            "[Completed] Payment completed successfully!",
        ));

    Ok(())
}

#[test]
fn test_cli_rejects_invalid_phone() {
    let mut cmd = Command::new(cargo_bin!("autocare-pay"));
    cmd.args(["pay", "--amount", "500", "--phone", "0812345678", "--simulate"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains(
            "Please enter a valid Kenyan phone number",
        ))
        .stdout(predicate::str::contains("Transaction ID").not());
}

#[test]
fn test_cli_rejects_invalid_amount_first() {
    let mut cmd = Command::new(cargo_bin!("autocare-pay"));
    cmd.args(["pay", "--amount", "abc", "--phone", "", "--simulate"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Please enter a valid amount"));
}

#[test]
fn test_cli_rejects_bad_api_url() {
    let mut cmd = Command::new(cargo_bin!("autocare-pay"));
    cmd.args(["status", "ws_CO_1", "--api-url", "localhost:5000"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("API URL must start with http"));
}

#[test]
fn test_cli_simulated_timeout_exit_code() {
    let mut cmd = Command::new(cargo_bin!("autocare-pay"));
    cmd.args([
        "pay",
        "--amount",
        "500",
        "--phone",
        "+254712345678",
        "--simulate",
        "--initial-delay-secs",
        "0",
        "--poll-interval-secs",
        "0",
        "--max-attempts",
        "2",
    ]);

    cmd.assert()
        .code(2)
        .stdout(predicate::str::contains("[Timeout] Payment timeout"));
}

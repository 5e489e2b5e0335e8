//! Command-line behaviour that needs no network or git

use assert_cmd::Command;
use predicates::prelude::*;

const INPUT_VARS: &[&str] = &[
    "INPUT_ACTION",
    "INPUT_ICREDIBLE_ACTIVATION_CODE",
    "INPUT_ICREDIBLE_ENCRYPTION_PASSWORD",
    "INPUT_FILE_VERSION_ID",
    "INPUT_ICREDIBLE_REPOSITORY_RESTORE_TOKEN",
    "INPUT_GITHUB-TOKEN",
    "INPUT_SUSPEND_ACTIONS",
    "INPUT_OTP_DELIVERY_METHOD",
    "GITHUB_TOKEN",
    "GITHUB_ACTIONS",
    "GITSHIELD_CONFIG",
];

fn gitshield() -> Command {
    let mut cmd = Command::cargo_bin("gitshield").unwrap();
    for var in INPUT_VARS {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn test_help_lists_commands() {
    gitshield()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("backup"))
        .stdout(predicate::str::contains("restore"))
        .stdout(predicate::str::contains("resume-actions"));
}

#[test]
fn test_weak_password_is_rejected() {
    gitshield()
        .args([
            "backup",
            "--activation-code",
            "ACT-1234",
            "--encryption-password",
            "abc",
            "--github-token",
            "ghs_default",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least 8 characters"));
}

#[test]
fn test_restore_requires_file_version_id() {
    gitshield()
        .args([
            "restore",
            "--activation-code",
            "ACT-1234",
            "--encryption-password",
            "Secret123!",
            "--github-token",
            "ghs_default",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("file_version_id"));
}

#[test]
fn test_run_reads_action_from_environment() {
    gitshield()
        .env("INPUT_ACTION", "delete")
        .env("INPUT_ICREDIBLE_ACTIVATION_CODE", "ACT-1234")
        .env("INPUT_ICREDIBLE_ENCRYPTION_PASSWORD", "Secret123!")
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Must be 'backup' or 'restore'"));
}

#[test]
fn test_unknown_otp_method_is_rejected() {
    gitshield()
        .args([
            "restore",
            "--otp-delivery-method",
            "SMS",
            "--encryption-password",
            "Secret123!",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("MAIL"));
}

#[test]
fn test_resume_actions_requires_token() {
    gitshield()
        .arg("resume-actions")
        .assert()
        .failure()
        .stderr(predicate::str::contains("restore token is required"));
}

#[test]
fn test_secrets_are_not_echoed_in_help() {
    gitshield()
        .env("INPUT_ICREDIBLE_ENCRYPTION_PASSWORD", "Hunter2-Secret!")
        .args(["backup", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Hunter2-Secret!").not());
}

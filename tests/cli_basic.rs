//! Integration tests for basic CLI behavior.
//!
//! Tests that the binary accepts standard flags, each subcommand responds to
//! `--help`, and the subcommands run against the fixture configuration.

#![allow(deprecated)] // cargo_bin deprecation; replacement not yet stable

use assert_cmd::Command;
use predicates::prelude::*;

/// Helper: get a Command for the `ratelens` binary, run from the crate root
/// so fixture paths in `tests/fixtures/sources.toml` resolve.
fn ratelens() -> Command {
    let mut cmd = Command::cargo_bin("ratelens").expect("binary 'ratelens' should be built");
    cmd.current_dir(env!("CARGO_MANIFEST_DIR"));
    cmd
}

const CONFIG: &str = "tests/fixtures/sources.toml";

// ─── Top-level flags ─────────────────────────────────────────────────────────

#[test]
fn help_flag_shows_usage() {
    ratelens()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: ratelens"))
        .stdout(predicate::str::contains("lines"))
        .stdout(predicate::str::contains("extract"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("check"));
}

#[test]
fn version_flag_shows_semver() {
    ratelens()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^ratelens \d+\.\d+\.\d+\n$").unwrap());
}

#[test]
fn no_args_shows_error_and_usage() {
    ratelens()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage: ratelens"));
}

#[test]
fn invalid_subcommand_fails() {
    ratelens()
        .arg("this-is-not-a-real-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

// ─── Subcommand help ─────────────────────────────────────────────────────────

#[test]
fn lines_help() {
    ratelens()
        .args(["lines", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("reconstructed lines"))
        .stdout(predicate::str::contains("<FILE>"))
        .stdout(predicate::str::contains("--tolerance"))
        .stdout(predicate::str::contains("--format"));
}

#[test]
fn extract_help() {
    ratelens()
        .args(["extract", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("<SOURCE>"))
        .stdout(predicate::str::contains("--file"));
}

#[test]
fn extract_missing_source_fails() {
    ratelens()
        .arg("extract")
        .assert()
        .failure()
        .stderr(predicate::str::contains("<SOURCE>"));
}

// ─── lines ───────────────────────────────────────────────────────────────────

#[test]
fn lines_rebuilds_token_rows() {
    ratelens()
        .args(["lines", "tests/fixtures/nab_tokens.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Note 12 Loans and advances 2024 2023"))
        .stdout(predicate::str::contains("Housing loans 380,214 361,002"))
        .stdout(predicate::str::contains("Total gross loans 613,123 582,382"))
        .stderr(predicate::str::contains("15 tokens, 6 lines"));
}

#[test]
fn lines_reads_html_tables() {
    ratelens()
        .args(["lines", "tests/fixtures/rates.html"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Standard variable 6.84% 6.89%"));
}

#[test]
fn lines_missing_file_fails() {
    ratelens()
        .args(["lines", "tests/fixtures/does-not-exist.json"])
        .assert()
        .failure();
}

#[test]
fn lines_rejects_unknown_format() {
    ratelens()
        .args(["lines", "tests/fixtures/nab_tokens.json", "--format", "docx"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown document format"));
}

// ─── extract / run / check ───────────────────────────────────────────────────

#[test]
fn extract_prints_result_json() {
    ratelens()
        .args(["--config", CONFIG, "extract", "nab"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"entity_id\": \"nab\""))
        .stdout(predicate::str::contains("613123.0"))
        .stdout(predicate::str::contains("\"confidence\": \"high\""))
        .stdout(predicate::str::contains("\"origin\": \"live\""));
}

#[test]
fn extract_html_source() {
    ratelens()
        .args(["--config", CONFIG, "extract", "westpac"])
        .assert()
        .success()
        .stdout(predicate::str::contains("6.84"))
        .stdout(predicate::str::contains("6.71"));
}

#[test]
fn extract_with_file_override() {
    ratelens()
        .args([
            "--config",
            CONFIG,
            "extract",
            "anz",
            "--file",
            "tests/fixtures/nab_tokens.json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("613123.0"));
}

#[test]
fn extract_unknown_source_fails() {
    ratelens()
        .args(["--config", CONFIG, "extract", "cba"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown source 'cba'"));
}

#[test]
fn run_prints_snapshot_with_fallback() {
    ratelens()
        .args(["--config", CONFIG, "run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"live\""))
        .stdout(predicate::str::contains("\"status\": \"fallback\""))
        .stdout(predicate::str::contains("ANZ 2023 annual report (static)"))
        .stderr(predicate::str::contains("2 live, 1 fallback, 0 unavailable"));
}

#[test]
fn run_logs_at_info_by_default() {
    ratelens()
        .env_remove("RUST_LOG")
        .args(["--config", CONFIG, "run"])
        .assert()
        .success()
        .stderr(predicate::str::contains("INFO"))
        .stderr(predicate::str::contains("Extracted"));
}

#[test]
fn run_has_no_refresh_flag() {
    ratelens()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("as long as the process"))
        .stdout(predicate::str::contains("--refresh").not());

    ratelens()
        .args(["--config", CONFIG, "run", "--refresh"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unexpected argument"));
}

#[test]
fn check_summarizes_config() {
    ratelens()
        .args(["--config", CONFIG, "check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Sources: 3"))
        .stdout(predicate::str::contains("Reference entries: 1"))
        .stdout(predicate::str::contains("nab"));
}

#[test]
fn check_missing_config_fails() {
    ratelens()
        .args(["--config", "tests/fixtures/nope.toml", "check"])
        .assert()
        .failure();
}

//! End-to-end command tests against a real SQLite file.
//!
//! Every test builds its own database and output directory; figures are
//! written as SVG so no font support is needed.

use assert_cmd::Command;
use predicates::prelude::*;
use rusqlite::Connection;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Workspace {
    dir: TempDir,
    db: PathBuf,
}

impl Workspace {
    /// Releases relative to 2025-03-20: 444, 292 and 4 days before, one
    /// malformed date and one future release.
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let db = dir.path().join("movies.db");
        let conn = Connection::open(&db).unwrap();
        conn.execute_batch(
            "CREATE TABLE movies (
                id TEXT, title TEXT, popularity TEXT,
                vote_count TEXT, vote_average TEXT, release_date TEXT
            );
            INSERT INTO movies VALUES ('1', 'Alpha', '12.5', '100', '7.5', '2024-01-01');
            INSERT INTO movies VALUES ('2', 'Beta',  '3.0',  '50',  '6.0', '2024-06-01');
            INSERT INTO movies VALUES ('3', 'Gamma', '8.0',  '10',  '8.0', '2025-03-16');
            INSERT INTO movies VALUES ('4', 'Delta', '1.0',  '20',  '4.0', 'TBA');
            INSERT INTO movies VALUES ('5', 'Eps',   '2.0',  '30',  '5.0', '2026-01-01');",
        )
        .unwrap();
        Workspace { dir, db }
    }

    fn plots(&self) -> PathBuf {
        self.dir.path().join("plots")
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("votescope").expect("votescope binary should exist");
        cmd.env("XDG_CONFIG_HOME", self.dir.path())
            .env_remove("VOTESCOPE_CONFIG")
            .env_remove("VOTESCOPE_DB")
            .env_remove("VOTESCOPE_LOG")
            .env_remove("VOTESCOPE_LOG_FORMAT")
            .env_remove("RUST_LOG")
            .arg("--db")
            .arg(&self.db)
            .arg("--output-dir")
            .arg(self.plots())
            .args(["--image", "svg", "-q"]);
        cmd
    }

    fn json(&self, args: &[&str]) -> Value {
        let output = self.cmd().args(args).args(["--format", "json"]).output().unwrap();
        assert!(
            output.status.success(),
            "stderr: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).unwrap()
    }
}

fn is_svg(path: &Path) -> bool {
    std::fs::read_to_string(path)
        .map(|s| s.contains("<svg"))
        .unwrap_or(false)
}

#[test]
fn exponential_human_report_and_figure() {
    let ws = Workspace::new();
    ws.cmd()
        .arg("exponential")
        .assert()
        .success()
        .stdout(predicate::str::contains("# Aggregate exponential fit"))
        .stdout(predicate::str::contains("Excluded:       2 (missing 0, malformed 1, future 1)"))
        .stdout(predicate::str::contains("λ = 0.216216 votes per day"));

    assert!(is_svg(&ws.plots().join("exponential_distribution_2025-03-20.svg")));
}

#[test]
fn exponential_json_envelope() {
    let ws = Workspace::new();
    let value = ws.json(&["exponential", "--no-markers"]);

    assert_eq!(value["schema_version"], "1.0.0");
    assert_eq!(value["command"], "exponential");
    assert!(value["run_id"].as_str().unwrap().starts_with("run-"));
    assert_eq!(value["config"]["resolution"], "default");

    let result = &value["result"];
    assert_eq!(result["loaded"], 5);
    assert_eq!(result["markers"], 0);
    assert_eq!(result["rate"]["observations"], 3);
    assert_eq!(result["rate"]["total_votes"], 160.0);
    assert_eq!(result["rate"]["total_elapsed"], 740.0);
    assert_eq!(result["axis"]["upper"], 444.0);
    assert_eq!(result["axis"]["samples"], 1000);
}

#[test]
fn exponential_in_hours() {
    let ws = Workspace::new();
    let value = ws.json(&["exponential", "--unit", "hours"]);
    assert_eq!(value["result"]["unit"], "hours");
    assert_eq!(value["result"]["rate"]["total_elapsed"], 740.0 * 24.0);
}

#[test]
fn rates_ranked_and_truncated() {
    let ws = Workspace::new();
    let value = ws.json(&["rates", "--top-n", "2"]);

    let result = &value["result"];
    assert_eq!(result["candidates"], 3);
    let rates = result["rates"].as_array().unwrap();
    assert_eq!(rates.len(), 2);
    assert_eq!(rates[0]["rank"], 1);
    assert_eq!(rates[0]["rate"], 2.5);
    assert_eq!(rates[0]["release_date"], "2025-03-16");
    assert!(rates[0]["rate"].as_f64().unwrap() >= rates[1]["rate"].as_f64().unwrap());
    assert!(result["figure"]
        .as_str()
        .unwrap()
        .ends_with("top_rates_2025-03-20.svg"));
    assert!(is_svg(&ws.plots().join("top_rates_2025-03-20.svg")));
}

#[test]
fn rates_non_positive_top_n_keeps_all() {
    let ws = Workspace::new();
    let value = ws.json(&["rates", "--top-n", "-1"]);
    assert_eq!(value["result"]["rates"].as_array().unwrap().len(), 3);
}

#[test]
fn rates_fixed_axis() {
    let ws = Workspace::new();
    let value = ws.json(&["rates", "--axis", "fixed", "--axis-upper", "30"]);
    assert_eq!(value["result"]["axis"]["upper"], 30.0);
    assert_eq!(value["result"]["axis"]["samples"], 500);
}

#[test]
fn binomial_table_dump() {
    let ws = Workspace::new();
    ws.cmd()
        .arg("binomial")
        .assert()
        .success()
        .stdout(predicate::str::contains("Number of trials (n):    42"))
        .stdout(predicate::str::contains("Success probability (p): 0.6100"))
        .stdout(predicate::str::contains("P(X=k)"));

    assert!(is_svg(&ws.plots().join("binomial_distribution_2025-03-20.svg")));
}

#[test]
fn binomial_summary_line() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["binomial", "--format", "summary"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^\[run-[0-9a-f]{12}\] binomial: n=42 p=0\.6100").unwrap());
}

#[test]
fn stats_report_two_decimals() {
    let ws = Workspace::new();
    ws.cmd()
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Vote count: min = 10.00, max = 100.00, mean = 42.00, median = 30.00",
        ))
        .stdout(predicate::str::contains("earliest = 2024-01-01"));

    assert!(!ws.plots().exists());
}

#[test]
fn config_file_drives_analysis() {
    let ws = Workspace::new();
    let config = ws.dir.path().join("votescope.toml");
    std::fs::write(
        &config,
        "[analysis]\nreference_date = \"2025-03-21\"\ntop_n = 1\n",
    )
    .unwrap();

    let output = ws
        .cmd()
        .arg("--config")
        .arg(&config)
        .args(["rates", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: Value = serde_json::from_slice(&output.stdout).unwrap();

    assert_eq!(value["config"]["resolution"], "cli_flag");
    assert_eq!(value["config"]["hash"].as_str().unwrap().len(), 64);
    assert_eq!(value["result"]["rates"].as_array().unwrap().len(), 1);
    assert_eq!(value["result"]["rates"][0]["rate"], 2.0);
    assert!(ws.plots().join("top_rates_2025-03-21.svg").exists());
}

#[test]
fn config_show_defaults() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Source: built-in defaults"))
        .stdout(predicate::str::contains("top_n = 15"));
}

#[test]
fn config_validate_file() {
    let ws = Workspace::new();
    let config = ws.dir.path().join("ok.toml");
    std::fs::write(&config, "[axis]\nmode = \"fixed\"\nupper = 30.0\n").unwrap();
    ws.cmd()
        .args(["config", "validate"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Status:  OK"));
}

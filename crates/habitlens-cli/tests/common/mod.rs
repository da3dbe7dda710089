//! Common utilities for CLI E2E tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::NaiveDate;
use serde_json::{json, Value};
use tempfile::TempDir;

/// Scratch directory holding a habit file and a config path.
pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    /// Three habits over 15 days: "Slept well" (1), "Caffeine mg" (2),
    /// "Exercise minutes" (3).
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let days = |f: &dyn Fn(i64) -> String| -> Vec<Value> {
            (0..15)
                .map(|i| {
                    json!({
                        "date": (start + chrono::Duration::days(i)).to_string(),
                        "value": f(i),
                    })
                })
                .collect()
        };

        let habits = json!({
            "habits": [
                {
                    "id": 1,
                    "name": "Slept well",
                    "value_kind": "boolean",
                    "observations": days(&|i| if i % 2 == 0 { "yes".to_string() } else { "no".to_string() }),
                },
                {
                    "id": 2,
                    "name": "Caffeine mg",
                    "value_kind": "numeric",
                    "observations": days(&|i| (40 + (i % 2) * 120 + i).to_string()),
                },
                {
                    "id": 3,
                    "name": "Exercise minutes",
                    "value_kind": "numeric",
                    "observations": days(&|i| (20 + (i % 3) * 10 + i).to_string()),
                }
            ]
        });
        std::fs::write(
            dir.path().join("habits.json"),
            serde_json::to_string_pretty(&habits).unwrap(),
        )
        .expect("write habit file");
        Self { dir }
    }

    pub fn input(&self) -> PathBuf {
        self.dir.path().join("habits.json")
    }

    pub fn config(&self) -> PathBuf {
        self.dir.path().join("config.toml")
    }

    /// Run with `--config` pointing into the fixture.
    pub fn run(&self, args: &[&str]) -> (i32, String, String) {
        let config = self.config();
        let mut full: Vec<&str> = args.to_vec();
        full.extend(["--config", path_str(&config)]);
        run_cli(&full)
    }

    pub fn run_success(&self, args: &[&str]) -> String {
        let (code, stdout, stderr) = self.run(args);
        assert_eq!(code, 0, "CLI command failed: {args:?}\n{stderr}");
        stdout
    }
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("utf-8 temp path")
}

/// Invoke the built binary and return (exit code, stdout, stderr).
pub fn run_cli(args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_habitlens-cli"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

/// Parse JSON output from CLI.
pub fn parse_json(json: &str) -> Value {
    serde_json::from_str(json).expect("Failed to parse JSON output")
}

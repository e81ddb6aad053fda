// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Writes `contents` to `dir/name` and returns the path.
pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("failed to write test file");
    path
}

/// Runs the `chartseries` binary with a config path that does not exist
/// unless `--config` is passed explicitly.
pub fn run_cli(dir: &Path, args: &[&str]) -> Output {
    let bin = env!("CARGO_BIN_EXE_chartseries");
    Command::new(bin)
        .env("CHARTSERIES_CONFIG", dir.join("no-such-config.yaml"))
        .args(args)
        .output()
        .expect("failed to run chartseries")
}

pub fn stdout_json(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "chartseries failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

/// Two ping targets probed once a minute, slightly out of phase. Target 2
/// loses its second probe.
pub fn ping_payload() -> Value {
    json!({
        "tasks": [
            {"id": 1, "name": "gateway", "interval": 60},
            {"id": 2, "name": "dns", "interval": 60}
        ],
        "records": [
            {"time": "2026-01-01T00:00:00Z", "task_id": 1, "value": 10.0},
            {"time": "2026-01-01T00:00:02Z", "task_id": 2, "value": 40.0},
            {"time": "2026-01-01T00:01:00Z", "task_id": 1, "value": 12.0},
            {"time": "2026-01-01T00:01:01Z", "task_id": 2, "value": -1},
            {"time": "2026-01-01T00:02:00Z", "task_id": 1, "value": 14.0},
            {"time": "2026-01-01T00:02:03Z", "task_id": 2, "value": 44.0}
        ]
    })
}

// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Builders for samples and rows used across module tests
#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use crate::row::{Cell, Row};
use crate::sample::{Sample, Task, TaskId};

pub fn sample(time_ms: i64, task_id: i64, value: f64) -> Sample {
    Sample::new(time_ms, TaskId(task_id), Some(value))
}

pub fn task(id: i64, interval: Option<f64>) -> Task {
    Task {
        id: TaskId(id),
        name: format!("task-{id}"),
        interval,
    }
}

/// One row per point, single series `key`. `None` becomes `Cell::Missing`.
pub fn series(key: &str, points: &[(i64, Option<f64>)]) -> Vec<Row> {
    points
        .iter()
        .map(|&(time_ms, value)| {
            let cell = value.map_or(Cell::Missing, Cell::Value);
            Row::new(time_ms).with_cell(key, cell)
        })
        .collect()
}

/// Evenly spaced single-series rows, one every `step_ms` starting at zero.
pub fn evenly_spaced(key: &str, step_ms: i64, values: &[f64]) -> Vec<Row> {
    values
        .iter()
        .zip(0..)
        .map(|(&v, i)| Row::new(i * step_ms).with_cell(key, Cell::Value(v)))
        .collect()
}

pub fn values(rows: &[Row], key: &str) -> Vec<Option<f64>> {
    rows.iter().map(|row| row.value(key)).collect()
}

pub fn times(rows: &[Row]) -> Vec<i64> {
    rows.iter().map(|row| row.time_ms).collect()
}

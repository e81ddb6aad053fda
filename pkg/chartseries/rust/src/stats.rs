// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Summary statistics for the task badges.
//!
//! `task_stats` counts raw samples, so it reflects every probe that ran.
//! `chart_loss_rate` counts chart rows, which depends on bucketing and gap
//! filling. The two answer different questions and are not interchangeable.

use serde::Serialize;

use crate::row::{Row, Timestamped, round1};
use crate::sample::{Sample, Task, TaskId};

/// Inclusive time range in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl TimeWindow {
    pub fn contains(&self, time_ms: i64) -> bool {
        (self.start_ms..=self.end_ms).contains(&time_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct TaskStats {
    pub loss_rate_percent: f64,
    pub latest_value: Option<f64>,
    pub latest_time_ms: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskSummary {
    pub task_id: TaskId,
    pub name: String,
    #[serde(flatten)]
    pub stats: TaskStats,
}

/// Loss rate and latest successful reading for one task.
///
/// A sample is a success when it holds a non-negative value. Failed and
/// missing readings, and negative values other than the sentinel, count as
/// losses.
pub fn task_stats(samples: &[Sample], task_id: TaskId, window: Option<TimeWindow>) -> TaskStats {
    let mut total = 0usize;
    let mut successes = 0usize;
    let mut latest: Option<(i64, f64)> = None;

    let in_scope = samples.iter().filter(|s| {
        s.task_id == task_id && window.is_none_or(|w| w.contains(s.time_ms()))
    });
    for sample in in_scope {
        total += 1;
        if !sample.is_success() {
            continue;
        }
        successes += 1;
        let Some(value) = sample.reading.value() else {
            continue;
        };
        if latest.is_none_or(|(t, _)| sample.time_ms > t) {
            latest = Some((sample.time_ms, value));
        }
    }

    let loss_rate_percent = if total == 0 {
        0.0
    } else {
        round1((1.0 - successes as f64 / total as f64) * 100.0)
    };

    TaskStats {
        loss_rate_percent,
        latest_value: latest.map(|(_, v)| v),
        latest_time_ms: latest.map(|(t, _)| t),
    }
}

/// `task_stats` for every task, in task order.
pub fn all_task_stats(
    samples: &[Sample],
    tasks: &[Task],
    window: Option<TimeWindow>,
) -> Vec<TaskSummary> {
    tasks
        .iter()
        .map(|task| TaskSummary {
            task_id: task.id,
            name: task.name.clone(),
            stats: task_stats(samples, task.id, window),
        })
        .collect()
}

/// Percentage of chart rows with no value for `key`.
pub fn chart_loss_rate(rows: &[Row], key: &str) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    let lost = rows.iter().filter(|row| !row.cell(key).is_value()).count();
    round1(lost as f64 / rows.len() as f64 * 100.0)
}

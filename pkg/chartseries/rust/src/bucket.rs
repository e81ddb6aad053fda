// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Time-bucket merging.
//!
//! Probes for different tasks fire at slightly different moments. Samples
//! whose timestamps fall within a tolerance of an existing anchor are merged
//! into that anchor's row so that one chart row holds every series.

use log::debug;

use crate::row::Row;
use crate::sample::{Sample, Task};

pub const MIN_TOLERANCE_MS: i64 = 800;
pub const MAX_TOLERANCE_MS: i64 = 6000;
/// Used when no task declares an interval, and by the fixed preset.
pub const DEFAULT_TOLERANCE_MS: i64 = 5000;
/// Fraction of the shortest task interval used as merge tolerance.
const INTERVAL_FRACTION: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TolerancePreset {
    /// A quarter of the shortest task interval, clamped to
    /// `[MIN_TOLERANCE_MS, MAX_TOLERANCE_MS]`.
    #[default]
    Adaptive,
    Fixed(i64),
}

pub fn tolerance_for_tasks(tasks: &[Task], preset: TolerancePreset) -> i64 {
    match preset {
        TolerancePreset::Fixed(ms) => ms.max(0),
        TolerancePreset::Adaptive => {
            let shortest = tasks
                .iter()
                .filter_map(|task| task.interval)
                .filter(|secs| secs.is_finite() && *secs > 0.0)
                .reduce(f64::min);
            match shortest {
                Some(secs) => {
                    let ms = (secs * 1000.0 * INTERVAL_FRACTION).round();
                    (ms as i64).clamp(MIN_TOLERANCE_MS, MAX_TOLERANCE_MS)
                }
                None => DEFAULT_TOLERANCE_MS,
            }
        }
    }
}

/// Groups samples onto anchors and returns one row per anchor, sorted by
/// time.
///
/// Anchors are picked greedily in arrival order: a sample joins the first
/// anchor within `tolerance_ms` of its own timestamp, otherwise it becomes a
/// new anchor. This is O(samples * anchors), which stays small because the
/// anchor count is bounded by the display window.
pub fn merge_into_buckets(samples: &[Sample], tolerance_ms: i64) -> Vec<Row> {
    let tolerance_ms = tolerance_ms.max(0);
    let mut rows: Vec<Row> = Vec::new();

    for sample in samples {
        let key = sample.task_id.key();
        match rows
            .iter_mut()
            .find(|row| (row.time_ms - sample.time_ms).abs() <= tolerance_ms)
        {
            Some(row) => {
                row.cells.insert(key, sample.reading);
            }
            None => rows.push(Row::new(sample.time_ms).with_cell(key, sample.reading)),
        }
    }

    rows.sort_by_key(|row| row.time_ms);
    debug!(
        "merged {} sample(s) into {} anchor(s) with tolerance {}ms",
        samples.len(),
        rows.len(),
        tolerance_ms
    );
    rows
}

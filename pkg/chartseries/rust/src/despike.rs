// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! EWMA despiking for latency series.
//!
//! Ping data has single-sample blips that would otherwise dominate the
//! chart's y-axis. Two passes per series:
//!
//! 1. Detection: a sample is a spike when it deviates from the mean of its
//!    numeric neighbours (within half a window on each side) by more than
//!    `threshold`, relative to that mean.
//! 2. Smoothing: an exponentially weighted moving average runs over the
//!    series. Valid samples feed it. Spikes, holes and failed probes take
//!    its last value.
//!
//! Failed probes never feed the average. Before the first valid sample they
//! stay `Failed`. Keeping failures visible as breaks is the pipeline's job,
//! see `restore_failures`.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::row::{Cell, Row, round2};

/// Below this magnitude a neighbour mean counts as zero.
const NEAR_ZERO_MEAN: f64 = 1e-9;
/// Against a zero baseline, any sample larger than this is a spike.
const ZERO_BASELINE_SPIKE: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DespikeConfig {
    /// EWMA smoothing factor, weight of the newest sample.
    pub alpha: f64,
    /// Detection window size in samples; half of it is used on each side.
    pub window: usize,
    /// Relative deviation from the neighbour mean that marks a spike.
    pub threshold: f64,
}

impl Default for DespikeConfig {
    fn default() -> Self {
        DespikeConfig {
            alpha: 0.1,
            window: 15,
            threshold: 0.3,
        }
    }
}

/// Returns rows where every series in `keys` has been despiked and smoothed.
pub fn despike<K: AsRef<str>>(rows: &[Row], keys: &[K], config: &DespikeConfig) -> Vec<Row> {
    let mut out = rows.to_vec();

    for key in keys {
        let key = key.as_ref();
        let original: Vec<Cell> = rows.iter().map(|row| row.cell(key)).collect();
        let spikes = detect(&original, config);
        let mut ewma: Option<f64> = None;

        for ((row, &cell), &spike) in out.iter_mut().zip(&original).zip(&spikes) {
            match cell {
                Cell::Value(v) if !spike => {
                    let next = match ewma {
                        Some(prev) => round2(config.alpha * v + (1.0 - config.alpha) * prev),
                        None => round2(v),
                    };
                    ewma = Some(next);
                    row.set(key, Cell::Value(next));
                }
                _ => match ewma {
                    Some(prev) => row.set(key, Cell::Value(prev)),
                    None if spike => row.set(key, Cell::Missing),
                    None => {}
                },
            }
        }

        let spike_count = spikes.iter().filter(|&&s| s).count();
        if spike_count > 0 {
            debug!("series {key}: replaced {spike_count} spike(s)");
        }
    }

    out
}

/// Indices of rows whose value for `key` would be treated as a spike.
pub fn spike_indices(rows: &[Row], key: &str, config: &DespikeConfig) -> Vec<usize> {
    let cells: Vec<Cell> = rows.iter().map(|row| row.cell(key)).collect();
    detect(&cells, config)
        .into_iter()
        .enumerate()
        .filter_map(|(idx, spike)| spike.then_some(idx))
        .collect()
}

fn detect(cells: &[Cell], config: &DespikeConfig) -> Vec<bool> {
    let half = config.window / 2;
    cells
        .iter()
        .enumerate()
        .map(|(idx, cell)| {
            let Cell::Value(v) = *cell else {
                return false;
            };
            let (sum, count) = cells
                .iter()
                .enumerate()
                .take(idx.saturating_add(half).saturating_add(1))
                .skip(idx.saturating_sub(half))
                .filter(|&(other, _)| other != idx)
                .filter_map(|(_, c)| c.value())
                .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
            if count == 0 {
                return false;
            }
            let mean = sum / count as f64;
            if mean.abs() < NEAR_ZERO_MEAN {
                v.abs() > ZERO_BASELINE_SPIKE
            } else if mean > 0.0 {
                (v - mean).abs() / mean > config.threshold
            } else {
                false
            }
        })
        .collect()
}

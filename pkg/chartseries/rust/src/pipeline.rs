// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! End-to-end normalization driven by one immutable config.

use log::debug;
use std::collections::HashSet;

use crate::bucket::{DEFAULT_TOLERANCE_MS, TolerancePreset, merge_into_buckets, tolerance_for_tasks};
use crate::despike::{DespikeConfig, despike};
use crate::downsample::{downsample_retention, downsample_stride};
use crate::errors::Error;
use crate::grid::{GridSpec, GridWindow, MAX_GRID_POINTS, fill_grid};
use crate::interpolate::{GapCap, interpolate_gaps, restore_failures};
use crate::row::Row;
use crate::sample::{Sample, Task};

/// Point budget of the ping chart.
pub const PING_CHART_MAX_POINTS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GapFill {
    None,
    Grid(GridSpec),
    Linear(GapCap),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Downsample {
    None,
    Stride { max_points: usize },
    Retention { hours: f64, mini_chart: bool },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineConfig {
    pub tolerance: TolerancePreset,
    /// `None` disables smoothing.
    pub despike: Option<DespikeConfig>,
    pub gap_fill: GapFill,
    /// When false, failed probes are put back after smoothing and linear
    /// interpolation so the line breaks on them.
    pub connect_breaks: bool,
    pub downsample: Downsample,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig::ping_chart()
    }
}

impl PipelineConfig {
    pub fn ping_chart() -> Self {
        PipelineConfig {
            tolerance: TolerancePreset::Adaptive,
            despike: None,
            gap_fill: GapFill::Linear(GapCap::default()),
            connect_breaks: false,
            downsample: Downsample::Stride {
                max_points: PING_CHART_MAX_POINTS,
            },
        }
    }

    /// Fixed tolerance, no interpolation.
    pub fn legacy_ping_chart() -> Self {
        PipelineConfig {
            tolerance: TolerancePreset::Fixed(DEFAULT_TOLERANCE_MS),
            despike: None,
            gap_fill: GapFill::None,
            connect_breaks: false,
            downsample: Downsample::Stride {
                max_points: PING_CHART_MAX_POINTS,
            },
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if let TolerancePreset::Fixed(ms) = self.tolerance
            && ms < 0
        {
            return invalid(format!("tolerance must not be negative, got {ms}ms"));
        }

        if let Some(despike) = &self.despike {
            if despike.alpha.is_nan() || despike.alpha <= 0.0 || despike.alpha > 1.0 {
                return invalid(format!(
                    "smoothing alpha must be in (0, 1], got {}",
                    despike.alpha
                ));
            }
            if despike.threshold.is_nan() || despike.threshold < 0.0 {
                return invalid(format!(
                    "spike threshold must not be negative, got {}",
                    despike.threshold
                ));
            }
        }

        match self.gap_fill {
            GapFill::None => {}
            GapFill::Grid(spec) => {
                if spec.interval_secs <= 0 {
                    return invalid(format!(
                        "grid interval must be positive, got {}s",
                        spec.interval_secs
                    ));
                }
                if let GridWindow::Fixed { total_secs } = spec.window
                    && total_secs < 0
                {
                    return invalid(format!(
                        "grid window must not be negative, got {total_secs}s"
                    ));
                }
                if spec.tolerance_secs.is_some_and(|t| t < 0) {
                    return invalid("grid tolerance must not be negative".to_string());
                }
                let total_secs = match spec.window {
                    GridWindow::Fixed { total_secs } => total_secs,
                    GridWindow::Variable => 0,
                };
                let in_range = [spec.interval_secs, total_secs, spec.tolerance_secs.unwrap_or(0)]
                    .iter()
                    .all(|secs| secs.checked_mul(1000).is_some());
                if !in_range {
                    return invalid("grid interval, window or tolerance is too large".to_string());
                }
                if let Some(count) = spec.point_count(0)
                    && count > MAX_GRID_POINTS
                {
                    return invalid(format!(
                        "grid would have {count} points, more than {MAX_GRID_POINTS}"
                    ));
                }
            }
            GapFill::Linear(GapCap::Unified { max_gap_ms }) => {
                if max_gap_ms <= 0 {
                    return invalid(format!("gap cap must be positive, got {max_gap_ms}ms"));
                }
            }
            GapFill::Linear(GapCap::Adaptive {
                multiplier,
                min_ms,
                max_ms,
            }) => {
                if multiplier.is_nan() || multiplier <= 0.0 {
                    return invalid(format!(
                        "gap cap multiplier must be positive, got {multiplier}"
                    ));
                }
                if min_ms < 0 || min_ms > max_ms {
                    return invalid(format!(
                        "gap cap bounds are inverted: min {min_ms}ms, max {max_ms}ms"
                    ));
                }
            }
        }

        if let Downsample::Retention { hours, .. } = self.downsample
            && !(hours.is_finite() && hours > 0.0)
        {
            return invalid(format!("retention must be a positive number of hours, got {hours}"));
        }

        Ok(())
    }
}

fn invalid(context: String) -> Result<(), Error> {
    Err(Error::InvalidConfig { context })
}

/// Series keys for `tasks`, in task order.
pub fn series_keys(tasks: &[Task]) -> Vec<String> {
    tasks.iter().map(|task| task.id.key()).collect()
}

/// Turns samples into chart rows: bucket, despike, fill gaps, downsample.
///
/// Samples for tasks not listed in `tasks` are ignored.
pub fn normalize(samples: &[Sample], tasks: &[Task], config: &PipelineConfig) -> Vec<Row> {
    let known: HashSet<_> = tasks.iter().map(|task| task.id).collect();
    let samples: Vec<Sample> = samples
        .iter()
        .filter(|sample| known.contains(&sample.task_id))
        .copied()
        .collect();
    let keys = series_keys(tasks);

    let tolerance_ms = tolerance_for_tasks(tasks, config.tolerance);
    let bucketed = merge_into_buckets(&samples, tolerance_ms);
    let mut rows = bucketed.clone();

    // Smoothing and interpolation both fill failed cells; they keep the row
    // order, so the bucketed rows still line up for restoring them.
    if let Some(despike_config) = &config.despike {
        rows = despike(&rows, &keys, despike_config);
        if !config.connect_breaks {
            rows = restore_failures(&bucketed, &rows, &keys);
        }
    }

    rows = match &config.gap_fill {
        GapFill::None => rows,
        GapFill::Grid(spec) => fill_grid(&rows, spec),
        GapFill::Linear(cap) => {
            let interpolated = interpolate_gaps(&rows, &keys, cap);
            if config.connect_breaks {
                interpolated
            } else {
                restore_failures(&bucketed, &interpolated, &keys)
            }
        }
    };

    let rows = match config.downsample {
        Downsample::None => rows,
        Downsample::Stride { max_points } => downsample_stride(&rows, max_points),
        Downsample::Retention { hours, mini_chart } => {
            downsample_retention(&rows, hours, mini_chart)
        }
    };

    debug!(
        "normalized {} sample(s) for {} task(s) into {} row(s)",
        samples.len(),
        tasks.len(),
        rows.len()
    );
    rows
}

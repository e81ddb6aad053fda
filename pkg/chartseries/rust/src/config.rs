// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use anyhow::{Context, Result};
use log::{Level, debug};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::bucket::TolerancePreset;
use crate::despike::DespikeConfig;
use crate::errors::Error;
use crate::grid::{GridSpec, GridWindow};
use crate::interpolate::{DEFAULT_GAP_MULTIPLIER, DEFAULT_MAX_GAP_MS, DEFAULT_MIN_GAP_MS, GapCap};
use crate::pipeline::{Downsample, GapFill, PING_CHART_MAX_POINTS, PipelineConfig};

const DEFAULT_CONFIG_PATH: &str = "/etc/chartseries/chartseries.yaml";

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_points() -> usize {
    PING_CHART_MAX_POINTS
}

fn default_gap_multiplier() -> f64 {
    DEFAULT_GAP_MULTIPLIER
}

fn default_min_gap_ms() -> i64 {
    DEFAULT_MIN_GAP_MS
}

fn default_max_gap_ms() -> i64 {
    DEFAULT_MAX_GAP_MS
}

fn default_grid_interval_secs() -> i64 {
    60
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapFillMode {
    None,
    Grid,
    #[default]
    Linear,
}

/// Tunables read from `chartseries.yaml`. Every field is optional; an empty
/// file yields the ping chart preset.
#[derive(Debug, Clone, Deserialize)]
pub struct ChartConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Bucket merge tolerance. Unset means derive it from task intervals.
    pub tolerance_ms: Option<i64>,

    #[serde(default)]
    pub enable_smoothing: bool,
    #[serde(default)]
    pub smoothing: DespikeConfig,

    #[serde(default)]
    pub gap_fill: GapFillMode,
    #[serde(default)]
    pub enable_connect_breaks: bool,
    /// One gap cap for every series; overrides the adaptive settings below.
    pub unified_gap_cap_ms: Option<i64>,
    #[serde(default = "default_gap_multiplier")]
    pub gap_cap_multiplier: f64,
    #[serde(default = "default_min_gap_ms")]
    pub min_gap_cap_ms: i64,
    #[serde(default = "default_max_gap_ms")]
    pub max_gap_cap_ms: i64,
    #[serde(default = "default_grid_interval_secs")]
    pub grid_interval_secs: i64,
    /// Fixed grid window. Unset means the grid spans the data.
    pub grid_total_secs: Option<i64>,
    pub grid_tolerance_secs: Option<i64>,

    /// `0` disables the point budget.
    #[serde(default = "default_max_points")]
    pub ping_chart_max_points: usize,
    /// When set, retention downsampling replaces the point budget.
    pub retention_hours: Option<f64>,
    #[serde(default)]
    pub mini_chart: bool,
}

impl Default for ChartConfig {
    fn default() -> Self {
        ChartConfig {
            log_level: default_log_level(),
            tolerance_ms: None,
            enable_smoothing: false,
            smoothing: DespikeConfig::default(),
            gap_fill: GapFillMode::default(),
            enable_connect_breaks: false,
            unified_gap_cap_ms: None,
            gap_cap_multiplier: default_gap_multiplier(),
            min_gap_cap_ms: default_min_gap_ms(),
            max_gap_cap_ms: default_max_gap_ms(),
            grid_interval_secs: default_grid_interval_secs(),
            grid_total_secs: None,
            grid_tolerance_secs: None,
            ping_chart_max_points: default_max_points(),
            retention_hours: None,
            mini_chart: false,
        }
    }
}

impl ChartConfig {
    /// Builds and validates the pipeline described by this config.
    pub fn pipeline(&self) -> Result<PipelineConfig, Error> {
        let tolerance = match self.tolerance_ms {
            Some(ms) => TolerancePreset::Fixed(ms),
            None => TolerancePreset::Adaptive,
        };

        let gap_fill = match self.gap_fill {
            GapFillMode::None => GapFill::None,
            GapFillMode::Grid => GapFill::Grid(GridSpec {
                interval_secs: self.grid_interval_secs,
                window: match self.grid_total_secs {
                    Some(total_secs) => GridWindow::Fixed { total_secs },
                    None => GridWindow::Variable,
                },
                tolerance_secs: self.grid_tolerance_secs,
            }),
            GapFillMode::Linear => GapFill::Linear(match self.unified_gap_cap_ms {
                Some(max_gap_ms) => GapCap::Unified { max_gap_ms },
                None => GapCap::Adaptive {
                    multiplier: self.gap_cap_multiplier,
                    min_ms: self.min_gap_cap_ms,
                    max_ms: self.max_gap_cap_ms,
                },
            }),
        };

        let downsample = match self.retention_hours {
            Some(hours) => Downsample::Retention {
                hours,
                mini_chart: self.mini_chart,
            },
            None if self.ping_chart_max_points == 0 => Downsample::None,
            None => Downsample::Stride {
                max_points: self.ping_chart_max_points,
            },
        };

        let config = PipelineConfig {
            tolerance,
            despike: self.enable_smoothing.then_some(self.smoothing),
            gap_fill,
            connect_breaks: self.enable_connect_breaks,
            downsample,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn log_level(&self) -> Result<Level, Error> {
        Level::from_str(&self.log_level).map_err(|_| Error::InvalidConfig {
            context: format!("unknown log level {:?}", self.log_level),
        })
    }
}

pub fn config_path() -> PathBuf {
    std::env::var("CHARTSERIES_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

pub fn load_config(path: &Path) -> Result<ChartConfig> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    // An empty document deserializes as unit, not as a map.
    if contents.trim().is_empty() {
        return Ok(ChartConfig::default());
    }
    let config: ChartConfig =
        serde_yaml::from_str(&contents).with_context(|| format!("parsing {}", path.display()))?;
    Ok(config)
}

/// Like `load_config`, but a missing file means defaults.
pub fn load_config_or_default(path: &Path) -> Result<ChartConfig> {
    if !path.exists() {
        debug!("no config at {}, using defaults", path.display());
        return Ok(ChartConfig::default());
    }
    load_config(path)
}

// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Chart rows and the tri-state cells they carry.
//!
//! A cell is `Missing` (no sample landed here), `Failed` (the probe reported
//! the failure sentinel) or `Value`. Both non-values render as `null`, but
//! they are kept apart until serialization so that gap filling can treat
//! them differently.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};

/// Key under which the row timestamp is serialized.
pub const TIME_KEY: &str = "time";

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Cell {
    /// No measurement at this point.
    #[default]
    Missing,
    /// The measurement was attempted and failed (packet lost, timeout).
    Failed,
    Value(f64),
}

impl Cell {
    pub fn value(self) -> Option<f64> {
        match self {
            Cell::Value(v) => Some(v),
            Cell::Missing | Cell::Failed => None,
        }
    }

    pub fn is_value(self) -> bool {
        matches!(self, Cell::Value(_))
    }
}

/// Non-numeric metadata carried by a row (node name, online flag, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Label {
    Flag(bool),
    Text(String),
}

/// Anything with a position on the time axis.
pub trait Timestamped {
    fn time_ms(&self) -> i64;
}

/// One point on the chart's time axis.
///
/// `cells` is sparse: a key that is absent reads back as `Cell::Missing`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    pub time_ms: i64,
    pub cells: BTreeMap<String, Cell>,
    pub labels: BTreeMap<String, Label>,
}

impl Row {
    pub fn new(time_ms: i64) -> Self {
        Row {
            time_ms,
            ..Default::default()
        }
    }

    pub fn with_cell(mut self, key: impl Into<String>, cell: Cell) -> Self {
        self.cells.insert(key.into(), cell);
        self
    }

    pub fn with_label(mut self, key: impl Into<String>, label: Label) -> Self {
        self.labels.insert(key.into(), label);
        self
    }

    pub fn cell(&self, key: &str) -> Cell {
        self.cells.get(key).copied().unwrap_or_default()
    }

    pub fn value(&self, key: &str) -> Option<f64> {
        self.cell(key).value()
    }

    pub fn set(&mut self, key: &str, cell: Cell) {
        match self.cells.get_mut(key) {
            Some(slot) => *slot = cell,
            None => {
                self.cells.insert(key.to_string(), cell);
            }
        }
    }

    /// Same cells and labels, moved to `time_ms`.
    pub fn restamped(&self, time_ms: i64) -> Row {
        Row {
            time_ms,
            cells: self.cells.clone(),
            labels: self.labels.clone(),
        }
    }

    /// A row at `time_ms` that keeps this row's labels but holds no data for
    /// any of `keys`.
    pub fn placeholder(&self, time_ms: i64, keys: &BTreeSet<String>) -> Row {
        Row {
            time_ms,
            cells: keys.iter().map(|k| (k.clone(), Cell::Missing)).collect(),
            labels: self.labels.clone(),
        }
    }
}

impl Timestamped for Row {
    fn time_ms(&self) -> i64 {
        self.time_ms
    }
}

/// Rows serialize flat, the shape chart components consume:
/// `{"time": 1700000000000, "3": 12.5, "4": null, "name": "edge-1"}`.
impl Serialize for Row {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(1 + self.cells.len() + self.labels.len()))?;
        map.serialize_entry(TIME_KEY, &self.time_ms)?;
        for (key, cell) in &self.cells {
            map.serialize_entry(key, &cell.value())?;
        }
        for (key, label) in &self.labels {
            map.serialize_entry(key, label)?;
        }
        map.end()
    }
}

/// Every cell key that appears in at least one row.
pub fn cell_keys(rows: &[Row]) -> BTreeSet<String> {
    rows.iter()
        .flat_map(|row| row.cells.keys().cloned())
        .collect()
}

pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

pub(crate) fn round2(value: f64) -> f64 {
    round_to(value, 2)
}

pub(crate) fn round1(value: f64) -> f64 {
    round_to(value, 1)
}

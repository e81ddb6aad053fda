// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::errors::Error;
use crate::row::{Cell, Timestamped};

/// Value reported by probes when a measurement failed.
pub const FAILED_SENTINEL: f64 = -1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub i64);

impl TaskId {
    /// Series key used for this task in chart rows.
    pub fn key(self) -> String {
        self.0.to_string()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An independently tracked measurement series, e.g. one ping target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    #[serde(default)]
    pub name: String,
    /// Expected sampling period in seconds.
    #[serde(default)]
    pub interval: Option<f64>,
}

/// A record as delivered by the data-fetch layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    /// RFC 3339 timestamp.
    pub time: String,
    pub task_id: TaskId,
    #[serde(default)]
    pub value: Option<f64>,
}

/// What the fetch layer hands over for one node and look-back window.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FetchPayload {
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub records: Vec<RawRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub time_ms: i64,
    pub task_id: TaskId,
    pub reading: Cell,
}

impl Sample {
    /// Builds a sample from a raw numeric value. This is the only place the
    /// failure sentinel is interpreted.
    pub fn new(time_ms: i64, task_id: TaskId, value: Option<f64>) -> Self {
        let reading = match value {
            Some(v) if v == FAILED_SENTINEL => Cell::Failed,
            Some(v) if v.is_finite() => Cell::Value(v),
            _ => Cell::Missing,
        };
        Sample {
            time_ms,
            task_id,
            reading,
        }
    }

    /// A probe counts as successful when it produced a non-negative value.
    pub fn is_success(&self) -> bool {
        matches!(self.reading, Cell::Value(v) if v >= 0.0)
    }
}

impl Timestamped for Sample {
    fn time_ms(&self) -> i64 {
        self.time_ms
    }
}

impl TryFrom<&RawRecord> for Sample {
    type Error = Error;

    fn try_from(record: &RawRecord) -> Result<Self, Self::Error> {
        let time_ms = parse_timestamp_ms(&record.time)?;
        Ok(Sample::new(time_ms, record.task_id, record.value))
    }
}

/// Parses an RFC 3339 timestamp into epoch milliseconds.
pub fn parse_timestamp_ms(value: &str) -> Result<i64, Error> {
    let parsed = OffsetDateTime::parse(value, &Rfc3339).map_err(|e| Error::InvalidTimestamp {
        value: value.to_string(),
        reason: e.to_string(),
    })?;
    i64::try_from(parsed.unix_timestamp_nanos() / 1_000_000).map_err(|_| {
        Error::InvalidTimestamp {
            value: value.to_string(),
            reason: "out of range".to_string(),
        }
    })
}

#[derive(Debug, Default)]
pub struct IngestReport {
    pub samples: Vec<Sample>,
    /// Records dropped because their timestamp could not be parsed.
    pub rejected: usize,
}

/// Converts wire records into samples, preserving arrival order.
///
/// Records with unparseable timestamps are skipped rather than allowed to
/// poison time comparisons further down the pipeline.
pub fn ingest(records: &[RawRecord]) -> IngestReport {
    let mut report = IngestReport {
        samples: Vec::with_capacity(records.len()),
        rejected: 0,
    };

    for record in records {
        match Sample::try_from(record) {
            Ok(sample) => report.samples.push(sample),
            Err(e) => {
                debug!("dropping record for task {}: {e}", record.task_id);
                report.rejected += 1;
            }
        }
    }

    if report.rejected > 0 {
        warn!(
            "dropped {} of {} record(s) with malformed timestamps",
            report.rejected,
            records.len()
        );
    }

    report
}

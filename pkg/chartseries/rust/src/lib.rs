// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Chart series normalization for the monitoring dashboard.
//!
//! Raw telemetry arrives as irregularly timed `{time, task_id, value}`
//! records. This crate turns them into regular, chart-ready rows:
//!
//! 1. `sample` - ingestion; the `-1` failure sentinel becomes `Cell::Failed`.
//! 2. `bucket` - clusters samples with nearby timestamps onto shared anchors.
//! 3. `despike` - optional EWMA smoothing with outlier rejection.
//! 4. `grid` / `interpolate` - gap filling on a fixed grid or by linear
//!    interpolation under a gap cap.
//! 5. `downsample` - stride or retention-based point reduction.
//!
//! `stats` works on the unbucketed samples and produces the summary badges
//! (loss rate, latest value). `pipeline::normalize` strings the stages
//! together from a single immutable `PipelineConfig`.

// Correctness
#![deny(clippy::indexing_slicing)]
#![deny(clippy::string_slice)]
#![deny(clippy::cast_possible_wrap)]
#![deny(clippy::undocumented_unsafe_blocks)]
// Panicking code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::unimplemented)]
#![deny(clippy::todo)]
// Debug code that shouldn't be in production
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]

pub mod bucket;
pub mod config;
pub mod despike;
pub mod downsample;
mod errors;
pub mod grid;
pub mod interpolate;
pub mod pipeline;
pub mod row;
pub mod sample;
pub mod stats;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-export the public API
pub use errors::Error;
pub use pipeline::{Downsample, GapFill, PipelineConfig, normalize};
pub use row::{Cell, Label, Row, Timestamped};
pub use sample::{FetchPayload, IngestReport, RawRecord, Sample, Task, TaskId, ingest};
pub use stats::{TaskStats, TaskSummary, TimeWindow};

// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Linear gap interpolation.
//!
//! Short holes between two valid samples are bridged with a straight line.
//! Holes longer than the gap cap are left alone: a real outage should show
//! up as a break in the chart.

use log::debug;

use crate::row::{Cell, Row, round2};

pub const DEFAULT_GAP_MULTIPLIER: f64 = 6.0;
pub const DEFAULT_MIN_GAP_MS: i64 = 2 * 60 * 1000;
pub const DEFAULT_MAX_GAP_MS: i64 = 30 * 60 * 1000;

/// Largest time span interpolation may bridge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GapCap {
    /// Same cap for every series.
    Unified { max_gap_ms: i64 },
    /// Per series: `median_delta * multiplier`, clamped to `[min_ms, max_ms]`.
    Adaptive {
        multiplier: f64,
        min_ms: i64,
        max_ms: i64,
    },
}

impl Default for GapCap {
    fn default() -> Self {
        GapCap::Adaptive {
            multiplier: DEFAULT_GAP_MULTIPLIER,
            min_ms: DEFAULT_MIN_GAP_MS,
            max_ms: DEFAULT_MAX_GAP_MS,
        }
    }
}

impl GapCap {
    /// Resolves the cap for one series given the times of its valid samples.
    pub fn resolve(&self, valid_times: &[i64]) -> i64 {
        match *self {
            GapCap::Unified { max_gap_ms } => max_gap_ms,
            GapCap::Adaptive {
                multiplier,
                min_ms,
                max_ms,
            } => match median_delta(valid_times) {
                Some(delta) => ((delta as f64 * multiplier).round() as i64)
                    .max(min_ms)
                    .min(max_ms),
                None => min_ms,
            },
        }
    }
}

/// Median of the deltas between consecutive timestamps (upper median for an
/// even count).
fn median_delta(times: &[i64]) -> Option<i64> {
    let mut deltas: Vec<i64> = times
        .iter()
        .zip(times.iter().skip(1))
        .map(|(prev, next)| next - prev)
        .collect();
    deltas.sort_unstable();
    deltas.get(deltas.len() / 2).copied()
}

/// Fills non-value cells of `keys` that sit between two valid samples no
/// further apart than the cap. `rows` must be sorted by time.
///
/// `Missing` and `Failed` cells are both filled; use `restore_failures`
/// afterwards to bring failed probes back as breaks.
pub fn interpolate_gaps<K: AsRef<str>>(rows: &[Row], keys: &[K], cap: &GapCap) -> Vec<Row> {
    let mut out = rows.to_vec();

    for key in keys {
        let key = key.as_ref();
        let anchors: Vec<(usize, i64, f64)> = out
            .iter()
            .enumerate()
            .filter_map(|(idx, row)| row.value(key).map(|v| (idx, row.time_ms, v)))
            .collect();
        if anchors.len() < 2 {
            continue;
        }

        let valid_times: Vec<i64> = anchors.iter().map(|&(_, t, _)| t).collect();
        let max_gap_ms = cap.resolve(&valid_times);
        let mut filled = 0usize;

        for (&(i0, t0, v0), &(i1, t1, v1)) in anchors.iter().zip(anchors.iter().skip(1)) {
            if i1 - i0 < 2 || t1 <= t0 || t1 - t0 > max_gap_ms {
                continue;
            }
            let (low, high) = (v0.min(v1), v0.max(v1));
            let span = (t1 - t0) as f64;
            for row in out.iter_mut().take(i1).skip(i0 + 1) {
                let ratio = (row.time_ms - t0) as f64 / span;
                let v = round2(v0 + (v1 - v0) * ratio).clamp(low, high);
                row.set(key, Cell::Value(v));
                filled += 1;
            }
        }

        if filled > 0 {
            debug!("interpolated {filled} point(s) for series {key} (cap {max_gap_ms}ms)");
        }
    }

    out
}

/// Puts `Failed` cells from `original` back into `interpolated`.
///
/// Both slices must come from the same rows in the same order, as returned
/// by `interpolate_gaps` or `despike`.
pub fn restore_failures<K: AsRef<str>>(
    original: &[Row],
    interpolated: &[Row],
    keys: &[K],
) -> Vec<Row> {
    let mut out = interpolated.to_vec();
    for (before, after) in original.iter().zip(out.iter_mut()) {
        for key in keys {
            let key = key.as_ref();
            if before.cell(key) == Cell::Failed {
                after.set(key, Cell::Failed);
            }
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::test_utils::{series, values};

    const MINUTE: i64 = 60_000;

    #[test]
    fn test_fills_short_gap_linearly() {
        let rows = series(
            "1",
            &[(0, Some(10.0)), (MINUTE, None), (2 * MINUTE, None), (3 * MINUTE, Some(40.0))],
        );
        let out = interpolate_gaps(&rows, &["1"], &GapCap::default());
        assert_eq!(
            values(&out, "1"),
            vec![Some(10.0), Some(20.0), Some(30.0), Some(40.0)]
        );
    }

    #[test]
    fn test_uses_time_not_index() {
        let rows = series("1", &[(0, Some(0.0)), (45_000, None), (60_000, Some(100.0))]);
        let out = interpolate_gaps(&rows, &["1"], &GapCap::default());
        assert_eq!(out[1].value("1"), Some(75.0));
    }

    #[test]
    fn test_gap_wider_than_cap_stays_null() {
        let rows = series(
            "1",
            &[(0, Some(10.0)), (MINUTE, None), (10 * MINUTE, Some(20.0))],
        );
        let cap = GapCap::Unified {
            max_gap_ms: 5 * MINUTE,
        };
        let out = interpolate_gaps(&rows, &["1"], &cap);
        assert_eq!(out[1].cell("1"), Cell::Missing);
    }

    #[test]
    fn test_adaptive_cap_from_median_delta() {
        // Median delta 60s * 6 = 6min, inside [2min, 30min].
        let cap = GapCap::default();
        let times: Vec<i64> = (0..5).map(|i| i * MINUTE).collect();
        assert_eq!(cap.resolve(&times), 6 * MINUTE);
    }

    #[test]
    fn test_adaptive_cap_clamped() {
        let cap = GapCap::default();
        assert_eq!(cap.resolve(&[0, 1000, 2000]), DEFAULT_MIN_GAP_MS);
        assert_eq!(cap.resolve(&[0, 3_600_000, 7_200_000]), DEFAULT_MAX_GAP_MS);
        assert_eq!(cap.resolve(&[0]), DEFAULT_MIN_GAP_MS);
    }

    #[test]
    fn test_adaptive_cap_leaves_outage() {
        // Regular 1 minute cadence, then a 20 minute hole: cap is 6 minutes.
        let mut points: Vec<(i64, Option<f64>)> =
            (0..10).map(|i| (i * MINUTE, Some(5.0))).collect();
        points.push((15 * MINUTE, None));
        points.push((29 * MINUTE, Some(5.0)));
        let rows = series("1", &points);
        let out = interpolate_gaps(&rows, &["1"], &GapCap::default());
        assert_eq!(out[10].value("1"), None);
    }

    #[test]
    fn test_values_bounded_by_neighbors() {
        let rows = series(
            "1",
            &[(0, Some(3.33)), (1000, None), (2000, None), (3000, Some(3.34))],
        );
        let out = interpolate_gaps(&rows, &["1"], &GapCap::default());
        for v in values(&out, "1").into_iter().flatten() {
            assert!((3.33..=3.34).contains(&v), "{v} out of bounds");
        }
    }

    #[test]
    fn test_absent_keys_are_filled() {
        let rows = vec![
            Row::new(0).with_cell("1", Cell::Value(1.0)),
            Row::new(1000).with_cell("2", Cell::Value(9.0)),
            Row::new(2000).with_cell("1", Cell::Value(3.0)),
        ];
        let out = interpolate_gaps(&rows, &["1"], &GapCap::default());
        assert_eq!(out[1].value("1"), Some(2.0));
        assert_eq!(out[1].value("2"), Some(9.0));
    }

    #[test]
    fn test_leading_and_trailing_nulls_untouched() {
        let rows = series(
            "1",
            &[(0, None), (1000, Some(1.0)), (2000, Some(2.0)), (3000, None)],
        );
        let out = interpolate_gaps(&rows, &["1"], &GapCap::default());
        assert_eq!(values(&out, "1"), vec![None, Some(1.0), Some(2.0), None]);
    }

    #[test]
    fn test_input_not_mutated() {
        let rows = series("1", &[(0, Some(1.0)), (1000, None), (2000, Some(3.0))]);
        let snapshot = rows.clone();
        let _ = interpolate_gaps(&rows, &["1"], &GapCap::default());
        assert_eq!(rows, snapshot);
    }

    #[test]
    fn test_restore_failures_only_touches_failed() {
        let rows = vec![
            Row::new(0).with_cell("1", Cell::Value(10.0)),
            Row::new(1000).with_cell("1", Cell::Failed),
            Row::new(2000),
            Row::new(3000).with_cell("1", Cell::Value(40.0)),
        ];
        let interpolated = interpolate_gaps(&rows, &["1"], &GapCap::default());
        assert_eq!(interpolated[1].value("1"), Some(20.0));
        assert_eq!(interpolated[2].value("1"), Some(30.0));

        let restored = restore_failures(&rows, &interpolated, &["1"]);
        assert_eq!(restored[1].cell("1"), Cell::Failed);
        assert_eq!(restored[2].value("1"), Some(30.0));
    }

    #[test]
    fn test_empty_rows() {
        let out = interpolate_gaps::<&str>(&[], &["1"], &GapCap::default());
        assert!(out.is_empty());
    }
}

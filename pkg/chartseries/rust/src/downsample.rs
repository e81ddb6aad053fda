// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Point reduction before rendering.

use log::debug;

use crate::row::Timestamped;

const MINUTE_MS: i64 = 60 * 1000;

/// Upper bounds (inclusive, in hours) of the retention tiers.
const RETENTION_TIERS_HOURS: [f64; 4] = [72.0, 168.0, 720.0, 2160.0];
/// Spacing per tier for the main chart, in minutes.
const MAIN_CHART_MINUTES: [i64; 4] = [1, 15, 30, 60];
const MAIN_CHART_BEYOND_MINUTES: i64 = 90;
const MINI_CHART_MINUTES: [i64; 4] = [5, 30, 60, 120];
const MINI_CHART_BEYOND_MINUTES: i64 = 180;

/// Keeps every `ceil(len / max_points)`-th item, starting with the first.
///
/// `max_points == 0` disables the budget.
pub fn downsample_stride<T: Clone>(items: &[T], max_points: usize) -> Vec<T> {
    if max_points == 0 || items.len() <= max_points {
        return items.to_vec();
    }
    let factor = items.len().div_ceil(max_points);
    let out: Vec<T> = items.iter().step_by(factor).cloned().collect();
    debug!(
        "stride downsample: {} -> {} point(s) (every {factor})",
        items.len(),
        out.len()
    );
    out
}

/// Minimum spacing between kept points for a retention window.
pub fn retention_interval_ms(retention_hours: f64, mini_chart: bool) -> i64 {
    let (table, beyond) = if mini_chart {
        (&MINI_CHART_MINUTES, MINI_CHART_BEYOND_MINUTES)
    } else {
        (&MAIN_CHART_MINUTES, MAIN_CHART_BEYOND_MINUTES)
    };
    let minutes = RETENTION_TIERS_HOURS
        .iter()
        .zip(table)
        .find_map(|(&bound, &minutes)| (retention_hours <= bound).then_some(minutes))
        .unwrap_or(beyond);
    minutes * MINUTE_MS
}

/// Thins `items` (sorted by time) so that kept points are at least one
/// retention interval apart.
///
/// The first and last items always survive. When the last item sits within
/// half an interval of the previously kept one, it takes that one's place
/// instead of crowding it, unless that would drop the first item.
pub fn downsample_retention<T>(items: &[T], retention_hours: f64, mini_chart: bool) -> Vec<T>
where
    T: Timestamped + Clone,
{
    let Some((last, rest)) = items.split_last() else {
        return Vec::new();
    };
    if rest.is_empty() {
        return vec![last.clone()];
    }

    let interval_ms = retention_interval_ms(retention_hours, mini_chart);
    let mut kept: Vec<T> = Vec::new();
    let mut last_kept_ms: Option<i64> = None;

    for item in rest {
        let keep = match last_kept_ms {
            None => true,
            Some(prev) => item.time_ms() - prev >= interval_ms,
        };
        if keep {
            last_kept_ms = Some(item.time_ms());
            kept.push(item.clone());
        }
    }

    if kept.len() > 1
        && last_kept_ms.is_some_and(|prev| last.time_ms() - prev < interval_ms / 2)
    {
        kept.pop();
    }
    kept.push(last.clone());

    debug!(
        "retention downsample ({retention_hours}h, mini={mini_chart}): {} -> {} point(s)",
        items.len(),
        kept.len()
    );
    kept
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::row::Row;
    use crate::test_utils::{evenly_spaced, times};
    use proptest::prelude::*;

    #[test]
    fn test_stride_under_budget_is_copy() {
        let items: Vec<u32> = (0..10).collect();
        assert_eq!(downsample_stride(&items, 10), items);
        assert_eq!(downsample_stride(&items, 0), items);
    }

    #[test]
    fn test_stride_keeps_every_nth() {
        let items: Vec<u32> = (0..10).collect();
        // ceil(10 / 4) = 3
        assert_eq!(downsample_stride(&items, 4), vec![0, 3, 6, 9]);
    }

    #[test]
    fn test_stride_rows() {
        let rows = evenly_spaced("1", 1000, &[1.0; 1200]);
        let out = downsample_stride(&rows, 500);
        // ceil(1200 / 500) = 3
        assert_eq!(out.len(), 400);
        assert_eq!(out[1].time_ms, 3000);
    }

    #[test]
    fn test_retention_interval_table() {
        assert_eq!(retention_interval_ms(24.0, false), MINUTE_MS);
        assert_eq!(retention_interval_ms(72.0, false), MINUTE_MS);
        assert_eq!(retention_interval_ms(73.0, false), 15 * MINUTE_MS);
        assert_eq!(retention_interval_ms(100.0, false), 15 * MINUTE_MS);
        assert_eq!(retention_interval_ms(720.0, false), 30 * MINUTE_MS);
        assert_eq!(retention_interval_ms(2000.0, false), 60 * MINUTE_MS);
        assert_eq!(retention_interval_ms(5000.0, false), 90 * MINUTE_MS);

        assert_eq!(retention_interval_ms(72.0, true), 5 * MINUTE_MS);
        assert_eq!(retention_interval_ms(73.0, true), 30 * MINUTE_MS);
        assert_eq!(retention_interval_ms(168.0, true), 30 * MINUTE_MS);
        assert_eq!(retention_interval_ms(700.0, true), 60 * MINUTE_MS);
        assert_eq!(retention_interval_ms(2160.0, true), 120 * MINUTE_MS);
        assert_eq!(retention_interval_ms(9000.0, true), 180 * MINUTE_MS);
    }

    #[test]
    fn test_retention_spacing() {
        // 30 second samples over 10 minutes, mini chart: 5 minute spacing.
        let rows = evenly_spaced("1", 30_000, &[1.0; 21]);
        let out = downsample_retention(&rows, 24.0, true);
        assert_eq!(times(&out), vec![0, 300_000, 600_000]);
    }

    #[test]
    fn test_retention_last_replaces_close_neighbor() {
        let rows: Vec<Row> = [0, 300_000, 400_000]
            .into_iter()
            .map(Row::new)
            .collect();
        let out = downsample_retention(&rows, 24.0, true);
        // 400s is within 150s of 300s, so it takes 300s's slot.
        assert_eq!(times(&out), vec![0, 400_000]);
    }

    #[test]
    fn test_retention_never_replaces_first() {
        let rows: Vec<Row> = [0, 60_000].into_iter().map(Row::new).collect();
        let out = downsample_retention(&rows, 24.0, true);
        assert_eq!(times(&out), vec![0, 60_000]);
    }

    #[test]
    fn test_retention_far_last_appended() {
        let rows: Vec<Row> = [0, 300_000, 500_000].into_iter().map(Row::new).collect();
        let out = downsample_retention(&rows, 24.0, true);
        assert_eq!(times(&out), vec![0, 300_000, 500_000]);
    }

    #[test]
    fn test_retention_small_inputs() {
        assert!(downsample_retention::<Row>(&[], 24.0, false).is_empty());
        let one = vec![Row::new(5)];
        assert_eq!(downsample_retention(&one, 24.0, false), one);
    }

    proptest! {
        #[test]
        fn prop_stride_respects_budget(len in 0usize..3000, max_points in 1usize..600) {
            let items: Vec<usize> = (0..len).collect();
            let out = downsample_stride(&items, max_points);
            prop_assert!(out.len() <= max_points);
            prop_assert_eq!(out.first(), items.first());
        }
    }
}

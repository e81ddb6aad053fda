// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Grid gap filling.
//!
//! Charts need a regular time axis; otherwise a gap renders as a diagonal
//! line between two distant points. `fill_grid` lays an ideal grid over the
//! data, snaps the nearest row onto each grid point and inserts placeholder
//! rows where nothing is close enough.

use log::{debug, warn};

use crate::row::{Row, cell_keys};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridWindow {
    /// `total_secs` ending at the last row.
    Fixed { total_secs: i64 },
    /// From the first row to the last row.
    Variable,
}

/// Upper bound on grid points per fill. Anything larger is left unfilled.
pub const MAX_GRID_POINTS: i64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSpec {
    pub interval_secs: i64,
    pub window: GridWindow,
    /// How far a row may sit from a grid point and still be snapped to it.
    ///
    /// Unset means `interval_secs`, with reach capped at half an interval
    /// for every point but the last so a row past the midpoint goes to the
    /// next point. An explicit value is used as is for every point.
    pub tolerance_secs: Option<i64>,
}

/// Grid geometry in milliseconds, checked against overflow.
#[derive(Debug, Clone, Copy)]
struct Layout {
    start_ms: i64,
    interval_ms: i64,
    tolerance_ms: i64,
    count: i64,
}

impl GridSpec {
    pub fn fixed(interval_secs: i64, total_secs: i64) -> Self {
        GridSpec {
            interval_secs,
            window: GridWindow::Fixed { total_secs },
            tolerance_secs: None,
        }
    }

    pub fn variable(interval_secs: i64) -> Self {
        GridSpec {
            interval_secs,
            window: GridWindow::Variable,
            tolerance_secs: None,
        }
    }

    /// Number of grid points for a data span.
    ///
    /// `None` for a non-positive interval or when the count overflows.
    pub fn point_count(&self, span_ms: i64) -> Option<i64> {
        if self.interval_secs <= 0 {
            return None;
        }
        let steps = match self.window {
            GridWindow::Fixed { total_secs } => total_secs.max(0) / self.interval_secs,
            GridWindow::Variable => span_ms.max(0) / self.interval_secs.checked_mul(1000)?,
        };
        steps.checked_add(1)
    }

    fn layout(&self, first_ms: i64, last_ms: i64) -> Option<Layout> {
        let count = self.point_count(last_ms.checked_sub(first_ms)?)?;
        if count > MAX_GRID_POINTS {
            return None;
        }
        let interval_ms = self.interval_secs.checked_mul(1000)?;
        let tolerance_ms = self
            .tolerance_secs
            .unwrap_or(self.interval_secs)
            .max(0)
            .checked_mul(1000)?;
        let start_ms = match self.window {
            GridWindow::Fixed { total_secs } => {
                last_ms.checked_sub(total_secs.max(0).checked_mul(1000)?)?
            }
            GridWindow::Variable => first_ms,
        };
        // Every grid time up to the last one must be representable.
        start_ms.checked_add((count - 1).checked_mul(interval_ms)?)?;
        Some(Layout {
            start_ms,
            interval_ms,
            tolerance_ms,
            count,
        })
    }
}

/// Returns one row per grid point.
///
/// Each grid point takes the nearest unconsumed row within tolerance. A row
/// is consumed once matched, so it never fills two grid points. Matched
/// rows keep their cells and labels but take the grid timestamp. Unmatched
/// grid points get a placeholder: every series seen in the input is
/// `Missing`, labels come from the most recent matched row (or the first
/// row before any match).
///
/// A grid that can't be laid out (non-positive interval, more than
/// `MAX_GRID_POINTS` points, or times outside the `i64` range) leaves the
/// rows unchanged.
pub fn fill_grid(rows: &[Row], spec: &GridSpec) -> Vec<Row> {
    let mut sorted: Vec<&Row> = rows.iter().collect();
    sorted.sort_by_key(|row| row.time_ms);

    let (Some(&first), Some(&last)) = (sorted.first(), sorted.last()) else {
        return Vec::new();
    };
    let Some(layout) = spec.layout(first.time_ms, last.time_ms) else {
        warn!(
            "cannot lay a {}s grid ({:?}) over {}ms of data; leaving rows unchanged",
            spec.interval_secs,
            spec.window,
            last.time_ms.saturating_sub(first.time_ms)
        );
        return rows.to_vec();
    };
    let Layout {
        start_ms,
        interval_ms,
        tolerance_ms,
        count,
    } = layout;
    let keys = cell_keys(rows);

    let mut filled = Vec::with_capacity(usize::try_from(count).unwrap_or(0));
    let mut template = first;
    let mut cursor = 0;
    let mut matched = 0usize;

    for step in 0..count {
        let grid_ms = start_ms + step * interval_ms;

        // Rows too old for this grid point can't match any later one either.
        while sorted
            .get(cursor)
            .is_some_and(|row| row.time_ms < grid_ms.saturating_sub(tolerance_ms))
        {
            cursor += 1;
        }

        let reach_ms = match spec.tolerance_secs {
            None if step + 1 < count => tolerance_ms.min(interval_ms / 2),
            _ => tolerance_ms,
        };
        let mut nearest: Option<(usize, &Row, u64)> = None;
        for (idx, &row) in sorted.iter().enumerate().skip(cursor) {
            if row.time_ms > grid_ms.saturating_add(reach_ms) {
                break;
            }
            let distance = row.time_ms.abs_diff(grid_ms);
            if nearest.is_none_or(|(_, _, best)| distance < best) {
                nearest = Some((idx, row, distance));
            }
        }

        match nearest {
            Some((idx, row, _)) => {
                filled.push(row.restamped(grid_ms));
                template = row;
                cursor = idx + 1;
                matched += 1;
            }
            None => filled.push(template.placeholder(grid_ms, &keys)),
        }
    }

    debug!(
        "grid fill: {} row(s) -> {} point(s), {} matched",
        rows.len(),
        filled.len(),
        matched
    );
    filled
}

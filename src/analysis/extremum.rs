//! Coarse extremum search and parabolic sub-grid refinement.

use std::ops::Range;

use super::error::{DeriveError, DeriveResult};
use super::linalg::polyfit;

/// Index of the grid point nearest `value`; the lower index wins ties.
///
/// `grid` must be sorted ascending and non-empty.
pub fn nearest_index(grid: &[f64], value: f64) -> usize {
    debug_assert!(!grid.is_empty());
    let upper = grid.partition_point(|&g| g < value);
    if upper == 0 {
        return 0;
    }
    if upper == grid.len() {
        return grid.len() - 1;
    }
    let below = value - grid[upper - 1];
    let above = grid[upper] - value;
    if above < below {
        upper
    } else {
        upper - 1
    }
}

/// Half-open index range `[nearest(lo), nearest(hi))` on `grid`.
pub fn snap_range(grid: &[f64], lo: f64, hi: f64) -> Range<usize> {
    nearest_index(grid, lo)..nearest_index(grid, hi)
}

/// Position of the first maximum (or minimum) of `values`. NaN never wins.
pub fn arg_extremum(values: &[f64], find_max: bool) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        let better = match best {
            None => true,
            Some((_, b)) if find_max => v > b,
            Some((_, b)) => v < b,
        };
        if better {
            best = Some((i, v));
        }
    }
    best.map(|(i, _)| i)
}

/// Coarse extremum of `values` over the part of `grid` snapped to
/// `[start, end]`. Returns the grid index.
pub fn locate(
    grid: &[f64],
    values: &[f64],
    start: f64,
    end: f64,
    find_max: bool,
) -> DeriveResult<usize> {
    if grid.is_empty() || grid.len() != values.len() {
        return Err(DeriveError::validation(
            "derivative",
            format!("grid has {} points but curve has {}", grid.len(), values.len()),
        ));
    }
    let range = snap_range(grid, start, end);
    if range.is_empty() {
        return Err(DeriveError::validation(
            "start/end",
            format!("search range [{start}, {end}] selects no grid points"),
        ));
    }
    let offset = range.start;
    arg_extremum(&values[range], find_max)
        .map(|i| offset + i)
        .ok_or_else(|| DeriveError::validation("derivative", "no finite values in search range"))
}

/// Vertex of the least-squares parabola through `values` around `centre`.
///
/// The neighbourhood is `[centre - half_width, centre + half_width]`,
/// snapped to the grid like [`locate`]. The vertex must land inside that
/// interval; anything else is reported as a fit failure.
pub fn refine(grid: &[f64], values: &[f64], centre: f64, half_width: f64) -> DeriveResult<f64> {
    let range = snap_range(grid, centre - half_width, centre + half_width);
    if range.len() < 3 {
        return Err(DeriveError::fit(format!(
            "neighbourhood of {centre} holds {} points, need at least 3",
            range.len()
        )));
    }

    // Local coordinates in [-1, 1], scaled by the reach of the selected
    // points rather than by `half_width`, which may far exceed the grid.
    let points = &grid[range.clone()];
    let reach = points.iter().fold(0.0_f64, |acc, &g| acc.max((g - centre).abs()));
    if reach == 0.0 || !reach.is_finite() {
        return Err(DeriveError::fit("neighbourhood has no spread in x"));
    }
    let local: Vec<f64> = points.iter().map(|&g| (g - centre) / reach).collect();
    let coeffs = polyfit(&local, &values[range], 2)
        .ok_or_else(|| DeriveError::fit("least-squares system is singular"))?;
    let (b, a) = (coeffs[1], coeffs[2]);

    if a == 0.0 || !a.is_finite() {
        return Err(DeriveError::fit("fitted parabola has no curvature"));
    }
    let vertex = centre - b / (2.0 * a) * reach;
    if !vertex.is_finite() || (vertex - centre).abs() > half_width {
        return Err(DeriveError::fit(format!(
            "vertex {vertex} lies outside the neighbourhood [{}, {}]",
            centre - half_width,
            centre + half_width
        )));
    }
    Ok(vertex)
}

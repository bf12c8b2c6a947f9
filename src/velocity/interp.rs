//! One-dimensional interpolation helpers shared by the velocity engine

use crate::error::{Result, VinError};

/// Piecewise-linear interpolation of `(xp, fp)` at `x`.
///
/// `xp` must be non-decreasing. Values left of `xp[0]` or right of the last
/// breakpoint are clamped to the end values. Returns NaN when `xp` is empty.
pub fn interp1d(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    let len = xp.len().min(fp.len());
    if len == 0 {
        return f64::NAN;
    }
    if x <= xp[0] {
        return fp[0];
    }
    if x >= xp[len - 1] {
        return fp[len - 1];
    }

    // last breakpoint not greater than x
    let k = xp[..len].partition_point(|&v| v <= x) - 1;
    let (x0, x1) = (xp[k], xp[k + 1]);
    let (f0, f1) = (fp[k], fp[k + 1]);
    let dx = x1 - x0;
    if dx <= 0.0 {
        return f1;
    }
    f0 + (x - x0) * (f1 - f0) / dx
}

/// Interpolate at every position of `xs`
pub fn interp_many(xs: &[f64], xp: &[f64], fp: &[f64]) -> Vec<f64> {
    xs.iter().map(|&x| interp1d(x, xp, fp)).collect()
}

/// `n` evenly spaced values from `start` to `stop`, both included
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            let mut values: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
            values[n - 1] = stop;
            values
        }
    }
}

/// Sorted union of several breakpoint sets with duplicates removed
pub fn merge_breakpoints(sets: &[&[f64]]) -> Vec<f64> {
    let mut all: Vec<f64> = sets.iter().flat_map(|s| s.iter().copied()).collect();
    all.sort_by(f64::total_cmp);
    all.dedup();
    all
}

/// Velocity inside a vertically trapezoidal block.
///
/// Corners are ordered top-left, top-right, bottom-left, bottom-right. The
/// left and right edges must be vertical (`x1 == x3`, `x2 == x4`). At each
/// query point the top and bottom edge depth and velocity are interpolated
/// along x, then the velocity is interpolated linearly in depth between them.
pub fn interp_block(
    x_corner: [f64; 4],
    y_corner: [f64; 4],
    v_corner: [f64; 4],
    xx: &[f64],
    yy: &[f64],
) -> Result<Vec<f64>> {
    let [x1, x2, x3, x4] = x_corner;
    let [y1, y2, y3, y4] = y_corner;
    let [v1, v2, v3, v4] = v_corner;
    if x1 != x3 || x2 != x4 {
        return Err(VinError::invariant(
            "block should be a trapezoid with vertical sides",
        ));
    }
    if xx.len() != yy.len() {
        return Err(VinError::invariant(format!(
            "query coordinates differ in length: {} x values, {} y values",
            xx.len(),
            yy.len()
        )));
    }

    let top = [x1, x2];
    let bottom = [x3, x4];
    let values = xx
        .iter()
        .zip(yy)
        .map(|(&x, &y)| {
            let y_top = interp1d(x, &top, &[y1, y2]);
            let v_top = interp1d(x, &top, &[v1, v2]);
            let y_bot = interp1d(x, &bottom, &[y3, y4]);
            let v_bot = interp1d(x, &bottom, &[v3, v4]);
            (v_bot - v_top) * (y - y_top) / (y_bot - y_top) + v_top
        })
        .collect();
    Ok(values)
}

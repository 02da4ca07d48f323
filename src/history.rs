//! NAV history projections for the fund detail chart.

use crate::fund::NavSample;

/// Number of most recent samples the detail chart shows.
pub const CHART_WINDOW: usize = 30;

/// The last [`CHART_WINDOW`] samples of `history`, oldest first. An absent
/// history is an empty series.
pub fn chart_series(history: Option<&[NavSample]>) -> Vec<NavSample> {
    let Some(history) = history else {
        return Vec::new();
    };
    let start = history.len().saturating_sub(CHART_WINDOW);
    history[start..].to_vec()
}

/// Series as `(x, nav)` points for plotting, x being the sample index.
pub fn chart_points(series: &[NavSample]) -> Vec<(f64, f64)> {
    series
        .iter()
        .enumerate()
        .map(|(i, sample)| (i as f64, sample.nav))
        .collect()
}

/// `(min, max)` of the series' NAVs, padded so a flat series still has a
/// visible range. `None` for an empty series.
pub fn nav_bounds(series: &[NavSample]) -> Option<(f64, f64)> {
    let first = series.first()?.nav;
    let (min, max) = series
        .iter()
        .fold((first, first), |(lo, hi), s| (lo.min(s.nav), hi.max(s.nav)));

    let pad = if max > min { (max - min) * 0.05 } else { 1.0 };
    Some(((min - pad).max(0.0), max + pad))
}

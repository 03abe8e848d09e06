//! Extrema detector: local peaks of highs and dips of lows.
//!
//! A bar is a candidate peak when its high is strictly above both neighbours;
//! the first and last bar never qualify. Candidates are then thinned so that
//! emitted peaks are at least `peak_type` bars apart: the most extreme
//! candidate wins, and equal-valued candidates inside the same window knock
//! each other out. Dips mirror this on lows.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Peak and dip values in bar order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtremaSet {
    pub peaks: Vec<f64>,
    pub dips: Vec<f64>,
}

impl ExtremaSet {
    /// Most recent peak, i.e. the nearest resistance.
    pub fn last_peak(&self) -> Option<f64> {
        self.peaks.last().copied()
    }

    /// Most recent dip, i.e. the nearest support.
    pub fn last_dip(&self) -> Option<f64> {
        self.dips.last().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty() && self.dips.is_empty()
    }
}

/// Detect peaks on `highs` and dips on `lows` with window radius `peak_type`.
///
/// `highs` and `lows` are parallel series; if their lengths differ only the
/// common prefix is scanned.
pub fn detect_extrema(highs: &[f64], lows: &[f64], peak_type: usize) -> ExtremaSet {
    let n = highs.len().min(lows.len());
    let highs = &highs[..n];
    let lows = &lows[..n];

    ExtremaSet {
        peaks: extrema_indices(highs, peak_type, Ordering::Greater)
            .into_iter()
            .map(|i| highs[i])
            .collect(),
        dips: extrema_indices(lows, peak_type, Ordering::Less)
            .into_iter()
            .map(|i| lows[i])
            .collect(),
    }
}

/// Indices of thinned extrema, ascending. `want` is `Greater` for peaks, `Less` for dips.
pub fn extrema_indices(values: &[f64], peak_type: usize, want: Ordering) -> Vec<usize> {
    let n = values.len();
    if n < 3 {
        return Vec::new();
    }

    let beats = |a: f64, b: f64| a.partial_cmp(&b) == Some(want);

    let mut is_candidate = vec![false; n];
    let mut candidates = Vec::new();
    for i in 1..n - 1 {
        let v = values[i];
        if v.is_finite() && beats(v, values[i - 1]) && beats(v, values[i + 1]) {
            is_candidate[i] = true;
            candidates.push(i);
        }
    }

    if peak_type <= 1 {
        return candidates;
    }

    // Most extreme first; stable sort keeps bar order among equal values.
    let mut by_priority = candidates.clone();
    by_priority.sort_by(|&a, &b| {
        let ord = values[b].partial_cmp(&values[a]).unwrap_or(Ordering::Equal);
        if want == Ordering::Less {
            ord.reverse()
        } else {
            ord
        }
    });

    let reach = peak_type - 1;
    let mut kept = vec![false; n];
    for &c in &by_priority {
        let lo = c.saturating_sub(reach);
        let hi = (c + reach).min(n - 1);

        let tied = (lo..=hi).any(|j| j != c && is_candidate[j] && values[j] == values[c]);
        if tied {
            continue;
        }
        let suppressed = (lo..=hi).any(|j| kept[j]);
        if suppressed {
            continue;
        }
        kept[c] = true;
    }

    (0..n).filter(|&i| kept[i]).collect()
}

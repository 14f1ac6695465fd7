//! Time spans on the shared timeline and the numeric helpers behind them

use core::fmt;
use serde::{Deserialize, Serialize};

/// Relative tolerance used when a requested resampling interval is compared
/// with a waveform's native interval.
pub const NATIVE_INTERVAL_TOLERANCE: f64 = 1e-9;

/// Relative tolerance for sample intervals in segment replacement.
pub const RATE_MATCH_TOLERANCE: f64 = 1e-4;

/// Closed time window `[begin, end]` in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSpan {
    pub begin: f64,
    pub end: f64,
}

impl TimeSpan {
    #[inline]
    pub const fn new(begin: f64, end: f64) -> Self {
        Self { begin, end }
    }

    /// Length of the window, zero when `end < begin`
    #[inline]
    pub fn duration(&self) -> f64 {
        (self.end - self.begin).max(0.0)
    }

    #[inline]
    pub fn contains(&self, time: f64) -> bool {
        time >= self.begin && time <= self.end
    }

    /// True when the window holds no time at all
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.end <= self.begin
    }

    /// Overlap of two windows, `None` if they are disjoint
    pub fn intersect(&self, other: &TimeSpan) -> Option<TimeSpan> {
        let span = TimeSpan::new(self.begin.max(other.begin), self.end.min(other.end));
        if span.end < span.begin {
            None
        } else {
            Some(span)
        }
    }

    /// Smallest window covering both
    pub fn union(&self, other: &TimeSpan) -> TimeSpan {
        TimeSpan::new(self.begin.min(other.begin), self.end.max(other.end))
    }
}

impl From<(f64, f64)> for TimeSpan {
    fn from((begin, end): (f64, f64)) -> Self {
        TimeSpan::new(begin, end)
    }
}

impl fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.3}s, {:.3}s]", self.begin, self.end)
    }
}

/// `|a - b| <= rel_tol * max(|a|, |b|)`
#[inline]
pub(crate) fn is_close(a: f64, b: f64, rel_tol: f64) -> bool {
    a == b || (a - b).abs() <= rel_tol * a.abs().max(b.abs())
}

/// Piecewise-linear interpolation of `x` over an ascending table.
///
/// Queries left of the table return the first value, queries right of it the
/// last one. `xp` must be non-empty and the same length as `fp`.
pub(crate) fn interpolate(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    let last = xp.len() - 1;
    if x <= xp[0] {
        return fp[0];
    }
    if x >= xp[last] {
        return fp[last];
    }
    // first index with xp[i] > x; 1..=last given the checks above
    let upper = xp.partition_point(|&p| p <= x);
    let lower = upper - 1;
    let width = xp[upper] - xp[lower];
    if width == 0.0 {
        return fp[lower];
    }
    let fraction = (x - xp[lower]) / width;
    fp[lower] + (fp[upper] - fp[lower]) * fraction
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_intersection() {
        let a = TimeSpan::new(0.0, 100.0);
        let b = TimeSpan::new(10.0, 90.0);
        assert_eq!(a.intersect(&b), Some(TimeSpan::new(10.0, 90.0)));
        assert_eq!(a.union(&b), a);

        let c = TimeSpan::new(200.0, 300.0);
        assert!(a.intersect(&c).is_none());
        assert_eq!(c.duration(), 100.0);
    }

    #[test]
    fn test_is_close() {
        assert!(is_close(0.001, 0.001 + 1e-12, NATIVE_INTERVAL_TOLERANCE));
        assert!(!is_close(0.001, 0.002, NATIVE_INTERVAL_TOLERANCE));
        assert!(is_close(0.01, 0.010_000_5, RATE_MATCH_TOLERANCE));
    }

    #[test]
    fn test_interpolate_clamps_and_blends() {
        let xp = [0.0, 1.0, 2.0];
        let fp = [0.0, 10.0, 30.0];
        assert_eq!(interpolate(-1.0, &xp, &fp), 0.0);
        assert_eq!(interpolate(5.0, &xp, &fp), 30.0);
        assert_eq!(interpolate(0.5, &xp, &fp), 5.0);
        assert_eq!(interpolate(1.5, &xp, &fp), 20.0);
        assert_eq!(interpolate(1.0, &xp, &fp), 10.0);
    }
}

//! IntervalParameter: a derived metric recorded per time window
//!
//! Parameters are produced by analysis procedures, e.g. heart rate computed
//! over consecutive ten second windows. Windows are kept sorted by their
//! begin time and may overlap; a query at a time covered by several windows
//! averages them.

use crate::error::{SigmanError, SigmanResult};
use serde::{Deserialize, Serialize};

/// Flat line segment of a parameter value clipped to a query window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClippedSegment {
    pub begin: f64,
    pub end: f64,
    pub value: f64,
}

impl ClippedSegment {
    /// `((begin, end), (value, value))`, the shape plotting code draws
    pub fn as_line(&self) -> ((f64, f64), (f64, f64)) {
        ((self.begin, self.end), (self.value, self.value))
    }
}

/// Values of one metric over (possibly overlapping) time windows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalParameter {
    begins: Vec<f64>,
    ends: Vec<f64>,
    values: Vec<f64>,
    kind: String,
}

impl IntervalParameter {
    pub fn new(kind: impl Into<String>) -> Self {
        IntervalParameter {
            begins: Vec::new(),
            ends: Vec::new(),
            values: Vec::new(),
            kind: kind.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.begins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.begins.is_empty()
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn begins(&self) -> &[f64] {
        &self.begins
    }

    pub fn ends(&self) -> &[f64] {
        &self.ends
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// (begin, end, value) triples in begin order
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64, f64)> + '_ {
        self.begins
            .iter()
            .zip(&self.ends)
            .zip(&self.values)
            .map(|((&b, &e), &v)| (b, e, v))
    }

    /// Record `value` for the window `[begin, end]`
    pub fn add(&mut self, begin: f64, end: f64, value: f64) -> SigmanResult<()> {
        if !begin.is_finite() || !end.is_finite() || end < begin {
            return Err(SigmanError::invalid(format!(
                "invalid parameter window [{}, {}]",
                begin, end
            )));
        }
        let index = self.begins.partition_point(|&b| b < begin);
        self.begins.insert(index, begin);
        self.ends.insert(index, end);
        self.values.insert(index, value);
        Ok(())
    }

    /// Indices of the windows with `begin <= time <= end`.
    ///
    /// The scan stops at the first window beginning after `time`; since
    /// windows are sorted by begin, no later window can contain it.
    pub fn containing(&self, time: f64) -> Vec<usize> {
        let mut indices = Vec::new();
        for (index, (begin, end, _)) in self.iter().enumerate() {
            if begin > time {
                break;
            }
            if time <= end {
                indices.push(index);
            }
        }
        indices
    }

    /// Mean value of all windows containing `time`
    pub fn value_at(&self, time: f64) -> Option<f64> {
        let indices = self.containing(time);
        if indices.is_empty() {
            return None;
        }
        let sum: f64 = indices.iter().map(|&i| self.values[i]).sum();
        Some(sum / indices.len() as f64)
    }

    /// Windows overlapping `[begin, end]`, clipped to it. An open bound
    /// leaves that side unclipped.
    pub fn clipped_segments(&self, begin: Option<f64>, end: Option<f64>) -> Vec<ClippedSegment> {
        let mut segments = Vec::new();
        for (window_begin, window_end, value) in self.iter() {
            if matches!(begin, Some(b) if window_end < b) {
                continue;
            }
            if matches!(end, Some(e) if window_begin > e) {
                break;
            }
            segments.push(ClippedSegment {
                begin: begin.map_or(window_begin, |b| b.max(window_begin)),
                end: end.map_or(window_end, |e| e.min(window_end)),
                value,
            });
        }
        segments
    }
}

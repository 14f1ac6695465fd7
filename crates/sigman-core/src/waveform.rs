//! Waveform: uniformly sampled scalar signal placed on the shared timeline
//!
//! A waveform may be shifted in time and need not start at zero. Every time
//! argument accepted here is absolute, i.e. the offset is applied before the
//! sample index is computed. External analysis code should read waveforms
//! through [`Waveform::value_at`] and [`Waveform::slice`].

use crate::error::{SigmanError, SigmanResult};
use crate::span::{interpolate, is_close, TimeSpan, NATIVE_INTERVAL_TOLERANCE, RATE_MATCH_TOLERANCE};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Most grid points a resampled slice may produce per native sample
const MAX_UPSAMPLING: f64 = 1e6;

/// Output resolution requested from [`Waveform::slice`]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Resolution {
    /// Samples exactly as recorded
    #[default]
    Native,
    /// Uniform grid with the given spacing in seconds
    Interval(f64),
    /// Uniform grid with this many points across the window
    Count(usize),
}

/// Uniformly sampled signal, e.g. one ECG lead or an arterial pressure trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waveform {
    values: Vec<f64>,
    sample_interval: f64,
    duration: f64,
    offset: f64,
    kind: String,
}

impl Waveform {
    /// Create a waveform from raw samples covering `duration` seconds.
    ///
    /// The sample interval is derived as `duration / values.len()`; the
    /// waveform starts at offset zero.
    pub fn new(values: Vec<f64>, duration: f64, kind: impl Into<String>) -> SigmanResult<Self> {
        if values.is_empty() {
            return Err(SigmanError::invalid("waveform needs at least one sample"));
        }
        if !duration.is_finite() || duration <= 0.0 {
            return Err(SigmanError::invalid(format!(
                "waveform duration must be positive, got {}",
                duration
            )));
        }

        Ok(Waveform {
            sample_interval: duration / values.len() as f64,
            values,
            duration,
            offset: 0.0,
            kind: kind.into(),
        })
    }

    /// Create a waveform from samples taken at `sample_rate` Hz
    pub fn from_rate(values: Vec<f64>, sample_rate: f64, kind: impl Into<String>) -> SigmanResult<Self> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(SigmanError::invalid(format!(
                "sample rate must be positive, got {}",
                sample_rate
            )));
        }
        let duration = values.len() as f64 / sample_rate;
        Self::new(values, duration, kind)
    }

    /// Builder-style offset assignment
    pub fn with_offset(mut self, offset: f64) -> SigmanResult<Self> {
        self.set_offset(offset)?;
        Ok(self)
    }

    /// Same samples under a different kind tag
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn sample_interval(&self) -> f64 {
        self.sample_interval
    }

    pub fn sample_rate(&self) -> f64 {
        1.0 / self.sample_interval
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Move the waveform along the shared timeline
    pub fn set_offset(&mut self, offset: f64) -> SigmanResult<()> {
        if !offset.is_finite() {
            return Err(SigmanError::invalid(format!("waveform offset must be finite, got {}", offset)));
        }
        self.offset = offset;
        Ok(())
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// `offset + duration`
    pub fn end_time(&self) -> f64 {
        self.offset + self.duration
    }

    /// Window the waveform claims on the shared timeline
    pub fn span(&self) -> TimeSpan {
        TimeSpan::new(self.offset, self.end_time())
    }

    /// Absolute time of the sample at `index`
    #[inline]
    pub fn time_at(&self, index: usize) -> f64 {
        self.offset + index as f64 * self.sample_interval
    }

    /// Index of the sample closest to `time`.
    ///
    /// Halfway positions round to the even index. A time that rounds to one
    /// past the last sample maps onto the last sample.
    pub fn nearest_index(&self, time: f64) -> SigmanResult<usize> {
        let len = self.values.len() as f64;
        let mut position = ((time - self.offset) / self.sample_interval).round_ties_even();
        if position == len {
            position -= 1.0;
        }
        // NaN fails both comparisons
        if !(position >= 0.0 && position < len) {
            return Err(self.out_of_range(time));
        }
        Ok(position as usize)
    }

    /// Linearly interpolated value at `time`.
    ///
    /// Valid from the first sample up to, but excluding, the last sample.
    pub fn value_at(&self, time: f64) -> SigmanResult<f64> {
        let position = (time - self.offset) / self.sample_interval;
        let lower = position.floor();
        // compare before casting, far-away times saturate the cast
        if !(lower >= 0.0 && lower + 1.0 < self.values.len() as f64) {
            return Err(self.out_of_range(time));
        }

        let index = lower as usize;
        let fraction = position - lower;
        let (left, right) = (self.values[index], self.values[index + 1]);
        Ok(left + (right - left) * fraction)
    }

    /// Values between `begin` and `end` at the requested resolution.
    ///
    /// At the native rate this is a plain copy of
    /// `values[nearest_index(begin)..nearest_index(end)]` so no interpolation
    /// error is introduced. Any other rate interpolates the native samples
    /// onto the grid `begin, begin + interval, ...` stopping before `end`.
    pub fn slice(&self, begin: f64, end: f64, resolution: Resolution) -> SigmanResult<Vec<f64>> {
        let begin_index = self.nearest_index(begin)?;
        let end_index = self.nearest_index(end)?;

        let (interval, count) = match resolution {
            Resolution::Native => (0.0, None),
            Resolution::Interval(interval) => (interval, None),
            Resolution::Count(0) => {
                return Err(SigmanError::invalid("resampled slice needs a positive point count"));
            }
            Resolution::Count(count) => ((end - begin) / count as f64, Some(count)),
        };

        if interval == 0.0 || is_close(interval, self.sample_interval, NATIVE_INTERVAL_TOLERANCE) {
            return Ok(self.raw_range(begin_index, end_index).to_vec());
        }
        if !interval.is_finite() || interval < 0.0 {
            return Err(SigmanError::invalid(format!(
                "resampling interval must be positive, got {}",
                interval
            )));
        }

        let count = match count {
            Some(count) => count as f64,
            None => ((end - begin) / interval).ceil().max(0.0),
        };
        let limit = (end_index.abs_diff(begin_index) + 1) as f64 * MAX_UPSAMPLING;
        if !(count <= limit) {
            return Err(SigmanError::invalid(format!(
                "resampled slice of {} points exceeds the limit of {} for this window",
                count, limit
            )));
        }
        let count = count as usize;

        // widen to the samples around `begin` and `end` so every grid point is bracketed
        let last = self.values.len() - 1;
        let first_index = ((begin - self.offset) / self.sample_interval).floor().max(0.0) as usize;
        let last_index = ((end - self.offset) / self.sample_interval).ceil().min(last as f64) as usize;
        let (times, values) = self.sample_table(first_index.min(begin_index), last_index.max(end_index));

        Ok((0..count)
            .map(|k| interpolate(begin + k as f64 * interval, &times, &values))
            .collect())
    }

    /// Overwrite the samples between `begin` and `end` with the leading
    /// samples of `source`, e.g. a filtered copy of the same range.
    ///
    /// Nothing is written unless every check passes.
    pub fn replace_segment(&mut self, begin: f64, end: f64, source: &Waveform) -> SigmanResult<()> {
        if !is_close(self.sample_interval, source.sample_interval, RATE_MATCH_TOLERANCE) {
            return Err(SigmanError::IncompatibleRate {
                expected: self.sample_interval,
                found: source.sample_interval,
            });
        }
        let required = end - begin;
        // durations derived from sample counts differ from span arithmetic by rounding
        if required > source.duration && !is_close(required, source.duration, RATE_MATCH_TOLERANCE) {
            return Err(SigmanError::InsufficientLength {
                required,
                available: source.duration,
            });
        }

        let begin_index = self.nearest_index(begin)?;
        let end_index = self.nearest_index(end)?;
        let count = end_index.saturating_sub(begin_index);
        if count > source.len() {
            return Err(SigmanError::InsufficientLength {
                required,
                available: source.duration,
            });
        }

        self.values[begin_index..begin_index + count].copy_from_slice(&source.values[..count]);
        debug!(kind = %self.kind, begin, end, samples = count, "replaced waveform segment");
        Ok(())
    }

    /// Explicit (time, value) pairs for the native samples between `begin`
    /// and `end`, with the time axis starting at `origin` (default `begin`).
    pub fn coordinates(
        &self,
        begin: f64,
        end: f64,
        origin: Option<f64>,
    ) -> SigmanResult<(Vec<f64>, Vec<f64>)> {
        let values = self.slice(begin, end, Resolution::Native)?;
        let origin = origin.unwrap_or(begin);
        let times = (0..values.len())
            .map(|i| origin + i as f64 * self.sample_interval)
            .collect();
        Ok((times, values))
    }

    fn raw_range(&self, begin_index: usize, end_index: usize) -> &[f64] {
        if begin_index >= end_index {
            &[]
        } else {
            &self.values[begin_index..end_index]
        }
    }

    /// Native samples from `begin_index` through `end_index` inclusive with
    /// their absolute times, so that grid points near `end` stay bracketed.
    fn sample_table(&self, begin_index: usize, end_index: usize) -> (Vec<f64>, Vec<f64>) {
        let last = end_index.max(begin_index);
        let times = (begin_index..=last).map(|i| self.time_at(i)).collect();
        let values = self.values[begin_index..=last].to_vec();
        (times, values)
    }

    fn out_of_range(&self, time: f64) -> SigmanError {
        SigmanError::OutOfRange {
            time,
            begin: self.offset,
            end: self.time_at(self.values.len() - 1),
        }
    }
}

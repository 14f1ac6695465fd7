//! EventPointSet: sparse, time-sorted markers of one kind (e.g. R peaks)
//!
//! Points live in two parallel vectors kept sorted ascending by time after
//! every mutation. Equal times are allowed; their relative order is not
//! guaranteed.

use crate::error::{SigmanError, SigmanResult};
use crate::waveform::Waveform;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use tracing::debug;

/// Sorted set of (time, value) event markers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPointSet {
    times: Vec<f64>,
    values: Vec<f64>,
    kind: String,
}

impl EventPointSet {
    /// Build a point set from unsorted coordinates
    pub fn new(times: Vec<f64>, values: Vec<f64>, kind: impl Into<String>) -> SigmanResult<Self> {
        if times.len() != values.len() {
            return Err(SigmanError::invalid(format!(
                "{} times but {} values",
                times.len(),
                values.len()
            )));
        }
        if let Some(bad) = times.iter().find(|t| !t.is_finite()) {
            return Err(SigmanError::invalid(format!("point time {} is not finite", bad)));
        }

        let mut pairs: Vec<(f64, f64)> = times.into_iter().zip(values).collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
        let (times, values) = pairs.into_iter().unzip();

        Ok(EventPointSet {
            times,
            values,
            kind: kind.into(),
        })
    }

    pub fn new_empty(kind: impl Into<String>) -> Self {
        EventPointSet {
            times: Vec::new(),
            values: Vec::new(),
            kind: kind.into(),
        }
    }

    /// Same points under a different kind tag
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn first_time(&self) -> Option<f64> {
        self.times.first().copied()
    }

    pub fn last_time(&self) -> Option<f64> {
        self.times.last().copied()
    }

    /// (time, value) pairs in time order
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.times.iter().copied().zip(self.values.iter().copied())
    }

    /// Index range of the points with `begin <= time < end`, `None` if empty
    pub fn index_range(&self, begin: f64, end: f64) -> Option<Range<usize>> {
        let start = self.lower_bound(begin);
        let stop = self.lower_bound(end);
        if start < stop {
            Some(start..stop)
        } else {
            None
        }
    }

    /// Coordinates of the points in `[begin, end)`.
    ///
    /// `left_extension` additionally includes up to that many points just
    /// before `begin`, which detectors use to see the previous event.
    pub fn slice(&self, begin: f64, end: f64, left_extension: usize) -> Option<(&[f64], &[f64])> {
        let range = self.index_range(begin, end)?;
        let start = range.start.saturating_sub(left_extension);
        Some((&self.times[start..range.end], &self.values[start..range.end]))
    }

    /// Remove every point in `[begin, end)` and return the index where they
    /// were, usable as an insertion anchor.
    pub fn delete_range(&mut self, begin: f64, end: f64) -> SigmanResult<usize> {
        let range = self
            .index_range(begin, end)
            .ok_or(SigmanError::NoPointsInRange { begin, end })?;
        let start = range.start;
        let removed = range.len();
        self.times.drain(range.clone());
        self.values.drain(range);
        debug!(kind = %self.kind, begin, end, removed, "deleted point range");
        Ok(start)
    }

    /// Replace the points in `[begin, end)` with those of `source`.
    ///
    /// Source times are local to the window: a point at local time `t` lands
    /// at `begin + t`, and only points with `t < end - begin` are taken. A
    /// window with no existing points is filled without error.
    pub fn replace_range(&mut self, begin: f64, end: f64, source: &EventPointSet) -> SigmanResult<()> {
        finite(begin)?;
        finite(end)?;
        if let Some(range) = self.index_range(begin, end) {
            self.times.drain(range.clone());
            self.values.drain(range);
        }

        let span = end - begin;
        let mut inserted = 0usize;
        for (time, value) in source.iter().take_while(|(t, _)| *t < span) {
            self.insert_sorted(time + begin, value);
            inserted += 1;
        }
        debug!(kind = %self.kind, begin, end, inserted, "replaced point range");
        Ok(())
    }

    /// Insert a point at its sorted position
    pub fn insert(&mut self, time: f64, value: f64) -> SigmanResult<()> {
        finite(time)?;
        self.insert_sorted(time, value);
        Ok(())
    }

    /// Insert every point of `other`, each moved by `time_shift`.
    ///
    /// Nothing is inserted if any shifted time is not finite.
    pub fn insert_all(&mut self, other: &EventPointSet, time_shift: f64) -> SigmanResult<()> {
        finite(time_shift)?;
        for &time in &other.times {
            finite(time + time_shift)?;
        }

        self.times.reserve(other.len());
        self.values.reserve(other.len());
        for (time, value) in other.iter() {
            self.insert_sorted(time + time_shift, value);
        }
        Ok(())
    }

    /// Remove and return the point closest to `time`.
    ///
    /// With a `value`, closeness is squared distance in the (time, value)
    /// plane; without one only the time distance counts. The lowest index
    /// wins a tie.
    pub fn remove_nearest(&mut self, time: f64, value: Option<f64>) -> SigmanResult<(f64, f64)> {
        let distance = |i: usize| match value {
            Some(value) => {
                let dt = self.times[i] - time;
                let dv = self.values[i] - value;
                dt * dt + dv * dv
            }
            None => (self.times[i] - time).abs(),
        };

        let mut closest: Option<(usize, f64)> = None;
        for i in 0..self.times.len() {
            let d = distance(i);
            match closest {
                Some((_, best)) if d >= best => {}
                _ => closest = Some((i, d)),
            }
        }

        let (index, _) = closest.ok_or_else(|| SigmanError::EmptyPointSet {
            kind: self.kind.clone(),
        })?;
        Ok((self.times.remove(index), self.values.remove(index)))
    }

    /// Set every point's value to the waveform's value at the point's time.
    ///
    /// Fails without modifying anything if a point lies outside the wave.
    pub fn realign_to(&mut self, wave: &Waveform) -> SigmanResult<()> {
        let realigned = self
            .times
            .iter()
            .map(|&t| wave.value_at(t))
            .collect::<SigmanResult<Vec<f64>>>()?;
        self.values = realigned;
        debug!(kind = %self.kind, wave = %wave.kind(), points = self.len(), "realigned points");
        Ok(())
    }

    /// Move every point by `delta` seconds; nothing moves if any result
    /// would not be finite
    pub fn shift(&mut self, delta: f64) -> SigmanResult<()> {
        finite(delta)?;
        for &time in &self.times {
            finite(time + delta)?;
        }
        for time in &mut self.times {
            *time += delta;
        }
        Ok(())
    }

    fn insert_sorted(&mut self, time: f64, value: f64) {
        let index = self.lower_bound(time);
        self.times.insert(index, time);
        self.values.insert(index, value);
    }

    /// First index whose time is not less than `time`
    fn lower_bound(&self, time: f64) -> usize {
        self.times.partition_point(|&t| t < time)
    }
}

fn finite(time: f64) -> SigmanResult<()> {
    if time.is_finite() {
        Ok(())
    } else {
        Err(SigmanError::invalid(format!("point time {} is not finite", time)))
    }
}

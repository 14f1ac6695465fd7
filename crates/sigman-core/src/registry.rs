//! SignalRegistry: named waveforms, point sets and parameters on one timeline
//!
//! The registry exclusively owns everything it holds. Analysis procedures
//! ask it for the common range of the waveforms they need, read through the
//! typed accessors and hand their results back via
//! [`SignalRegistry::add_points`] or [`SignalRegistry::add_parameter`].

use crate::error::{Collection, SigmanError, SigmanResult};
use crate::parameter::IntervalParameter;
use crate::points::EventPointSet;
use crate::span::TimeSpan;
use crate::waveform::Waveform;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Owner of all signals taking part in one analysis session
#[derive(Debug, Clone, Default)]
pub struct SignalRegistry {
    waves: HashMap<String, Waveform>,
    points: HashMap<String, EventPointSet>,
    parameters: HashMap<String, IntervalParameter>,
}

impl SignalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-filled with already labelled entities
    pub fn with_entities(
        waves: HashMap<String, Waveform>,
        points: HashMap<String, EventPointSet>,
        parameters: HashMap<String, IntervalParameter>,
    ) -> Self {
        SignalRegistry {
            waves,
            points,
            parameters,
        }
    }

    /// True when the registry holds nothing at all
    pub fn is_empty(&self) -> bool {
        self.waves.is_empty() && self.points.is_empty() && self.parameters.is_empty()
    }

    /// Add a waveform under `label`, defaulting to the wave's kind.
    ///
    /// An existing wave with the same label is only discarded when
    /// `allow_replace` is set.
    pub fn add_wave(
        &mut self,
        wave: Waveform,
        label: Option<&str>,
        allow_replace: bool,
    ) -> SigmanResult<()> {
        let label = resolve_label(label, wave.kind())?;
        if self.waves.contains_key(&label) {
            if !allow_replace {
                return Err(SigmanError::DuplicateLabel {
                    collection: Collection::Waves,
                    label,
                });
            }
            warn!(label = %label, "replacing existing wave");
        }
        debug!(label = %label, samples = wave.len(), span = %wave.span(), "adding wave");
        self.waves.insert(label, wave);
        Ok(())
    }

    /// Add a point set under `label`, defaulting to its kind.
    ///
    /// With `merge` set, points for an existing label are inserted into the
    /// stored set instead of failing.
    pub fn add_points(
        &mut self,
        points: EventPointSet,
        label: Option<&str>,
        merge: bool,
    ) -> SigmanResult<()> {
        let label = resolve_label(label, points.kind())?;
        match self.points.get_mut(&label) {
            Some(existing) if merge => {
                debug!(label = %label, incoming = points.len(), "merging points");
                existing.insert_all(&points, 0.0)?;
            }
            Some(_) => {
                return Err(SigmanError::DuplicateLabel {
                    collection: Collection::Points,
                    label,
                });
            }
            None => {
                debug!(label = %label, count = points.len(), "adding points");
                self.points.insert(label, points);
            }
        }
        Ok(())
    }

    /// Add a parameter under `label`, defaulting to its kind
    pub fn add_parameter(
        &mut self,
        parameter: IntervalParameter,
        label: Option<&str>,
        allow_replace: bool,
    ) -> SigmanResult<()> {
        let label = resolve_label(label, parameter.kind())?;
        if self.parameters.contains_key(&label) {
            if !allow_replace {
                return Err(SigmanError::DuplicateLabel {
                    collection: Collection::Parameters,
                    label,
                });
            }
            warn!(label = %label, "replacing existing parameter");
        }
        debug!(label = %label, windows = parameter.len(), "adding parameter");
        self.parameters.insert(label, parameter);
        Ok(())
    }

    pub fn remove_wave(&mut self, label: &str) -> SigmanResult<Waveform> {
        self.waves
            .remove(label)
            .ok_or_else(|| not_found(Collection::Waves, label))
    }

    pub fn remove_points(&mut self, label: &str) -> SigmanResult<EventPointSet> {
        self.points
            .remove(label)
            .ok_or_else(|| not_found(Collection::Points, label))
    }

    pub fn remove_parameter(&mut self, label: &str) -> SigmanResult<IntervalParameter> {
        self.parameters
            .remove(label)
            .ok_or_else(|| not_found(Collection::Parameters, label))
    }

    pub fn wave(&self, label: &str) -> Option<&Waveform> {
        self.waves.get(label)
    }

    pub fn wave_mut(&mut self, label: &str) -> Option<&mut Waveform> {
        self.waves.get_mut(label)
    }

    pub fn points(&self, label: &str) -> Option<&EventPointSet> {
        self.points.get(label)
    }

    pub fn points_mut(&mut self, label: &str) -> Option<&mut EventPointSet> {
        self.points.get_mut(label)
    }

    pub fn parameter(&self, label: &str) -> Option<&IntervalParameter> {
        self.parameters.get(label)
    }

    pub fn parameter_mut(&mut self, label: &str) -> Option<&mut IntervalParameter> {
        self.parameters.get_mut(label)
    }

    /// Wave labels in sorted order
    pub fn wave_labels(&self) -> Vec<&str> {
        sorted_keys(&self.waves)
    }

    pub fn point_labels(&self) -> Vec<&str> {
        sorted_keys(&self.points)
    }

    pub fn parameter_labels(&self) -> Vec<&str> {
        sorted_keys(&self.parameters)
    }

    /// Window covering every wave and every non-empty point set.
    ///
    /// Returns `None` when nothing contributes, i.e. there are no waves and
    /// every point set is empty. Parameters do not contribute.
    pub fn overall_span(&self) -> Option<TimeSpan> {
        let wave_spans = self.waves.values().map(Waveform::span);
        let point_spans = self
            .points
            .values()
            .filter_map(|p| Some(TimeSpan::new(p.first_time()?, p.last_time()?)));

        wave_spans.chain(point_spans).reduce(|a, b| a.union(&b))
    }

    /// Window in which every wave in `labels` has data: the latest offset to
    /// the earliest end.
    ///
    /// `Ok(None)` when `labels` is empty or the waves do not overlap.
    pub fn common_range<S: AsRef<str>>(&self, labels: &[S]) -> SigmanResult<Option<TimeSpan>> {
        let mut common: Option<TimeSpan> = None;
        for label in labels {
            let label = label.as_ref();
            let wave = self
                .waves
                .get(label)
                .ok_or_else(|| not_found(Collection::Waves, label))?;
            let span = wave.span();
            common = Some(match common {
                None => span,
                Some(c) => TimeSpan::new(c.begin.max(span.begin), c.end.min(span.end)),
            });
        }
        Ok(common.filter(|c| c.begin <= c.end))
    }
}

fn resolve_label(label: Option<&str>, kind: &str) -> SigmanResult<String> {
    let label = label.unwrap_or(kind);
    if label.is_empty() {
        return Err(SigmanError::invalid("registry labels cannot be empty"));
    }
    Ok(label.to_string())
}

fn not_found(collection: Collection, label: &str) -> SigmanError {
    SigmanError::NotFound {
        collection,
        label: label.to_string(),
    }
}

fn sorted_keys<V>(map: &HashMap<String, V>) -> Vec<&str> {
    let mut keys: Vec<&str> = map.keys().map(String::as_str).collect();
    keys.sort_unstable();
    keys
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wave(kind: &str, offset: f64, duration: f64) -> Waveform {
        Waveform::new(vec![0.0; 100], duration, kind)
            .unwrap()
            .with_offset(offset)
            .unwrap()
    }

    #[test]
    fn test_common_range() {
        let mut registry = SignalRegistry::new();
        registry.add_wave(wave("a", 0.0, 100.0), None, false).unwrap();
        registry.add_wave(wave("b", 10.0, 80.0), None, false).unwrap();

        assert_eq!(
            registry.common_range(&["a", "b"]).unwrap(),
            Some(TimeSpan::new(10.0, 90.0))
        );
        assert_eq!(
            registry.common_range(&["a"]).unwrap(),
            Some(TimeSpan::new(0.0, 100.0))
        );
        assert_eq!(registry.common_range::<&str>(&[]).unwrap(), None);

        let err = registry.common_range(&["a", "bp"]).unwrap_err();
        assert!(matches!(err, SigmanError::NotFound { collection: Collection::Waves, .. }));
    }

    #[test]
    fn test_common_range_disjoint() {
        let mut registry = SignalRegistry::new();
        registry.add_wave(wave("a", 0.0, 10.0), None, false).unwrap();
        registry.add_wave(wave("b", 20.0, 10.0), None, false).unwrap();
        assert_eq!(registry.common_range(&["a", "b"]).unwrap(), None);
    }

    #[test]
    fn test_overall_span() {
        let mut registry = SignalRegistry::new();
        assert_eq!(registry.overall_span(), None);

        registry.add_wave(wave("ecg", -5.0, 50.0), None, false).unwrap();
        let r = EventPointSet::new(vec![40.0, 2.0], vec![1.0, 1.0], "r").unwrap();
        registry.add_points(r, None, false).unwrap();
        assert_eq!(registry.overall_span(), Some(TimeSpan::new(-5.0, 45.0)));

        // points past the end of every wave extend the span
        let late = EventPointSet::new(vec![48.0], vec![1.0], "sbp").unwrap();
        registry.add_points(late, None, false).unwrap();
        assert_eq!(registry.overall_span(), Some(TimeSpan::new(-5.0, 48.0)));
    }

    #[test]
    fn test_overall_span_single_kind() {
        let mut registry = SignalRegistry::new();
        registry.add_points(EventPointSet::new_empty("r"), None, false).unwrap();
        assert_eq!(registry.overall_span(), None);

        let sbp = EventPointSet::new(vec![3.0, 7.0], vec![120.0, 118.0], "sbp").unwrap();
        registry.add_points(sbp, None, false).unwrap();
        assert_eq!(registry.overall_span(), Some(TimeSpan::new(3.0, 7.0)));
    }

    #[test]
    fn test_duplicate_wave_label() {
        let mut registry = SignalRegistry::new();
        registry.add_wave(wave("ecg", 0.0, 10.0), None, false).unwrap();

        let err = registry.add_wave(wave("ecg", 5.0, 10.0), None, false).unwrap_err();
        assert!(matches!(err, SigmanError::DuplicateLabel { .. }));
        assert_eq!(registry.wave("ecg").unwrap().offset(), 0.0);

        registry.add_wave(wave("ecg", 5.0, 10.0), None, true).unwrap();
        assert_eq!(registry.wave("ecg").unwrap().offset(), 5.0);
        assert_eq!(registry.wave_labels(), vec!["ecg"]);
    }

    #[test]
    fn test_explicit_labels() {
        let mut registry = SignalRegistry::new();
        registry.add_wave(wave("ecg", 0.0, 10.0), Some("ecg_raw"), false).unwrap();
        registry.add_wave(wave("ecg", 0.0, 10.0), None, false).unwrap();
        assert_eq!(registry.wave_labels(), vec!["ecg", "ecg_raw"]);

        assert!(registry.add_wave(wave("", 0.0, 10.0), None, false).is_err());
        assert!(registry.add_wave(wave("ecg", 0.0, 10.0), Some(""), true).is_err());
    }

    #[test]
    fn test_points_merge() {
        let mut registry = SignalRegistry::new();
        let first = EventPointSet::new(vec![1.0, 3.0], vec![0.0, 0.0], "r").unwrap();
        let second = EventPointSet::new(vec![2.0], vec![0.0], "r").unwrap();
        registry.add_points(first, None, false).unwrap();

        let err = registry.add_points(second.clone(), None, false).unwrap_err();
        assert!(matches!(err, SigmanError::DuplicateLabel { collection: Collection::Points, .. }));

        registry.add_points(second, None, true).unwrap();
        assert_eq!(registry.points("r").unwrap().times(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_parameters_and_removal() {
        let mut registry = SignalRegistry::new();
        let mut hr = IntervalParameter::new("hr");
        hr.add(0.0, 10.0, 72.0).unwrap();
        registry.add_parameter(hr.clone(), None, false).unwrap();
        assert!(registry.add_parameter(hr.clone(), None, false).is_err());
        registry.add_parameter(hr, None, true).unwrap();

        assert_eq!(registry.parameter("hr").unwrap().value_at(5.0), Some(72.0));
        assert_eq!(registry.remove_parameter("hr").unwrap().len(), 1);
        assert!(registry.remove_parameter("hr").unwrap_err().is_not_found());
        assert!(registry.remove_wave("ecg").unwrap_err().is_not_found());
        assert!(registry.remove_points("r").unwrap_err().is_not_found());
        assert!(registry.is_empty());
    }
}

//! Driving procedures over a registry
//!
//! Every entry point validates the configuration first and confines the
//! requested span to the common range of the procedure's required waves,
//! so a procedure never reads outside the data it declared.

use crate::error::{AnalysisError, AnalysisResult};
use crate::procedure::{Procedure, ProcedureConfig, ProcedureInputs, ProcedureKind, ProcedureOutput};
use sigman_core::{Collection, EventPointSet, IntervalParameter, SignalRegistry, TimeSpan, Waveform};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Span a procedure may run over: `requested` clipped to the common range of
/// its required waves.
pub fn analysis_range(
    registry: &SignalRegistry,
    procedure: &dyn Procedure,
    requested: TimeSpan,
) -> AnalysisResult<TimeSpan> {
    let required = procedure.required_waves();
    let confined = if required.is_empty() {
        Some(requested)
    } else {
        let common = registry
            .common_range(required)?
            .ok_or_else(|| AnalysisError::NoCommonRange {
                labels: required.iter().map(|label| label.to_string()).collect(),
            })?;
        requested.intersect(&common)
    };

    confined.filter(|span| !span.is_empty()).ok_or_else(|| AnalysisError::InsufficientData {
        span: requested,
        reason: format!("outside the data available to '{}'", procedure.name()),
    })
}

/// Run a detection procedure over `span` and return its points labeled
/// `kind`, or the procedure's output label when `kind` is `None`.
pub fn find_points(
    registry: &SignalRegistry,
    procedure: &dyn Procedure,
    span: TimeSpan,
    config: &ProcedureConfig,
    kind: Option<&str>,
) -> AnalysisResult<EventPointSet> {
    let inputs = prepare(registry, procedure, ProcedureKind::Points, config)?;
    let span = analysis_range(registry, procedure, span)?;

    match run(procedure, &inputs, span, config)? {
        ProcedureOutput::Points(points) => {
            let kind = kind.unwrap_or_else(|| procedure.output_label());
            info!(procedure = procedure.name(), %span, found = points.len(), "found points");
            Ok(points.with_kind(kind))
        }
        other => Err(unexpected(procedure, ProcedureKind::Points, &other)),
    }
}

/// Evaluate a metric procedure on each window.
///
/// Windows are confined like any other span and recorded with their
/// confined bounds. Windows without enough data are skipped; any other
/// failure aborts the whole calculation.
pub fn calculate_parameter(
    registry: &SignalRegistry,
    procedure: &dyn Procedure,
    windows: &[TimeSpan],
    config: &ProcedureConfig,
    kind: Option<&str>,
) -> AnalysisResult<IntervalParameter> {
    let inputs = prepare(registry, procedure, ProcedureKind::Parameter, config)?;
    let mut parameter = IntervalParameter::new(kind.unwrap_or_else(|| procedure.output_label()));

    for &window in windows {
        let outcome = analysis_range(registry, procedure, window)
            .and_then(|span| Ok((span, run(procedure, &inputs, span, config)?)));
        match outcome {
            Ok((span, ProcedureOutput::Scalar(value))) => {
                parameter.add(span.begin, span.end, value)?;
            }
            Ok((_, other)) => return Err(unexpected(procedure, ProcedureKind::Parameter, &other)),
            Err(AnalysisError::InsufficientData { span, reason }) => {
                warn!(procedure = procedure.name(), %span, %reason, "skipped window");
            }
            Err(error) => return Err(error),
        }
    }

    info!(
        procedure = procedure.name(),
        windows = windows.len(),
        values = parameter.len(),
        "calculated parameter"
    );
    Ok(parameter)
}

/// Run a filter procedure over `span` and return the filtered segment,
/// ready for [`Waveform::replace_segment`].
pub fn filter_wave(
    registry: &SignalRegistry,
    procedure: &dyn Procedure,
    span: TimeSpan,
    config: &ProcedureConfig,
) -> AnalysisResult<Waveform> {
    let inputs = prepare(registry, procedure, ProcedureKind::Filter, config)?;
    let span = analysis_range(registry, procedure, span)?;

    match run(procedure, &inputs, span, config)? {
        ProcedureOutput::Wave(wave) => Ok(wave),
        other => Err(unexpected(procedure, ProcedureKind::Filter, &other)),
    }
}

/// Filter `span` and write the result back into the registry wave `label`
/// (default: the procedure's output label). Returns the span written.
pub fn apply_filter(
    registry: &mut SignalRegistry,
    procedure: &dyn Procedure,
    span: TimeSpan,
    config: &ProcedureConfig,
    label: Option<&str>,
) -> AnalysisResult<TimeSpan> {
    let span = analysis_range(registry, procedure, span)?;
    let filtered = filter_wave(registry, procedure, span, config)?;

    let label = label.unwrap_or_else(|| procedure.output_label());
    let target = registry
        .wave_mut(label)
        .ok_or_else(|| AnalysisError::MissingInput {
            procedure: procedure.name().to_string(),
            collection: Collection::Waves,
            label: label.to_string(),
        })?;
    target.replace_segment(span.begin, span.end, &filtered)?;
    info!(procedure = procedure.name(), wave = label, %span, "applied filter");
    Ok(span)
}

/// Consecutive windows of `length` seconds starting every `step` seconds,
/// all lying inside `span`.
pub fn parameter_windows(span: TimeSpan, length: f64, step: f64) -> AnalysisResult<Vec<TimeSpan>> {
    if !(length.is_finite() && length > 0.0 && step.is_finite() && step > 0.0) {
        return Err(AnalysisError::Configuration {
            message: format!("window length and step must be positive, got {} and {}", length, step),
        });
    }
    if !(span.begin.is_finite() && span.end.is_finite()) {
        return Err(AnalysisError::Configuration {
            message: format!("parameter windows need a finite span, got {}", span),
        });
    }

    let mut windows = Vec::new();
    let mut index = 0usize;
    loop {
        // multiply instead of accumulating so long recordings do not drift
        let begin = span.begin + index as f64 * step;
        let end = begin + length;
        if end > span.end + 1e-9 * length {
            break;
        }
        windows.push(TimeSpan::new(begin, end.min(span.end)));
        index += 1;
    }
    Ok(windows)
}

fn prepare<'a>(
    registry: &'a SignalRegistry,
    procedure: &dyn Procedure,
    expected: ProcedureKind,
    config: &ProcedureConfig,
) -> AnalysisResult<ProcedureInputs<'a>> {
    if procedure.kind() != expected {
        return Err(AnalysisError::UnexpectedOutput {
            procedure: procedure.name().to_string(),
            expected,
            found: procedure.kind(),
        });
    }
    if config.procedure != procedure.name() {
        return Err(AnalysisError::invalid_config(
            procedure.name(),
            format!("configuration belongs to '{}'", config.procedure),
        ));
    }

    let inputs = ProcedureInputs::gather(registry, procedure)?;
    procedure.validate(&inputs, config)?;
    Ok(inputs)
}

fn run(
    procedure: &dyn Procedure,
    inputs: &ProcedureInputs<'_>,
    span: TimeSpan,
    config: &ProcedureConfig,
) -> AnalysisResult<ProcedureOutput> {
    let start = Instant::now();
    let output = procedure.execute(inputs, span, config)?;
    debug!(
        procedure = procedure.name(),
        %span,
        elapsed_us = start.elapsed().as_micros() as u64,
        "executed procedure"
    );
    Ok(output)
}

fn unexpected(procedure: &dyn Procedure, expected: ProcedureKind, output: &ProcedureOutput) -> AnalysisError {
    AnalysisError::UnexpectedOutput {
        procedure: procedure.name().to_string(),
        expected,
        found: output.kind(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::procedures::{HeartRate, MovingAverage, RPeakDetector};

    fn registry() -> SignalRegistry {
        let mut registry = SignalRegistry::new();
        let ecg = Waveform::new(vec![0.0; 1000], 10.0, "ecg").unwrap();
        let bp = Waveform::new(vec![100.0; 1000], 10.0, "bp")
            .unwrap()
            .with_offset(2.0)
            .unwrap();
        registry.add_wave(ecg, None, false).unwrap();
        registry.add_wave(bp, None, false).unwrap();
        let times: Vec<f64> = (0..12).map(|i| 0.5 + i as f64 * 0.8).collect();
        let r = EventPointSet::new(times, vec![1.0; 12], "r").unwrap();
        registry.add_points(r, None, false).unwrap();
        registry
    }

    #[test]
    fn test_analysis_range_confines_to_required_waves() {
        let registry = registry();
        let span = analysis_range(&registry, &RPeakDetector, TimeSpan::new(-5.0, 4.0)).unwrap();
        assert_eq!(span, TimeSpan::new(0.0, 4.0));

        // no required waves: the request passes through
        let span = analysis_range(&registry, &HeartRate, TimeSpan::new(-5.0, 4.0)).unwrap();
        assert_eq!(span, TimeSpan::new(-5.0, 4.0));

        assert!(matches!(
            analysis_range(&registry, &RPeakDetector, TimeSpan::new(20.0, 30.0)),
            Err(AnalysisError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_parameter_windows() {
        let windows = parameter_windows(TimeSpan::new(0.0, 30.0), 10.0, 5.0).unwrap();
        assert_eq!(windows.len(), 5);
        assert_eq!(windows[0], TimeSpan::new(0.0, 10.0));
        assert_eq!(windows[4], TimeSpan::new(20.0, 30.0));

        assert!(parameter_windows(TimeSpan::new(0.0, 5.0), 10.0, 10.0).unwrap().is_empty());
        assert!(parameter_windows(TimeSpan::new(0.0, 5.0), 0.0, 1.0).is_err());
    }

    #[test]
    fn test_parameter_windows_need_finite_span() {
        for span in [
            TimeSpan::new(0.0, f64::INFINITY),
            TimeSpan::new(f64::NEG_INFINITY, 10.0),
            TimeSpan::new(f64::NAN, 10.0),
        ] {
            let result = parameter_windows(span, 10.0, 5.0);
            assert!(matches!(result, Err(AnalysisError::Configuration { .. })));
        }
    }

    #[test]
    fn test_calculate_parameter_skips_sparse_windows() {
        let registry = registry();
        let windows = [
            TimeSpan::new(0.0, 5.0),
            TimeSpan::new(20.0, 25.0),
            TimeSpan::new(5.0, 10.0),
        ];
        let hr = calculate_parameter(&registry, &HeartRate, &windows, &HeartRate.default_config(), None)
            .unwrap();

        assert_eq!(hr.kind(), "hr");
        assert_eq!(hr.len(), 2);
        assert!(hr.values().iter().all(|bpm| (bpm - 75.0).abs() < 1e-9));
    }

    #[test]
    fn test_kind_mismatch_is_rejected() {
        let registry = registry();
        let result = find_points(
            &registry,
            &HeartRate,
            TimeSpan::new(0.0, 5.0),
            &HeartRate.default_config(),
            None,
        );
        assert!(matches!(
            result,
            Err(AnalysisError::UnexpectedOutput {
                expected: ProcedureKind::Points,
                found: ProcedureKind::Parameter,
                ..
            })
        ));
    }

    #[test]
    fn test_foreign_config_is_rejected() {
        let registry = registry();
        let result = find_points(
            &registry,
            &RPeakDetector,
            TimeSpan::new(0.0, 5.0),
            &HeartRate.default_config(),
            None,
        );
        assert!(matches!(result, Err(AnalysisError::InvalidConfig { .. })));
    }

    #[test]
    fn test_apply_filter_writes_back() {
        let mut registry = SignalRegistry::new();
        let values = (0..200).map(|i| if i % 2 == 0 { 3.0 } else { 0.0 }).collect();
        registry
            .add_wave(Waveform::new(values, 2.0, "ecg").unwrap(), None, false)
            .unwrap();

        let mut config = MovingAverage.default_config();
        config.set_parameter("window_size", 3i64.into());
        let span = apply_filter(&mut registry, &MovingAverage, TimeSpan::new(0.5, 1.0), &config, None)
            .unwrap();
        assert_eq!(span, TimeSpan::new(0.5, 1.0));

        let ecg = registry.wave("ecg").unwrap();
        assert_eq!(ecg.values()[10], 3.0);
        assert!(ecg.values()[51..99].iter().all(|&v| v == 1.0 || v == 2.0));
    }
}

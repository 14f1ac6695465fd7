//! Threshold based R-peak detection on the ECG

use crate::error::{AnalysisError, AnalysisResult};
use crate::procedure::{OptionSpec, Procedure, ProcedureConfig, ProcedureInputs, ProcedureKind, ProcedureOutput};
use sigman_core::{EventPointSet, TimeSpan};

const ECG: &str = "ecg";

/// Local maxima of the ECG above a fraction of the window's amplitude
/// range, at least one refractory period apart
#[derive(Debug, Clone, Copy, Default)]
pub struct RPeakDetector;

impl RPeakDetector {
    pub const NAME: &'static str = "r_simple";
}

impl Procedure for RPeakDetector {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "R peaks as ECG maxima above an amplitude threshold"
    }

    fn kind(&self) -> ProcedureKind {
        ProcedureKind::Points
    }

    fn output_label(&self) -> &str {
        "r"
    }

    fn required_waves(&self) -> &'static [&'static str] {
        &[ECG]
    }

    fn options(&self) -> Vec<OptionSpec> {
        vec![
            OptionSpec {
                name: "threshold",
                description: "Fraction of the window's min..max range a peak must exceed",
                default: 0.6.into(),
            },
            OptionSpec {
                name: "refractory",
                description: "Shortest time between two peaks in seconds",
                default: 0.25.into(),
            },
        ]
    }

    fn validate(&self, _inputs: &ProcedureInputs<'_>, config: &ProcedureConfig) -> AnalysisResult<()> {
        let threshold = config.get_float("threshold", 0.6);
        if !(threshold > 0.0 && threshold < 1.0) {
            return Err(AnalysisError::invalid_config(
                self.name(),
                format!("threshold must lie in (0, 1), got {}", threshold),
            ));
        }
        let refractory = config.get_float("refractory", 0.25);
        if !(refractory.is_finite() && refractory >= 0.0) {
            return Err(AnalysisError::invalid_config(
                self.name(),
                format!("refractory period must be non-negative, got {}", refractory),
            ));
        }
        Ok(())
    }

    fn execute(
        &self,
        inputs: &ProcedureInputs<'_>,
        span: TimeSpan,
        config: &ProcedureConfig,
    ) -> AnalysisResult<ProcedureOutput> {
        let ecg = inputs.wave(ECG)?;
        let threshold = config.get_float("threshold", 0.6);
        let refractory = config.get_float("refractory", 0.25);

        let first = ecg.nearest_index(span.begin)?;
        let last = ecg.nearest_index(span.end)?;
        if last < first + 3 {
            return Err(AnalysisError::InsufficientData {
                span,
                reason: "window holds fewer than three ECG samples".to_string(),
            });
        }
        let samples = &ecg.values()[first..last];

        let (min, max) = samples
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        let level = min + threshold * (max - min);

        let mut times: Vec<f64> = Vec::new();
        let mut values: Vec<f64> = Vec::new();
        for i in 1..samples.len() - 1 {
            let v = samples[i];
            if v < level || v < samples[i - 1] || v <= samples[i + 1] {
                continue;
            }
            let time = ecg.time_at(first + i);
            match (times.last_mut(), values.last_mut()) {
                (Some(last_time), Some(last_value)) if time - *last_time < refractory => {
                    // keep the taller of two peaks inside one refractory period
                    if v > *last_value {
                        *last_time = time;
                        *last_value = v;
                    }
                }
                _ => {
                    times.push(time);
                    values.push(v);
                }
            }
        }

        Ok(ProcedureOutput::Points(EventPointSet::new(
            times,
            values,
            self.output_label(),
        )?))
    }
}

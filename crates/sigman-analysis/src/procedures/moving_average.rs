//! Centered moving average smoothing of the ECG

use crate::error::{AnalysisError, AnalysisResult};
use crate::procedure::{OptionSpec, Procedure, ProcedureConfig, ProcedureInputs, ProcedureKind, ProcedureOutput};
use sigman_core::{TimeSpan, Waveform};

const ECG: &str = "ecg";

#[derive(Debug, Clone, Copy, Default)]
pub struct MovingAverage;

impl MovingAverage {
    pub const NAME: &'static str = "moving_average";
}

impl Procedure for MovingAverage {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Centered moving average over an odd number of samples"
    }

    fn kind(&self) -> ProcedureKind {
        ProcedureKind::Filter
    }

    fn output_label(&self) -> &str {
        ECG
    }

    fn required_waves(&self) -> &'static [&'static str] {
        &[ECG]
    }

    fn options(&self) -> Vec<OptionSpec> {
        vec![OptionSpec {
            name: "window_size",
            description: "Number of samples averaged, odd",
            default: 5i64.into(),
        }]
    }

    fn validate(&self, _inputs: &ProcedureInputs<'_>, config: &ProcedureConfig) -> AnalysisResult<()> {
        let window = config.get_int("window_size", 5);
        if window < 1 || window % 2 == 0 {
            return Err(AnalysisError::invalid_config(
                self.name(),
                format!("window_size must be a positive odd number, got {}", window),
            ));
        }
        Ok(())
    }

    /// The output starts at the sample nearest `span.begin` and carries one
    /// sample past the sample nearest `span.end`, so it always covers the
    /// whole span when written back with `replace_segment`.
    fn execute(
        &self,
        inputs: &ProcedureInputs<'_>,
        span: TimeSpan,
        config: &ProcedureConfig,
    ) -> AnalysisResult<ProcedureOutput> {
        let ecg = inputs.wave(ECG)?;
        let half = (config.get_int("window_size", 5).max(1) / 2) as usize;

        let first = ecg.nearest_index(span.begin)?;
        let last = (ecg.nearest_index(span.end)? + 1).min(ecg.len());
        let samples = &ecg.values()[first..last];

        let smoothed: Vec<f64> = (0..samples.len())
            .map(|i| {
                // edges shrink the window instead of padding
                let lo = i.saturating_sub(half);
                let hi = (i + half + 1).min(samples.len());
                samples[lo..hi].iter().sum::<f64>() / (hi - lo) as f64
            })
            .collect();

        let duration = smoothed.len() as f64 * ecg.sample_interval();
        let filtered = Waveform::new(smoothed, duration, format!("{}_filtered", ecg.kind()))?
            .with_offset(ecg.time_at(first))?;
        Ok(ProcedureOutput::Wave(filtered))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigman_core::SignalRegistry;

    fn registry_with(values: Vec<f64>, seconds: f64) -> SignalRegistry {
        let mut registry = SignalRegistry::new();
        registry
            .add_wave(Waveform::new(values, seconds, "ecg").unwrap(), None, false)
            .unwrap();
        registry
    }

    fn smooth(registry: &SignalRegistry, span: TimeSpan, window: i64) -> Waveform {
        let inputs = ProcedureInputs::gather(registry, &MovingAverage).unwrap();
        let mut config = MovingAverage.default_config();
        config.set_parameter("window_size", window.into());
        MovingAverage.validate(&inputs, &config).unwrap();
        match MovingAverage.execute(&inputs, span, &config).unwrap() {
            ProcedureOutput::Wave(wave) => wave,
            other => panic!("unexpected output {:?}", other),
        }
    }

    #[test]
    fn test_smooths_alternating_signal() {
        let values = (0..100).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let registry = registry_with(values, 1.0);

        let filtered = smooth(&registry, TimeSpan::new(0.2, 0.6), 3);
        assert_eq!(filtered.kind(), "ecg_filtered");
        assert_eq!(filtered.len(), 41);
        assert!((filtered.sample_interval() - 0.01).abs() < 1e-12);
        assert!((filtered.offset() - 0.2).abs() < 1e-12);
        // interior samples average two of one sign and one of the other
        for &v in &filtered.values()[1..40] {
            assert!((v.abs() - 1.0 / 3.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_output_covers_span_for_replacement() {
        let values = (0..1000).map(|i| (i as f64 * 0.1).sin()).collect();
        let registry = registry_with(values, 10.0);
        let span = TimeSpan::new(2.004, 4.996);

        let filtered = smooth(&registry, span, 7);
        let mut target = registry.wave("ecg").unwrap().clone();
        target.replace_segment(span.begin, span.end, &filtered).unwrap();
        assert_eq!(target.values()[200], filtered.values()[0]);
    }

    #[test]
    fn test_rejects_even_window() {
        let registry = registry_with(vec![0.0; 10], 1.0);
        let inputs = ProcedureInputs::gather(&registry, &MovingAverage).unwrap();
        let mut config = MovingAverage.default_config();
        config.set_parameter("window_size", 4i64.into());
        assert!(matches!(
            MovingAverage.validate(&inputs, &config),
            Err(AnalysisError::InvalidConfig { .. })
        ));
    }
}

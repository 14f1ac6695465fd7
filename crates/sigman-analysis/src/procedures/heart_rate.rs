//! Heart rate from R-R intervals

use crate::error::{AnalysisError, AnalysisResult};
use crate::procedure::{OptionSpec, Procedure, ProcedureConfig, ProcedureInputs, ProcedureKind, ProcedureOutput};
use sigman_core::TimeSpan;

const R_POINTS: &str = "r";

/// Beats per minute from the mean interval between consecutive `r` points
/// inside the window
#[derive(Debug, Clone, Copy, Default)]
pub struct HeartRate;

impl HeartRate {
    pub const NAME: &'static str = "heart_rate";
}

impl Procedure for HeartRate {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Heart rate in beats per minute computed from R peaks"
    }

    fn kind(&self) -> ProcedureKind {
        ProcedureKind::Parameter
    }

    fn output_label(&self) -> &str {
        "hr"
    }

    fn required_points(&self) -> &'static [&'static str] {
        &[R_POINTS]
    }

    fn options(&self) -> Vec<OptionSpec> {
        vec![OptionSpec {
            name: "min_beats",
            description: "Fewest R peaks a window needs before a rate is reported",
            default: 2i64.into(),
        }]
    }

    fn validate(&self, _inputs: &ProcedureInputs<'_>, config: &ProcedureConfig) -> AnalysisResult<()> {
        let min_beats = config.get_int("min_beats", 2);
        if min_beats < 2 {
            return Err(AnalysisError::invalid_config(
                self.name(),
                format!("min_beats must be at least 2, got {}", min_beats),
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
        let points = inputs.points(R_POINTS)?;
        let min_beats = config.get_int("min_beats", 2).max(2) as usize;

        let times = points
            .slice(span.begin, span.end, 0)
            .map(|(times, _)| times)
            .unwrap_or_default();
        if times.len() < min_beats {
            return Err(AnalysisError::InsufficientData {
                span,
                reason: format!("{} R peaks, need {}", times.len(), min_beats),
            });
        }

        // the mean of consecutive differences telescopes to the end-to-end span
        let mean_period = (times[times.len() - 1] - times[0]) / (times.len() - 1) as f64;
        if mean_period <= 0.0 {
            return Err(AnalysisError::InsufficientData {
                span,
                reason: "R peaks share one timestamp".to_string(),
            });
        }
        Ok(ProcedureOutput::Scalar(60.0 / mean_period))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigman_core::{EventPointSet, SignalRegistry};

    fn registry_with_beats(times: Vec<f64>) -> SignalRegistry {
        let mut registry = SignalRegistry::new();
        let count = times.len();
        let r = EventPointSet::new(times, vec![1.0; count], "r").unwrap();
        registry.add_points(r, None, false).unwrap();
        registry
    }

    #[test]
    fn test_rate_from_regular_beats() {
        let registry = registry_with_beats((0..20).map(|i| i as f64 * 0.75).collect());
        let inputs = ProcedureInputs::gather(&registry, &HeartRate).unwrap();
        let config = HeartRate.default_config();

        let output = HeartRate
            .execute(&inputs, TimeSpan::new(0.0, 10.0), &config)
            .unwrap();
        match output {
            ProcedureOutput::Scalar(bpm) => assert!((bpm - 80.0).abs() < 1e-9),
            other => panic!("unexpected output {:?}", other),
        }
    }

    #[test]
    fn test_irregular_beats_use_mean_interval() {
        let registry = registry_with_beats(vec![1.0, 1.5, 2.5, 3.0]);
        let inputs = ProcedureInputs::gather(&registry, &HeartRate).unwrap();

        let output = HeartRate
            .execute(&inputs, TimeSpan::new(0.0, 5.0), &HeartRate.default_config())
            .unwrap();
        // intervals 0.5, 1.0, 0.5
        assert!(matches!(output, ProcedureOutput::Scalar(bpm) if (bpm - 90.0).abs() < 1e-9));
    }

    #[test]
    fn test_window_end_is_exclusive() {
        let registry = registry_with_beats(vec![1.0, 2.0, 3.0]);
        let inputs = ProcedureInputs::gather(&registry, &HeartRate).unwrap();

        let result = HeartRate.execute(&inputs, TimeSpan::new(1.5, 3.0), &HeartRate.default_config());
        assert!(matches!(result, Err(AnalysisError::InsufficientData { .. })));
    }

    #[test]
    fn test_min_beats_option() {
        let registry = registry_with_beats(vec![1.0, 2.0, 3.0]);
        let inputs = ProcedureInputs::gather(&registry, &HeartRate).unwrap();

        let mut config = HeartRate.default_config();
        config.set_parameter("min_beats", 4i64.into());
        assert!(HeartRate.validate(&inputs, &config).is_ok());
        assert!(HeartRate
            .execute(&inputs, TimeSpan::new(0.0, 5.0), &config)
            .is_err());

        config.set_parameter("min_beats", 1i64.into());
        assert!(matches!(
            HeartRate.validate(&inputs, &config),
            Err(AnalysisError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_requires_r_points() {
        let registry = SignalRegistry::new();
        assert!(matches!(
            ProcedureInputs::gather(&registry, &HeartRate),
            Err(AnalysisError::MissingInput { .. })
        ));
    }
}

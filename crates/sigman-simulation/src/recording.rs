//! Synthetic ECG and arterial pressure recordings with known R peaks

use crate::patterns::{ecg_beat, pressure_pulse, RhythmPattern, ECG_SUPPORT};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use sigman_core::{EventPointSet, SigmanError, SigmanResult, SignalRegistry, Waveform};
use std::f64::consts::PI;

/// Delay between an R peak and the onset of its pressure pulse
const PULSE_TRANSIT: f64 = 0.2;

/// Configuration for a simulated recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingConfig {
    /// Sampling rate of both traces in Hz
    pub sample_rate: f64,
    /// Length of each trace in seconds
    pub duration: f64,
    /// Mean heart rate in beats per minute
    pub heart_rate: f64,
    pub rhythm: RhythmPattern,
    /// Systolic and diastolic pressure in mmHg
    pub systolic: f64,
    pub diastolic: f64,
    pub noise: NoiseConfig,
    /// Start of the ECG trace on the shared timeline
    pub ecg_offset: f64,
    /// Start of the pressure trace on the shared timeline
    pub bp_offset: f64,
    /// Random seed for reproducibility
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseConfig {
    /// Gaussian noise standard deviation on the ECG (mV)
    pub ecg_std: f64,
    /// Gaussian noise standard deviation on the pressure (mmHg)
    pub bp_std: f64,
    /// Baseline wander amplitude on the ECG (mV)
    pub baseline_wander: f64,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            ecg_std: 0.02,
            bp_std: 0.5,
            baseline_wander: 0.05,
        }
    }
}

impl NoiseConfig {
    pub fn silent() -> Self {
        Self {
            ecg_std: 0.0,
            bp_std: 0.0,
            baseline_wander: 0.0,
        }
    }
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            sample_rate: 250.0,
            duration: 60.0,
            heart_rate: 72.0,
            rhythm: RhythmPattern::Regular,
            systolic: 120.0,
            diastolic: 80.0,
            noise: NoiseConfig::default(),
            ecg_offset: 0.0,
            bp_offset: 0.0,
            seed: None,
        }
    }
}

impl RecordingConfig {
    pub fn validate(&self) -> SigmanResult<()> {
        let positive = |value: f64| value.is_finite() && value > 0.0;
        if !positive(self.sample_rate) {
            return Err(invalid(format!("sample rate must be positive, got {}", self.sample_rate)));
        }
        if !positive(self.duration) || self.duration * self.sample_rate < 2.0 {
            return Err(invalid(format!(
                "duration {} s holds fewer than two samples",
                self.duration
            )));
        }
        if !(20.0..=250.0).contains(&self.heart_rate) {
            return Err(invalid(format!(
                "heart rate must lie in 20..=250 bpm, got {}",
                self.heart_rate
            )));
        }
        if !(self.systolic > self.diastolic) {
            return Err(invalid(format!(
                "systolic pressure {} must exceed diastolic {}",
                self.systolic, self.diastolic
            )));
        }
        if !(self.ecg_offset.is_finite() && self.bp_offset.is_finite()) {
            return Err(invalid("trace offsets must be finite"));
        }
        Ok(())
    }
}

/// Simulated traces plus the R peaks they were built from
#[derive(Debug, Clone)]
pub struct SyntheticRecording {
    pub ecg: Waveform,
    pub bp: Waveform,
    /// Ground-truth R peaks, valued with the ECG sample at each peak
    pub r_peaks: EventPointSet,
}

impl SyntheticRecording {
    /// Registry holding the traces as `ecg` and `bp` and the peaks as `r`
    pub fn into_registry(self) -> SigmanResult<SignalRegistry> {
        let mut registry = SignalRegistry::new();
        registry.add_wave(self.ecg, Some("ecg"), false)?;
        registry.add_wave(self.bp, Some("bp"), false)?;
        registry.add_points(self.r_peaks, Some("r"), false)?;
        Ok(registry)
    }
}

pub struct RecordingSimulator {
    config: RecordingConfig,
    rng: StdRng,
    ecg_noise: Normal<f64>,
    bp_noise: Normal<f64>,
}

impl RecordingSimulator {
    pub fn new(config: RecordingConfig) -> SigmanResult<Self> {
        config.validate()?;

        let seed = config.seed.unwrap_or_else(rand::random);
        let ecg_noise = Normal::new(0.0, config.noise.ecg_std)
            .map_err(|e| invalid(format!("invalid ECG noise: {}", e)))?;
        let bp_noise = Normal::new(0.0, config.noise.bp_std)
            .map_err(|e| invalid(format!("invalid pressure noise: {}", e)))?;

        Ok(Self {
            config,
            rng: StdRng::seed_from_u64(seed),
            ecg_noise,
            bp_noise,
        })
    }

    pub fn config(&self) -> &RecordingConfig {
        &self.config
    }

    /// Generate both traces and the R peaks inside the ECG
    pub fn generate(&mut self) -> SigmanResult<SyntheticRecording> {
        let fs = self.config.sample_rate;
        let samples = (self.config.duration * fs).round() as usize;
        let dt = 1.0 / fs;
        let ecg_offset = self.config.ecg_offset;
        let bp_offset = self.config.bp_offset;

        let beats = self.beat_times(samples as f64 * dt);

        let mut ecg = vec![0.0; samples];
        for &beat in &beats {
            let first = ((beat + ECG_SUPPORT.0 - ecg_offset) * fs).ceil().max(0.0) as usize;
            let last = ((beat + ECG_SUPPORT.1 - ecg_offset) * fs).floor();
            if last < 0.0 {
                continue;
            }
            let last = (last as usize).min(samples.saturating_sub(1));
            for (i, value) in ecg.iter_mut().enumerate().take(last + 1).skip(first) {
                *value += ecg_beat(ecg_offset + i as f64 * dt - beat);
            }
        }
        for (i, value) in ecg.iter_mut().enumerate() {
            let t = ecg_offset + i as f64 * dt;
            *value += self.config.noise.baseline_wander * (2.0 * PI * 0.3 * t).sin()
                + self.ecg_noise.sample(&mut self.rng);
        }

        let (systolic, diastolic) = (self.config.systolic, self.config.diastolic);
        let mut bp = Vec::with_capacity(samples);
        let mut onset = 0usize;
        for i in 0..samples {
            let t = bp_offset + i as f64 * dt;
            while onset + 1 < beats.len() && beats[onset + 1] + PULSE_TRANSIT <= t {
                onset += 1;
            }
            // the new pulse rises out of the previous one's diastolic tail
            let tail = match onset {
                0 => 0.0,
                _ => pressure_pulse(t - beats[onset - 1] - PULSE_TRANSIT),
            };
            let pulse = pressure_pulse(t - beats[onset] - PULSE_TRANSIT).max(tail);
            bp.push(diastolic + (systolic - diastolic) * pulse + self.bp_noise.sample(&mut self.rng));
        }

        // peaks need a sample on either side to be observable
        let (times, values): (Vec<f64>, Vec<f64>) = beats
            .iter()
            .filter_map(|&beat| {
                let index = ((beat - ecg_offset) * fs).round();
                (index >= 1.0 && (index as usize) + 1 < samples).then(|| (beat, ecg[index as usize]))
            })
            .unzip();

        let duration = samples as f64 * dt;
        Ok(SyntheticRecording {
            ecg: Waveform::new(ecg, duration, "ecg")?.with_offset(ecg_offset)?,
            bp: Waveform::new(bp, duration, "bp")?.with_offset(bp_offset)?,
            r_peaks: EventPointSet::new(times, values, "r")?,
        })
    }

    /// Beat times covering both traces, each snapped onto the ECG sample grid
    fn beat_times(&self, trace_length: f64) -> Vec<f64> {
        let base_period = 60.0 / self.config.heart_rate;
        let fs = self.config.sample_rate;
        let ecg_offset = self.config.ecg_offset;
        let start = ecg_offset.min(self.config.bp_offset) - base_period;
        let stop = ecg_offset.max(self.config.bp_offset) + trace_length + base_period;

        let mut beats = Vec::new();
        // first beat a third of a period in so the trace opens on baseline
        let mut t = start + base_period / 3.0;
        while t < stop {
            beats.push(ecg_offset + ((t - ecg_offset) * fs).round() / fs);
            t += self.config.rhythm.period_at(base_period, t);
        }
        beats
    }
}

fn invalid(reason: impl Into<String>) -> SigmanError {
    SigmanError::InvalidData {
        reason: reason.into(),
    }
}

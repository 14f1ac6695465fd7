//! Beat shapes and rhythm patterns for synthetic cardiovascular signals

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// How the beat-to-beat interval evolves over time
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum RhythmPattern {
    /// Every interval equals the base period
    #[default]
    Regular,
    /// Respiratory sinus arrhythmia: the period swings by `depth` (fraction
    /// of the base period) at `frequency` Hz
    Sinus { depth: f64, frequency: f64 },
    /// Period drifts linearly by `change` (fraction per minute)
    Drift { change: f64 },
}

impl RhythmPattern {
    /// Interval in seconds to the beat following the one at `time`
    pub fn period_at(&self, base_period: f64, time: f64) -> f64 {
        let period = match self {
            RhythmPattern::Regular => base_period,
            RhythmPattern::Sinus { depth, frequency } => {
                base_period * (1.0 + depth * (2.0 * PI * frequency * time).sin())
            }
            RhythmPattern::Drift { change } => base_period * (1.0 + change * time / 60.0),
        };
        // never let a pattern stall the beat sequence
        period.max(base_period * 0.2)
    }

    pub fn description(&self) -> &'static str {
        match self {
            RhythmPattern::Regular => "Regular rhythm",
            RhythmPattern::Sinus { .. } => "Respiratory sinus arrhythmia",
            RhythmPattern::Drift { .. } => "Drifting rate",
        }
    }
}

/// One wave of the PQRST complex: a Gaussian bump relative to the R peak
#[derive(Debug, Clone, Copy)]
struct Component {
    delay: f64,
    width: f64,
    amplitude: f64,
}

const PQRST: [Component; 5] = [
    Component { delay: -0.20, width: 0.025, amplitude: 0.15 },
    Component { delay: -0.03, width: 0.010, amplitude: -0.10 },
    Component { delay: 0.0, width: 0.012, amplitude: 1.0 },
    Component { delay: 0.03, width: 0.010, amplitude: -0.25 },
    Component { delay: 0.25, width: 0.040, amplitude: 0.30 },
];

/// Time around an R peak outside of which a beat contributes nothing
pub const ECG_SUPPORT: (f64, f64) = (-0.40, 0.50);

/// ECG amplitude (mV) at `dt` seconds from an R peak
pub fn ecg_beat(dt: f64) -> f64 {
    if dt < ECG_SUPPORT.0 || dt > ECG_SUPPORT.1 {
        return 0.0;
    }
    PQRST
        .iter()
        .map(|c| {
            let x = (dt - c.delay) / c.width;
            c.amplitude * (-0.5 * x * x).exp()
        })
        .sum()
}

/// Arterial pressure pulse shape in `[0, 1]` at `dt` seconds after onset:
/// a smooth systolic rise followed by an exponential diastolic decay
pub fn pressure_pulse(dt: f64) -> f64 {
    const RISE: f64 = 0.12;
    const DECAY: f64 = 0.35;

    if dt < 0.0 {
        0.0
    } else if dt < RISE {
        (0.5 * PI * dt / RISE).sin().powi(2)
    } else {
        (-(dt - RISE) / DECAY).exp()
    }
}

//! sigman-simulation: synthetic cardiovascular recordings
//!
//! Seeded ECG and arterial pressure traces with ground-truth R peaks, for
//! exercising the signal model and analysis procedures without real data.

pub mod patterns;
pub mod recording;

pub use patterns::RhythmPattern;
pub use recording::{NoiseConfig, RecordingConfig, RecordingSimulator, SyntheticRecording};

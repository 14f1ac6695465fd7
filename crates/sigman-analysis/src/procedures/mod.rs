//! Built-in procedures

mod heart_rate;
mod moving_average;
mod r_peaks;

pub use heart_rate::HeartRate;
pub use moving_average::MovingAverage;
pub use r_peaks::RPeakDetector;

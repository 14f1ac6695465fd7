//! sigman-core: time-aligned physiological signal model
//!
//! Sampled waveforms, sparse event points, interval parameters and the
//! registry that aligns them on one timeline.

pub mod error;
pub mod parameter;
pub mod points;
pub mod registry;
pub mod span;
pub mod waveform;

pub use error::{Collection, SigmanError, SigmanResult};
pub use parameter::{ClippedSegment, IntervalParameter};
pub use points::EventPointSet;
pub use registry::SignalRegistry;
pub use span::TimeSpan;
pub use waveform::{Resolution, Waveform};

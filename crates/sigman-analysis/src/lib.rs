//! sigman-analysis: pluggable procedures over a signal registry
//!
//! Detection, filtering and metric procedures behind one capability trait,
//! a name-indexed catalog, and the driver functions that run them over the
//! common time range of their inputs.

pub mod analyzer;
pub mod catalog;
pub mod config;
pub mod error;
pub mod procedure;
pub mod procedures;

pub use analyzer::{
    analysis_range, apply_filter, calculate_parameter, filter_wave, find_points, parameter_windows,
};
pub use catalog::ProcedureCatalog;
pub use config::{AnalysisConfig, WindowConfig};
pub use error::{AnalysisError, AnalysisResult};
pub use procedure::{
    OptionSpec, ParameterValue, Procedure, ProcedureConfig, ProcedureInputs, ProcedureKind,
    ProcedureOutput,
};
pub use procedures::{HeartRate, MovingAverage, RPeakDetector};

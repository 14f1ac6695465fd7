//! Procedure capability trait and its configuration types
//!
//! A procedure is a pluggable analysis routine: an R-peak detector, a
//! filter, a heart-rate metric. It declares which waves and point sets it
//! reads, which options it accepts, how to validate them, and how to run
//! over one time window. The core model never calls procedures itself; the
//! [`crate::analyzer`] functions do.

use crate::error::{AnalysisError, AnalysisResult};
use serde::{Deserialize, Serialize};
use sigman_core::{Collection, EventPointSet, SignalRegistry, TimeSpan, Waveform};
use std::collections::HashMap;
use std::fmt;

/// Core trait for all analysis procedures
pub trait Procedure: Send + Sync {
    /// Name the procedure is registered and looked up under
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    /// What `execute` produces
    fn kind(&self) -> ProcedureKind;

    /// Default label for the produced point set or parameter
    fn output_label(&self) -> &str;

    /// Wave labels that must be present in the registry
    fn required_waves(&self) -> &'static [&'static str] {
        &[]
    }

    /// Point set labels that must be present in the registry
    fn required_points(&self) -> &'static [&'static str] {
        &[]
    }

    /// Accepted options with their defaults
    fn options(&self) -> Vec<OptionSpec> {
        Vec::new()
    }

    /// Configuration holding every option at its default value
    fn default_config(&self) -> ProcedureConfig {
        let mut config = ProcedureConfig::new(self.name());
        for option in self.options() {
            config.set_parameter(option.name, option.default);
        }
        config
    }

    /// Check `config` against the inputs before anything runs
    fn validate(&self, inputs: &ProcedureInputs<'_>, config: &ProcedureConfig) -> AnalysisResult<()>;

    /// Run over `span`, which the caller has already confined to the common
    /// range of the required waves
    fn execute(
        &self,
        inputs: &ProcedureInputs<'_>,
        span: TimeSpan,
        config: &ProcedureConfig,
    ) -> AnalysisResult<ProcedureOutput>;
}

/// Output category of a procedure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcedureKind {
    /// Detects events, produces an [`EventPointSet`]
    Points,
    /// Scores a window, produces a scalar for an interval parameter
    Parameter,
    /// Transforms a wave segment, produces a [`Waveform`]
    Filter,
}

impl fmt::Display for ProcedureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcedureKind::Points => write!(f, "points"),
            ProcedureKind::Parameter => write!(f, "parameter"),
            ProcedureKind::Filter => write!(f, "filter"),
        }
    }
}

/// Result of one procedure run
#[derive(Debug, Clone)]
pub enum ProcedureOutput {
    Points(EventPointSet),
    Scalar(f64),
    Wave(Waveform),
}

impl ProcedureOutput {
    pub fn kind(&self) -> ProcedureKind {
        match self {
            ProcedureOutput::Points(_) => ProcedureKind::Points,
            ProcedureOutput::Scalar(_) => ProcedureKind::Parameter,
            ProcedureOutput::Wave(_) => ProcedureKind::Filter,
        }
    }
}

/// One entry of a procedure's configuration schema
#[derive(Debug, Clone)]
pub struct OptionSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub default: ParameterValue,
}

/// Named option values handed to a procedure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcedureConfig {
    /// Procedure this configuration belongs to
    pub procedure: String,
    pub parameters: HashMap<String, ParameterValue>,
}

/// Option value types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterValue {
    Float(f64),
    Integer(i64),
    Boolean(bool),
    String(String),
    FloatArray(Vec<f64>),
}

impl ProcedureConfig {
    pub fn new(procedure: &str) -> Self {
        Self {
            procedure: procedure.to_string(),
            parameters: HashMap::new(),
        }
    }

    pub fn set_parameter(&mut self, key: &str, value: ParameterValue) {
        self.parameters.insert(key.to_string(), value);
    }

    pub fn get_parameter(&self, key: &str) -> Option<&ParameterValue> {
        self.parameters.get(key)
    }

    /// Float parameter with default; integers are widened
    pub fn get_float(&self, key: &str, default: f64) -> f64 {
        self.get_parameter(key)
            .and_then(ParameterValue::as_float)
            .unwrap_or(default)
    }

    pub fn get_int(&self, key: &str, default: i64) -> i64 {
        match self.get_parameter(key) {
            Some(ParameterValue::Integer(value)) => *value,
            _ => default,
        }
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.get_parameter(key)
            .and_then(ParameterValue::as_bool)
            .unwrap_or(default)
    }

    pub fn get_str<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        match self.get_parameter(key) {
            Some(ParameterValue::String(value)) => value,
            _ => default,
        }
    }

    /// Overlay `other`'s values on top of this configuration
    pub fn merged_with(mut self, other: &ProcedureConfig) -> Self {
        for (key, value) in &other.parameters {
            self.parameters.insert(key.clone(), value.clone());
        }
        self
    }
}

impl ParameterValue {
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ParameterValue::Float(v) => Some(*v),
            ParameterValue::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParameterValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParameterValue::Boolean(v) => Some(*v),
            _ => None,
        }
    }
}

/// Macro for setting several options at once
#[macro_export]
macro_rules! set_options {
    ($config:expr, $($key:expr => $value:expr),+ $(,)?) => {
        $(
            $config.set_parameter($key, $value.into());
        )+
    };
}

impl From<f64> for ParameterValue {
    fn from(value: f64) -> Self {
        ParameterValue::Float(value)
    }
}

impl From<i64> for ParameterValue {
    fn from(value: i64) -> Self {
        ParameterValue::Integer(value)
    }
}

impl From<bool> for ParameterValue {
    fn from(value: bool) -> Self {
        ParameterValue::Boolean(value)
    }
}

impl From<String> for ParameterValue {
    fn from(value: String) -> Self {
        ParameterValue::String(value)
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        ParameterValue::String(value.to_string())
    }
}

impl From<Vec<f64>> for ParameterValue {
    fn from(value: Vec<f64>) -> Self {
        ParameterValue::FloatArray(value)
    }
}

/// Borrowed view of the waves and point sets a procedure declared
#[derive(Debug, Clone, Default)]
pub struct ProcedureInputs<'a> {
    procedure: String,
    waves: HashMap<&'a str, &'a Waveform>,
    points: HashMap<&'a str, &'a EventPointSet>,
}

impl<'a> ProcedureInputs<'a> {
    /// Collect the procedure's required inputs from `registry`
    pub fn gather(registry: &'a SignalRegistry, procedure: &dyn Procedure) -> AnalysisResult<Self> {
        let missing = |collection, label: &str| AnalysisError::MissingInput {
            procedure: procedure.name().to_string(),
            collection,
            label: label.to_string(),
        };

        let mut inputs = ProcedureInputs {
            procedure: procedure.name().to_string(),
            ..Default::default()
        };
        for &label in procedure.required_waves() {
            let wave = registry
                .wave(label)
                .ok_or_else(|| missing(Collection::Waves, label))?;
            inputs.waves.insert(label, wave);
        }
        for &label in procedure.required_points() {
            let points = registry
                .points(label)
                .ok_or_else(|| missing(Collection::Points, label))?;
            inputs.points.insert(label, points);
        }
        Ok(inputs)
    }

    pub fn wave(&self, label: &str) -> AnalysisResult<&'a Waveform> {
        self.waves
            .get(label)
            .copied()
            .ok_or_else(|| AnalysisError::MissingInput {
                procedure: self.procedure.clone(),
                collection: Collection::Waves,
                label: label.to_string(),
            })
    }

    pub fn points(&self, label: &str) -> AnalysisResult<&'a EventPointSet> {
        self.points
            .get(label)
            .copied()
            .ok_or_else(|| AnalysisError::MissingInput {
                procedure: self.procedure.clone(),
                collection: Collection::Points,
                label: label.to_string(),
            })
    }
}

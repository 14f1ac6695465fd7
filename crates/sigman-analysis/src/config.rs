//! Analysis profiles: per-procedure options and parameter windowing

use crate::catalog::ProcedureCatalog;
use crate::error::{AnalysisError, AnalysisResult};
use crate::procedure::{ParameterValue, Procedure, ProcedureConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Named set of procedure option overrides plus windowing for parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Configuration name/profile
    pub name: String,
    /// Windows used when a parameter is calculated over a whole range
    pub parameter_window: WindowConfig,
    /// Option overrides keyed by procedure name
    pub procedures: HashMap<String, ProcedureConfig>,
}

/// Window length and step in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    pub length: f64,
    pub step: f64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            length: 10.0,
            step: 10.0,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self::new("default")
    }
}

impl AnalysisConfig {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            parameter_window: WindowConfig::default(),
            procedures: HashMap::new(),
        }
    }

    /// Profile holding the default options of every procedure in `catalog`
    pub fn for_catalog(name: &str, catalog: &ProcedureCatalog) -> Self {
        let mut config = Self::new(name);
        for procedure in catalog.iter() {
            config
                .procedures
                .insert(procedure.name().to_string(), procedure.default_config());
        }
        config
    }

    /// Effective options for `procedure`: its defaults overlaid with any
    /// overrides stored in this profile
    pub fn procedure_config(&self, procedure: &dyn Procedure) -> ProcedureConfig {
        let defaults = procedure.default_config();
        match self.procedures.get(procedure.name()) {
            Some(overrides) => defaults.merged_with(overrides),
            None => defaults,
        }
    }

    pub fn set_option(&mut self, procedure: &str, key: &str, value: impl Into<ParameterValue>) {
        self.procedures
            .entry(procedure.to_string())
            .or_insert_with(|| ProcedureConfig::new(procedure))
            .set_parameter(key, value.into());
    }

    /// Check windowing and that every configured procedure exists in
    /// `catalog` and only sets options it declares
    pub fn validate(&self, catalog: &ProcedureCatalog) -> AnalysisResult<()> {
        let window = self.parameter_window;
        if !(window.length > 0.0 && window.step > 0.0) {
            return Err(AnalysisError::Configuration {
                message: format!(
                    "parameter window length and step must be positive, got {} and {}",
                    window.length, window.step
                ),
            });
        }

        for (name, config) in &self.procedures {
            if config.procedure != *name {
                return Err(AnalysisError::Configuration {
                    message: format!("options stored under '{}' belong to '{}'", name, config.procedure),
                });
            }
            let procedure = catalog.get(name)?;
            let known = procedure.options();
            if let Some(key) = config
                .parameters
                .keys()
                .find(|key| !known.iter().any(|option| option.name == key.as_str()))
            {
                return Err(AnalysisError::invalid_config(
                    name,
                    format!("unknown option '{}'", key),
                ));
            }
        }
        Ok(())
    }

    pub fn to_json(&self) -> AnalysisResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| AnalysisError::Configuration {
            message: format!("failed to serialize '{}': {}", self.name, e),
        })
    }

    pub fn from_json(json: &str) -> AnalysisResult<Self> {
        serde_json::from_str(json).map_err(|e| AnalysisError::Configuration {
            message: format!("failed to parse analysis configuration: {}", e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::procedures::{HeartRate, RPeakDetector};

    #[test]
    fn test_catalog_defaults() {
        let catalog = ProcedureCatalog::with_builtin();
        let config = AnalysisConfig::for_catalog("bench", &catalog);
        assert_eq!(config.procedures.len(), 3);
        assert!(config.validate(&catalog).is_ok());

        let r = config.procedure_config(&RPeakDetector);
        assert_eq!(r.get_float("threshold", 0.0), 0.6);
    }

    #[test]
    fn test_overrides_merge_with_defaults() {
        let mut config = AnalysisConfig::default();
        config.set_option("r_simple", "threshold", 0.7);

        let r = config.procedure_config(&RPeakDetector);
        assert_eq!(r.get_float("threshold", 0.0), 0.7);
        assert_eq!(r.get_float("refractory", 0.0), 0.25);

        let hr = config.procedure_config(&HeartRate);
        assert_eq!(hr.get_int("min_beats", 0), 2);
    }

    #[test]
    fn test_validation_errors() {
        let catalog = ProcedureCatalog::with_builtin();

        let mut config = AnalysisConfig::default();
        config.set_option("points_dn_net", "model", "dn.bin");
        assert!(matches!(
            config.validate(&catalog),
            Err(AnalysisError::UnknownProcedure(_))
        ));

        let mut config = AnalysisConfig::default();
        config.set_option("heart_rate", "smoothing", true);
        assert!(matches!(
            config.validate(&catalog),
            Err(AnalysisError::InvalidConfig { .. })
        ));

        let mut config = AnalysisConfig::default();
        config.parameter_window.step = 0.0;
        assert!(matches!(
            config.validate(&catalog),
            Err(AnalysisError::Configuration { .. })
        ));
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = AnalysisConfig::new("clinical");
        config.parameter_window = WindowConfig { length: 30.0, step: 15.0 };
        config.set_option("heart_rate", "min_beats", 3i64);

        let json = config.to_json().unwrap();
        let restored = AnalysisConfig::from_json(&json).unwrap();
        assert_eq!(restored, config);

        assert!(AnalysisConfig::from_json("{ not json").is_err());
    }
}

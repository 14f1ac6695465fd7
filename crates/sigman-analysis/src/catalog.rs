//! Name-indexed collection of available procedures

use crate::error::{AnalysisError, AnalysisResult};
use crate::procedure::Procedure;
use crate::procedures::{HeartRate, MovingAverage, RPeakDetector};
use std::collections::HashMap;
use tracing::{debug, warn};

#[derive(Default)]
pub struct ProcedureCatalog {
    procedures: HashMap<String, Box<dyn Procedure>>,
}

impl ProcedureCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog holding every built-in procedure
    pub fn with_builtin() -> Self {
        let mut catalog = Self::new();
        catalog.register(Box::new(RPeakDetector));
        catalog.register(Box::new(MovingAverage));
        catalog.register(Box::new(HeartRate));
        catalog
    }

    /// Add a procedure under its own name, replacing any previous one
    pub fn register(&mut self, procedure: Box<dyn Procedure>) {
        let name = procedure.name().to_string();
        if self.procedures.insert(name.clone(), procedure).is_some() {
            warn!(procedure = %name, "replaced registered procedure");
        } else {
            debug!(procedure = %name, "registered procedure");
        }
    }

    pub fn get(&self, name: &str) -> AnalysisResult<&dyn Procedure> {
        self.procedures
            .get(name)
            .map(|procedure| procedure.as_ref())
            .ok_or_else(|| AnalysisError::UnknownProcedure(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.procedures.contains_key(name)
    }

    /// Registered names in sorted order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.procedures.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Procedure> {
        self.procedures.values().map(|procedure| procedure.as_ref())
    }

    pub fn len(&self) -> usize {
        self.procedures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.procedures.is_empty()
    }
}

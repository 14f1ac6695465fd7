//! Errors raised while configuring or running analysis procedures

use crate::procedure::ProcedureKind;
use sigman_core::{Collection, SigmanError, TimeSpan};

/// Result type alias for analysis operations
pub type AnalysisResult<T> = Result<T, AnalysisError>;

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// Failure inside the signal model itself
    #[error(transparent)]
    Signal(#[from] SigmanError),

    #[error("procedure '{procedure}' rejected its configuration: {message}")]
    InvalidConfig { procedure: String, message: String },

    #[error("unknown procedure '{0}'")]
    UnknownProcedure(String),

    #[error("procedure '{procedure}' requires {collection} '{label}'")]
    MissingInput {
        procedure: String,
        collection: Collection,
        label: String,
    },

    #[error("procedure '{procedure}' returned {found} output, expected {expected}")]
    UnexpectedOutput {
        procedure: String,
        expected: ProcedureKind,
        found: ProcedureKind,
    },

    #[error("waves {labels:?} share no common time range")]
    NoCommonRange { labels: Vec<String> },

    #[error("not enough data in {span}: {reason}")]
    InsufficientData { span: TimeSpan, reason: String },

    #[error("configuration error: {message}")]
    Configuration { message: String },
}

impl AnalysisError {
    pub(crate) fn invalid_config(procedure: &str, message: impl Into<String>) -> Self {
        AnalysisError::InvalidConfig {
            procedure: procedure.to_string(),
            message: message.into(),
        }
    }
}

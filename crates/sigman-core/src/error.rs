//! Error handling for the signal model
//!
//! Every operation reports violations synchronously at the point where they
//! happen. Nothing is retried internally; a caller that hits `OutOfRange`
//! is expected to narrow its query window itself.

use core::fmt;

/// Result type alias for signal model operations
pub type SigmanResult<T> = Result<T, SigmanError>;

/// Which registry collection a label refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Waves,
    Points,
    Parameters,
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Collection::Waves => write!(f, "waves"),
            Collection::Points => write!(f, "points"),
            Collection::Parameters => write!(f, "parameters"),
        }
    }
}

/// Error type for all signal model operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum SigmanError {
    /// Time argument outside the valid domain of a waveform
    #[error("time {time} lies outside the valid range [{begin}, {end}]")]
    OutOfRange {
        /// Requested time
        time: f64,
        /// First valid time
        begin: f64,
        /// Last valid time
        end: f64,
    },

    /// Segment replacement with a mismatched sampling interval
    #[error("sample interval {found} is incompatible with {expected}")]
    IncompatibleRate {
        /// Sample interval of the target waveform
        expected: f64,
        /// Sample interval of the replacement source
        found: f64,
    },

    /// Replacement source shorter than the target range
    #[error("source covers {available}s but {required}s are required")]
    InsufficientLength {
        /// Length of the range being replaced
        required: f64,
        /// Length the source can supply
        available: f64,
    },

    /// Label already taken in a registry collection
    #[error("label '{label}' is already taken in {collection}")]
    DuplicateLabel {
        collection: Collection,
        label: String,
    },

    /// Label absent from a registry collection
    #[error("label '{label}' not found in {collection}")]
    NotFound {
        collection: Collection,
        label: String,
    },

    /// Range deletion over a window holding no points
    #[error("no points in range [{begin}, {end})")]
    NoPointsInRange {
        begin: f64,
        end: f64,
    },

    /// Nearest-point removal on an empty point set
    #[error("point set '{kind}' is empty")]
    EmptyPointSet {
        kind: String,
    },

    /// Malformed construction input or argument
    #[error("invalid data: {reason}")]
    InvalidData {
        reason: String,
    },
}

impl SigmanError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        SigmanError::InvalidData {
            reason: reason.into(),
        }
    }

    /// True for the "not found" family: missing labels and empty ranges
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            SigmanError::NotFound { .. }
                | SigmanError::NoPointsInRange { .. }
                | SigmanError::EmptyPointSet { .. }
        )
    }
}

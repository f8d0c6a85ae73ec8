//! Errors surfaced by threshold parsing and option validation.

use thiserror::Error;

/// A threshold expression that does not follow the range grammar.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("invalid threshold '{raw}': {reason}")]
pub struct InvalidThresholdError {
    pub raw: String,
    pub reason: String,
}

impl InvalidThresholdError {
    pub(crate) fn new(raw: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CheckError {
    /// User supplied a malformed threshold.
    #[error(transparent)]
    InvalidThreshold(#[from] InvalidThresholdError),

    /// User supplied a missing or malformed option.
    #[error("{0}")]
    Usage(String),

    /// The calling program misused the API.
    #[error("coding error: {0}")]
    Coding(String),
}

impl CheckError {
    /// True for errors caused by user input rather than by the check program.
    pub fn is_usage(&self) -> bool {
        match self {
            Self::InvalidThreshold(_) | Self::Usage(_) => true,
            Self::Coding(_) => false,
        }
    }
}

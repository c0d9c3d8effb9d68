//! LV2 error types.

use std::fmt;

use cadence_core::ProcessorError;

/// Errors that make `instantiate` fail.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lv2Error {
    /// A required host feature was not offered.
    MissingFeature(&'static str),

    /// A required host feature was offered with unusable data.
    NullFeature(&'static str),

    /// The processing core rejected the setup.
    Processor(ProcessorError),
}

impl fmt::Display for Lv2Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFeature(name) => write!(f, "Host does not provide required feature {}", name),
            Self::NullFeature(name) => write!(f, "Host feature {} has no data", name),
            Self::Processor(err) => write!(f, "Processor setup failed: {}", err),
        }
    }
}

impl std::error::Error for Lv2Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Processor(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ProcessorError> for Lv2Error {
    fn from(err: ProcessorError) -> Self {
        Self::Processor(err)
    }
}

/// Result type alias for LV2 operations.
pub type Lv2Result<T> = Result<T, Lv2Error>;

//! Error types for processor setup.

use std::fmt;

/// Errors that prevent a [`Processor`](crate::Processor) from being created.
///
/// Nothing on the audio path returns an error; malformed events are dropped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProcessorError {
    /// The host supplied a sample rate that is not finite and positive.
    InvalidSampleRate(f64),
    /// The engine declares more channels than a [`Buffer`](crate::Buffer) can carry.
    TooManyChannels { requested: usize, max: usize },
}

impl fmt::Display for ProcessorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSampleRate(rate) => write!(f, "Invalid sample rate: {}", rate),
            Self::TooManyChannels { requested, max } => {
                write!(f, "Too many channels: {} requested, at most {}", requested, max)
            }
        }
    }
}

impl std::error::Error for ProcessorError {}

/// Result type for processor setup.
pub type ProcessorResult<T> = Result<T, ProcessorError>;

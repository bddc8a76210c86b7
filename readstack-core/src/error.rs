//! Error handling for readstack

use thiserror::Error;

/// Request-level error categories.
///
/// Callers can tell "bad input" (`Validation`) apart from an unavailable
/// backing store (`AlignmentSource`, `ReferenceSource`). Malformed records and
/// unknown CIGAR operations are never reported here; they are skipped.
#[derive(Error, Debug)]
pub enum PileupError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Alignment source error: {message}")]
    AlignmentSource { message: String },

    #[error("Reference source error for {chr}:{start}-{stop}: {message}")]
    ReferenceSource {
        chr: String,
        start: u64,
        stop: u64,
        message: String,
    },

    #[error("Rendering error: {message}")]
    Rendering { message: String },
}

impl PileupError {
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation { message: message.into() }
    }

    pub fn alignment_source<S: Into<String>>(message: S) -> Self {
        Self::AlignmentSource { message: message.into() }
    }

    pub fn reference_source<S: Into<String>>(chr: &str, start: u64, stop: u64, message: S) -> Self {
        Self::ReferenceSource {
            chr: chr.to_string(),
            start,
            stop,
            message: message.into(),
        }
    }

    pub fn rendering<S: Into<String>>(message: S) -> Self {
        Self::Rendering { message: message.into() }
    }

    /// True for errors caused by the request itself rather than a backing store.
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

/// Result type for pileup operations
pub type PileupResult<T> = Result<T, PileupError>;

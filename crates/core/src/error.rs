//! Error types for servegate-core

use std::path::PathBuf;

use thiserror::Error;

use crate::backend::ProbeError;
use crate::outcome::Modality;

/// Result type alias for servegate-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types raised while checking an input against its limit
#[derive(Debug, Error)]
pub enum Error {
    /// Input variant is not accepted by the modality
    #[error("unexpected type for {modality} input, expected {expected}")]
    UnexpectedType {
        /// Modality that rejected the input
        modality: Modality,
        /// Human-readable list of accepted shapes
        expected: &'static str,
    },

    /// No backend for the modality was compiled in or configured
    #[error("{0} support is unavailable: no backend configured")]
    FeatureUnavailable(Modality),

    /// Path input does not point at a regular file
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Base64 payload could not be decoded
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Format hint string is not recognized
    #[error("unsupported format hint '{0}', expected 'base64' or empty")]
    InvalidFormatHint(String),

    /// Backend failed to measure the input
    #[error("error processing {modality}: {source}")]
    Probe {
        /// Modality being measured
        modality: Modality,
        /// Underlying backend fault
        #[source]
        source: ProbeError,
    },
}

impl Error {
    pub(crate) fn unexpected(modality: Modality, expected: &'static str) -> Self {
        Error::UnexpectedType { modality, expected }
    }
}

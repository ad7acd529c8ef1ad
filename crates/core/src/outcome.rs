//! Check outcomes
//!
//! Every modality reports through the same [`CheckOutcome`], so callers
//! handle text, audio, images, PDF, video and DICOM uniformly:
//!
//! - `Pass` / `Fail` carry the [`Measurement`] that decided them
//! - `Indeterminate` means the backend could not measure the input
//! - `Error` means the input itself was unusable

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Error;

/// Input media type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    /// Raw text or a list of text segments
    Text,
    /// Audio clip
    Audio,
    /// Set of image references
    Images,
    /// PDF document
    Pdf,
    /// Video clip
    Video,
    /// Set of DICOM file references
    Dicom,
}

impl Modality {
    /// All modalities, in declaration order
    pub const ALL: [Modality; 6] = [
        Modality::Text,
        Modality::Audio,
        Modality::Images,
        Modality::Pdf,
        Modality::Video,
        Modality::Dicom,
    ];

    /// Unit the limit of this modality is expressed in
    pub fn unit(&self) -> &'static str {
        match self {
            Modality::Text => "characters",
            Modality::Audio | Modality::Video => "seconds",
            Modality::Images => "images",
            Modality::Pdf => "pages",
            Modality::Dicom => "files",
        }
    }

    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Text => "text",
            Modality::Audio => "audio",
            Modality::Images => "images",
            Modality::Pdf => "pdf",
            Modality::Video => "video",
            Modality::Dicom => "dicom",
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Measured size of an input next to the limit it was compared with
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Modality that was measured
    pub modality: Modality,
    /// Measured size, in [`Modality::unit`]
    pub value: f64,
    /// Limit the size was compared against
    pub limit: f64,
}

impl Measurement {
    /// Create a measurement
    pub fn new(modality: Modality, value: f64, limit: f64) -> Self {
        Self {
            modality,
            value,
            limit,
        }
    }

    /// Whether the measured value is within the limit
    pub fn within_limit(&self) -> bool {
        self.value <= self.limit
    }

    /// Turn the measurement into a pass/fail outcome
    pub fn into_outcome(self) -> CheckOutcome {
        if self.within_limit() {
            CheckOutcome::Pass(self)
        } else {
            CheckOutcome::Fail(self)
        }
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} (limit {})",
            self.value,
            self.modality.unit(),
            self.limit
        )
    }
}

/// Result of checking one input
#[derive(Debug)]
pub enum CheckOutcome {
    /// Input is within the limit
    Pass(Measurement),
    /// Input exceeds the limit
    Fail(Measurement),
    /// Size could not be measured
    Indeterminate {
        /// Modality being checked
        modality: Modality,
        /// Why measurement failed
        reason: String,
    },
    /// Input was rejected before or while measuring
    Error(Error),
}

impl CheckOutcome {
    /// `Some(true)` on pass, `Some(false)` on fail, `None` otherwise
    pub fn within_limit(&self) -> Option<bool> {
        match self {
            CheckOutcome::Pass(_) => Some(true),
            CheckOutcome::Fail(_) => Some(false),
            _ => None,
        }
    }

    /// True for `Pass`
    pub fn is_pass(&self) -> bool {
        matches!(self, CheckOutcome::Pass(_))
    }

    /// True for `Fail`
    pub fn is_fail(&self) -> bool {
        matches!(self, CheckOutcome::Fail(_))
    }

    /// True for `Indeterminate`
    pub fn is_indeterminate(&self) -> bool {
        matches!(self, CheckOutcome::Indeterminate { .. })
    }

    /// Measurement behind a pass/fail outcome
    pub fn measurement(&self) -> Option<&Measurement> {
        match self {
            CheckOutcome::Pass(m) | CheckOutcome::Fail(m) => Some(m),
            _ => None,
        }
    }

    /// Error behind an `Error` outcome
    pub fn error(&self) -> Option<&Error> {
        match self {
            CheckOutcome::Error(e) => Some(e),
            _ => None,
        }
    }

    /// Short status label: `pass`, `fail`, `indeterminate` or `error`
    pub fn status(&self) -> &'static str {
        match self {
            CheckOutcome::Pass(_) => "pass",
            CheckOutcome::Fail(_) => "fail",
            CheckOutcome::Indeterminate { .. } => "indeterminate",
            CheckOutcome::Error(_) => "error",
        }
    }
}

impl From<Error> for CheckOutcome {
    fn from(error: Error) -> Self {
        CheckOutcome::Error(error)
    }
}

impl fmt::Display for CheckOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckOutcome::Pass(m) => write!(f, "{}: pass, {}", m.modality, m),
            CheckOutcome::Fail(m) => write!(f, "{}: fail, {}", m.modality, m),
            CheckOutcome::Indeterminate { modality, reason } => {
                write!(f, "{}: indeterminate, {}", modality, reason)
            }
            CheckOutcome::Error(e) => write!(f, "error: {}", e),
        }
    }
}

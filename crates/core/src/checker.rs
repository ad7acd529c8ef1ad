//! Input limit checker
//!
//! [`LimitChecker`] exposes one check per modality. Each check is a pure
//! function of the input, the limit and (for media) the format hint, plus
//! one call into the configured media backend.
//!
//! # Outcomes
//!
//! | Situation | Outcome |
//! |---|---|
//! | measured ≤ limit | `Pass` |
//! | measured > limit | `Fail` |
//! | unsupported input shape, missing file, bad base64 | `Error` |
//! | no backend for the modality | `Error(FeatureUnavailable)` |
//! | audio/video backend cannot measure | `Indeterminate` |
//! | PDF backend cannot read the document | `Error(Probe)` |

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::backend::{
    AudioBackend, Backends, PdfBackend, ProbeError, VideoBackend, VideoHandle,
};
use crate::config::LimitsConfig;
use crate::error::{Error, Result};
use crate::input::{FormatHint, Input, MediaSource};
use crate::outcome::{CheckOutcome, Measurement, Modality};

/// Which media backends a checker can use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Audio duration checks available
    pub audio: bool,
    /// PDF page checks available
    pub pdf: bool,
    /// Video duration checks available
    pub video: bool,
}

impl Capabilities {
    /// Whether checks for `modality` can run
    pub fn supports(&self, modality: Modality) -> bool {
        match modality {
            Modality::Audio => self.audio,
            Modality::Pdf => self.pdf,
            Modality::Video => self.video,
            Modality::Text | Modality::Images | Modality::Dicom => true,
        }
    }
}

/// Validates inputs against per-modality limits
///
/// Holds no per-call state, only shared references to its backends, so one
/// checker can serve any number of threads.
#[derive(Debug, Clone)]
pub struct LimitChecker {
    backends: Backends,
}

impl Default for LimitChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl LimitChecker {
    /// Checker using the backends compiled into this build
    pub fn new() -> Self {
        Self::with_backends(Backends::detect())
    }

    /// Checker using exactly `backends`
    pub fn with_backends(backends: Backends) -> Self {
        Self { backends }
    }

    /// Replace the audio backend
    pub fn with_audio_backend(mut self, backend: impl AudioBackend + 'static) -> Self {
        self.backends.audio = Some(Arc::new(backend));
        self
    }

    /// Replace the PDF backend
    pub fn with_pdf_backend(mut self, backend: impl PdfBackend + 'static) -> Self {
        self.backends.pdf = Some(Arc::new(backend));
        self
    }

    /// Replace the video backend
    pub fn with_video_backend(mut self, backend: impl VideoBackend + 'static) -> Self {
        self.backends.video = Some(Arc::new(backend));
        self
    }

    /// Media backends available to this checker
    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            audio: self.backends.audio.is_some(),
            pdf: self.backends.pdf.is_some(),
            video: self.backends.video.is_some(),
        }
    }

    /// Check any modality against the matching limit in `limits`
    pub fn check(
        &self,
        modality: Modality,
        input: &Input,
        limits: &LimitsConfig,
        hint: FormatHint,
    ) -> CheckOutcome {
        match modality {
            Modality::Text => self.check_text(input, limits.text_chars),
            Modality::Audio => self.check_audio(input, limits.audio_seconds, hint),
            Modality::Images => self.check_images(input, limits.images),
            Modality::Pdf => self.check_pdf(input, limits.pdf_pages, hint),
            Modality::Video => self.check_video(input, limits.video_seconds, hint),
            Modality::Dicom => self.check_dicom(input, limits.dicom_files),
        }
    }

    /// Total character count of a string or list of strings
    pub fn check_text(&self, input: &Input, limit: usize) -> CheckOutcome {
        finish(Modality::Text, || {
            let size: usize = match input {
                Input::Text(text) => text.chars().count(),
                Input::TextList(items) => items.iter().map(|t| t.chars().count()).sum(),
                _ => {
                    return Err(Error::unexpected(
                        Modality::Text,
                        "string or sequence of strings",
                    ))
                }
            };
            Ok(Measurement::new(Modality::Text, size as f64, limit as f64).into_outcome())
        })
    }

    /// Audio duration in seconds
    pub fn check_audio(&self, input: &Input, limit_secs: f64, hint: FormatHint) -> CheckOutcome {
        finish(Modality::Audio, || {
            let backend = require(&self.backends.audio, Modality::Audio)?;
            let source = input.media_source(Modality::Audio, hint)?;

            Ok(match backend.duration(&source) {
                Ok(duration) => {
                    let seconds = duration.as_secs_f64();
                    tracing::debug!("Audio length: {}", seconds);
                    Measurement::new(Modality::Audio, seconds, limit_secs).into_outcome()
                }
                Err(e) => indeterminate(Modality::Audio, &source, e),
            })
        })
    }

    /// Number of image references
    pub fn check_images(&self, input: &Input, limit: usize) -> CheckOutcome {
        finish(Modality::Images, || {
            let size = count_items(input, Modality::Images, "sequence of image references")?;
            tracing::info!("Number of images: {}", size);
            Ok(Measurement::new(Modality::Images, size as f64, limit as f64).into_outcome())
        })
    }

    /// Number of PDF pages
    pub fn check_pdf(&self, input: &Input, limit: usize, hint: FormatHint) -> CheckOutcome {
        finish(Modality::Pdf, || {
            let backend = require(&self.backends.pdf, Modality::Pdf)?;
            let source = input.media_source(Modality::Pdf, hint)?;

            let pages = backend.page_count(&source).map_err(|source| Error::Probe {
                modality: Modality::Pdf,
                source,
            })?;
            Ok(Measurement::new(Modality::Pdf, pages as f64, limit as f64).into_outcome())
        })
    }

    /// Video duration in seconds, `frames / fps`
    ///
    /// The backend stream is released before this returns, whatever the
    /// outcome.
    pub fn check_video(&self, input: &Input, limit_secs: f64, hint: FormatHint) -> CheckOutcome {
        finish(Modality::Video, || {
            let backend = require(&self.backends.video, Modality::Video)?;
            let source = input.media_source(Modality::Video, hint)?;

            let handle = match backend.open(&source) {
                Ok(stream) => VideoHandle::new(stream),
                Err(e) => return Ok(indeterminate(Modality::Video, &source, e)),
            };

            Ok(match handle.duration_secs() {
                Ok(seconds) => {
                    tracing::info!("Video length: {}", seconds);
                    Measurement::new(Modality::Video, seconds, limit_secs).into_outcome()
                }
                Err(e) => indeterminate(Modality::Video, &source, e),
            })
        })
    }

    /// Number of DICOM file references
    pub fn check_dicom(&self, input: &Input, limit: usize) -> CheckOutcome {
        finish(Modality::Dicom, || {
            let size = count_items(input, Modality::Dicom, "sequence of DICOM file references")?;
            tracing::info!("Number of dicom files: {}", size);
            Ok(Measurement::new(Modality::Dicom, size as f64, limit as f64).into_outcome())
        })
    }
}

fn finish(modality: Modality, check: impl FnOnce() -> Result<CheckOutcome>) -> CheckOutcome {
    match check() {
        Ok(outcome) => {
            tracing::debug!("{}", outcome);
            outcome
        }
        Err(e) => {
            tracing::warn!("{} check rejected input: {}", modality, e);
            CheckOutcome::Error(e)
        }
    }
}

fn require<T: ?Sized>(backend: &Option<Arc<T>>, modality: Modality) -> Result<&T> {
    backend
        .as_deref()
        .ok_or(Error::FeatureUnavailable(modality))
}

fn count_items(input: &Input, modality: Modality, expected: &'static str) -> Result<usize> {
    match input {
        Input::TextList(items) => Ok(items.len()),
        _ => Err(Error::unexpected(modality, expected)),
    }
}

fn indeterminate(modality: Modality, source: &MediaSource<'_>, error: ProbeError) -> CheckOutcome {
    let reason = format!("Error getting duration of {}: {}", source.describe(), error);
    tracing::error!("{}", reason);
    CheckOutcome::Indeterminate { modality, reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    struct FixedAudio(Duration);

    impl AudioBackend for FixedAudio {
        fn duration(&self, _: &MediaSource<'_>) -> crate::backend::Result<Duration> {
            Ok(self.0)
        }
    }

    struct BrokenAudio;

    impl AudioBackend for BrokenAudio {
        fn duration(&self, _: &MediaSource<'_>) -> crate::backend::Result<Duration> {
            Err(ProbeError::Decode("corrupt header".to_string()))
        }
    }

    struct FixedPdf(usize);

    impl PdfBackend for FixedPdf {
        fn page_count(&self, _: &MediaSource<'_>) -> crate::backend::Result<usize> {
            Ok(self.0)
        }
    }

    fn bare() -> LimitChecker {
        LimitChecker::with_backends(Backends::none())
    }

    #[test]
    fn test_text_scenarios() {
        let checker = bare();
        assert!(checker.check_text(&Input::from("hello"), 5000).is_pass());

        let list = Input::from(&["ab", "cd", "ef"][..]);
        assert!(checker.check_text(&list, 5).is_fail());
        assert!(checker.check_text(&list, 6).is_pass());
    }

    #[test]
    fn test_text_counts_characters_not_bytes() {
        let checker = bare();
        // 5 characters, 10 bytes
        let outcome = checker.check_text(&Input::from("héllø"), 5);
        assert_eq!(outcome.measurement().unwrap().value, 5.0);
        assert!(outcome.is_pass());
    }

    #[test]
    fn test_text_rejects_other_shapes() {
        let checker = bare();
        let outcome = checker.check_text(&Input::Bytes(vec![1, 2, 3]), 5000);
        let err = outcome.error().unwrap();
        assert!(err
            .to_string()
            .contains("expected string or sequence of strings"));
    }

    #[test]
    fn test_images_and_dicom() {
        let checker = bare();
        let images = Input::from(&["a.jpg", "b.jpg"][..]);
        assert!(checker.check_images(&images, 4).is_pass());
        assert!(checker.check_images(&images, 1).is_fail());

        let dicom = Input::from(&["d1.dcm"][..]);
        assert!(checker.check_dicom(&dicom, 1).is_pass());

        let outcome = checker.check_dicom(&Input::from("d1.dcm"), 1);
        assert!(matches!(
            outcome.error(),
            Some(Error::UnexpectedType {
                modality: Modality::Dicom,
                ..
            })
        ));
    }

    #[test]
    fn test_missing_backend_fails_fast() {
        let checker = bare();
        let input = Input::Bytes(vec![0; 16]);

        for (modality, outcome) in [
            (Modality::Audio, checker.check_audio(&input, 600.0, FormatHint::Auto)),
            (Modality::Pdf, checker.check_pdf(&input, 10, FormatHint::Auto)),
            (Modality::Video, checker.check_video(&input, 600.0, FormatHint::Auto)),
        ] {
            match outcome.error() {
                Some(Error::FeatureUnavailable(m)) => assert_eq!(*m, modality),
                other => panic!("expected FeatureUnavailable, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_audio_with_stub_backend() {
        let checker = bare().with_audio_backend(FixedAudio(Duration::from_secs(90)));
        let input = Input::Bytes(vec![0; 16]);

        assert!(checker.check_audio(&input, 600.0, FormatHint::Auto).is_pass());
        assert!(checker.check_audio(&input, 60.0, FormatHint::Auto).is_fail());
    }

    #[test]
    fn test_audio_decode_failure_is_indeterminate() {
        let checker = bare().with_audio_backend(BrokenAudio);
        let outcome = checker.check_audio(&Input::Bytes(vec![0; 16]), 600.0, FormatHint::Auto);
        assert!(outcome.is_indeterminate());
        assert_eq!(outcome.within_limit(), None);
    }

    #[test]
    fn test_audio_bad_base64_is_error() {
        let checker = bare().with_audio_backend(FixedAudio(Duration::from_secs(1)));
        let outcome = checker.check_audio(&Input::from("%%%"), 600.0, FormatHint::Base64);
        assert!(matches!(outcome.error(), Some(Error::Base64(_))));
    }

    #[test]
    fn test_dispatch_uses_configured_limits() {
        let checker = bare().with_pdf_backend(FixedPdf(12));
        let mut limits = LimitsConfig::default();
        let input = Input::Bytes(b"%PDF".to_vec());

        let outcome = checker.check(Modality::Pdf, &input, &limits, FormatHint::Auto);
        assert!(outcome.is_fail());

        limits.pdf_pages = 20;
        let outcome = checker.check(Modality::Pdf, &input, &limits, FormatHint::Auto);
        assert!(outcome.is_pass());
    }

    #[test]
    fn test_capabilities() {
        let caps = bare().with_pdf_backend(FixedPdf(1)).capabilities();
        assert!(caps.pdf);
        assert!(!caps.audio);
        assert!(caps.supports(Modality::Text));
        assert!(!caps.supports(Modality::Video));
    }
}

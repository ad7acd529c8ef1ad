//! Media backend abstractions
//!
//! The limit checks never decode media themselves. They ask a backend for a
//! single number: audio duration, PDF page count, or video frame count and
//! frame rate.
//!
//! Backends shipped with the crate:
//! - [`SymphoniaAudioBackend`] (feature `audio`)
//! - [`LopdfBackend`] (feature `pdf`)
//! - [`Mp4VideoBackend`] (feature `video`)
//! - [`FfmpegAudioBackend`] / [`FfmpegVideoBackend`] (feature `ffmpeg`,
//!   preferred over the pure-Rust ones when enabled)

use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::sync::Arc;
use std::time::Duration;

use crate::input::MediaSource;

#[cfg(feature = "audio")]
mod audio;
#[cfg(feature = "ffmpeg")]
mod ffmpeg;
#[cfg(all(test, any(feature = "video", feature = "ffmpeg")))]
mod fixtures;
#[cfg(feature = "pdf")]
mod pdf;
#[cfg(feature = "video")]
mod video;

#[cfg(feature = "audio")]
pub use audio::SymphoniaAudioBackend;
#[cfg(feature = "ffmpeg")]
pub use ffmpeg::{FfmpegAudioBackend, FfmpegVideoBackend};
#[cfg(feature = "pdf")]
pub use pdf::LopdfBackend;
#[cfg(feature = "video")]
pub use video::Mp4VideoBackend;

/// Result type for backend operations
pub type Result<T> = std::result::Result<T, ProbeError>;

/// Backend-specific errors
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// Container or document could not be opened
    #[error("failed to open media: {0}")]
    Open(String),

    /// Headers were read but the value could not be derived
    #[error("failed to decode media: {0}")]
    Decode(String),

    /// No track of the expected kind
    #[error("no {0} track found")]
    MissingTrack(&'static str),

    /// Frame rate is zero, negative or not finite
    #[error("invalid frame rate: {0}")]
    InvalidFrameRate(f64),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Audio duration backend
pub trait AudioBackend: Send + Sync {
    /// Total playback duration of the first audio track
    fn duration(&self, source: &MediaSource<'_>) -> Result<Duration>;
}

/// PDF page-count backend
pub trait PdfBackend: Send + Sync {
    /// Number of pages in the document
    fn page_count(&self, source: &MediaSource<'_>) -> Result<usize>;
}

/// Video backend
///
/// Opening a source yields a [`VideoStream`] which holds decoder resources
/// until released. The stream may borrow the source's in-memory buffer.
pub trait VideoBackend: Send + Sync {
    /// Open the first video track of `source`
    fn open<'s>(&self, source: &'s MediaSource<'_>) -> Result<Box<dyn VideoStream + 's>>;
}

/// An opened video track
pub trait VideoStream {
    /// Total number of frames
    fn frame_count(&self) -> Result<f64>;

    /// Frames per second
    fn frame_rate(&self) -> Result<f64>;

    /// Release decoder resources. Called exactly once by [`VideoHandle`].
    fn release(&mut self);
}

/// Scoped owner of a [`VideoStream`]
///
/// Releases the stream when dropped, so every exit path of the caller
/// (including `?` early returns) frees the decoder.
pub struct VideoHandle<'s> {
    stream: Option<Box<dyn VideoStream + 's>>,
}

impl<'s> VideoHandle<'s> {
    /// Take ownership of an opened stream
    pub fn new(stream: Box<dyn VideoStream + 's>) -> Self {
        Self {
            stream: Some(stream),
        }
    }

    fn stream(&self) -> Result<&(dyn VideoStream + 's)> {
        self.stream
            .as_deref()
            .ok_or_else(|| ProbeError::Decode("video stream already released".to_string()))
    }

    /// Total number of frames
    pub fn frame_count(&self) -> Result<f64> {
        self.stream()?.frame_count()
    }

    /// Frames per second
    pub fn frame_rate(&self) -> Result<f64> {
        self.stream()?.frame_rate()
    }

    /// Duration in seconds, `frame_count / frame_rate`
    pub fn duration_secs(&self) -> Result<f64> {
        let frames = self.frame_count()?;
        let fps = self.frame_rate()?;
        if !fps.is_finite() || fps <= 0.0 {
            return Err(ProbeError::InvalidFrameRate(fps));
        }
        Ok(frames / fps)
    }
}

impl Drop for VideoHandle<'_> {
    fn drop(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.release();
            tracing::trace!("video stream released");
        }
    }
}

/// Shared handles to whichever backends are configured
#[derive(Clone, Default)]
pub struct Backends {
    /// Audio duration backend
    pub audio: Option<Arc<dyn AudioBackend>>,
    /// PDF page-count backend
    pub pdf: Option<Arc<dyn PdfBackend>>,
    /// Video frame backend
    pub video: Option<Arc<dyn VideoBackend>>,
}

impl Backends {
    /// Backends compiled into this build
    pub fn detect() -> Self {
        Self {
            audio: default_audio(),
            pdf: default_pdf(),
            video: default_video(),
        }
    }

    /// No backends; only count- and text-based checks work
    pub fn none() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for Backends {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backends")
            .field("audio", &self.audio.is_some())
            .field("pdf", &self.pdf.is_some())
            .field("video", &self.video.is_some())
            .finish()
    }
}

#[allow(unreachable_code)]
fn default_audio() -> Option<Arc<dyn AudioBackend>> {
    #[cfg(feature = "ffmpeg")]
    return Some(Arc::new(FfmpegAudioBackend::new()));
    #[cfg(feature = "audio")]
    return Some(Arc::new(SymphoniaAudioBackend::new()));
    None
}

#[allow(unreachable_code)]
fn default_pdf() -> Option<Arc<dyn PdfBackend>> {
    #[cfg(feature = "pdf")]
    return Some(Arc::new(LopdfBackend::new()));
    None
}

#[allow(unreachable_code)]
fn default_video() -> Option<Arc<dyn VideoBackend>> {
    #[cfg(feature = "ffmpeg")]
    return Some(Arc::new(FfmpegVideoBackend::new()));
    #[cfg(feature = "video")]
    return Some(Arc::new(Mp4VideoBackend::new()));
    None
}

/// Seekable byte stream, boxed so file and memory sources share one type
pub(crate) trait ReadSeek: Read + Seek {}

impl<T: Read + Seek> ReadSeek for T {}

/// Boxed reader over a [`MediaSource`], borrowing in-memory content
pub(crate) type SourceReader<'s> = Box<dyn ReadSeek + Send + Sync + 's>;

/// Open a source as a seekable reader, returning it with its byte length
#[allow(dead_code)]
pub(crate) fn open_reader<'s>(source: &'s MediaSource<'_>) -> Result<(SourceReader<'s>, u64)> {
    match source {
        MediaSource::File(path) => {
            let file = File::open(path)?;
            let len = file.metadata()?.len();
            Ok((Box::new(BufReader::new(file)), len))
        }
        MediaSource::Memory(bytes) => {
            let bytes: &'s [u8] = bytes.as_ref();
            Ok((Box::new(Cursor::new(bytes)), bytes.len() as u64))
        }
    }
}

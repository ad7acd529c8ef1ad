//! FFmpeg demuxer backends (feature `ffmpeg`)
//!
//! Uses ac-ffmpeg to open any container FFmpeg understands. Only stream
//! headers are read; no packets are decoded.
//!
//! Key ac-ffmpeg API elements used:
//! - `Demuxer::builder().build(io)?.find_stream_info(None)`
//! - `Stream::duration()` / `Stream::frames()`
//! - `CodecParameters::is_audio_codec()` / `is_video_codec()`
//!
//! Streams expose no frame-rate field, so the video rate is the recorded
//! frame count over the stream duration.

use std::time::Duration;

use ac_ffmpeg::format::demuxer::{Demuxer, DemuxerWithStreamInfo};
use ac_ffmpeg::format::io::IO;
use ac_ffmpeg::format::stream::Stream;

use super::{
    open_reader, AudioBackend, ProbeError, Result, SourceReader, VideoBackend, VideoStream,
};
use crate::input::MediaSource;

fn open_demuxer<'s>(
    source: &'s MediaSource<'_>,
) -> Result<DemuxerWithStreamInfo<SourceReader<'s>>> {
    let (reader, _) = open_reader(source)?;
    let io = IO::from_seekable_read_stream(reader);

    Demuxer::builder()
        .build(io)
        .map_err(|e| ProbeError::Open(format!("failed to create demuxer: {}", e)))?
        .find_stream_info(None)
        .map_err(|(_, e)| ProbeError::Open(format!("failed to find stream info: {}", e)))
}

/// Stream duration in seconds, `None` when the container does not record one
fn stream_seconds(stream: &Stream) -> Option<f64> {
    stream.duration().as_f64()
}

/// Audio backend reading the first audio stream's duration
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegAudioBackend;

impl FfmpegAudioBackend {
    /// Create the backend
    pub fn new() -> Self {
        Self
    }
}

impl AudioBackend for FfmpegAudioBackend {
    fn duration(&self, source: &MediaSource<'_>) -> Result<Duration> {
        let demuxer = open_demuxer(source)?;

        let stream = demuxer
            .streams()
            .iter()
            .find(|s| s.codec_parameters().is_audio_codec())
            .ok_or(ProbeError::MissingTrack("audio"))?;

        let seconds = stream_seconds(stream)
            .ok_or_else(|| ProbeError::Decode("audio stream has no duration".to_string()))?;

        Ok(Duration::from_secs_f64(seconds.max(0.0)))
    }
}

/// Video backend reading frame count and frame rate from stream headers
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegVideoBackend;

impl FfmpegVideoBackend {
    /// Create the backend
    pub fn new() -> Self {
        Self
    }
}

impl VideoBackend for FfmpegVideoBackend {
    fn open<'s>(&self, source: &'s MediaSource<'_>) -> Result<Box<dyn VideoStream + 's>> {
        let demuxer = open_demuxer(source)?;

        let index = demuxer
            .streams()
            .iter()
            .position(|s| s.codec_parameters().is_video_codec())
            .ok_or(ProbeError::MissingTrack("video"))?;

        Ok(Box::new(FfmpegVideoStream {
            demuxer: Some(demuxer),
            index,
        }))
    }
}

struct FfmpegVideoStream<'s> {
    demuxer: Option<DemuxerWithStreamInfo<SourceReader<'s>>>,
    index: usize,
}

impl FfmpegVideoStream<'_> {
    fn stream(&self) -> Result<&Stream> {
        self.demuxer
            .as_ref()
            .and_then(|d| d.streams().get(self.index))
            .ok_or(ProbeError::MissingTrack("video"))
    }
}

impl VideoStream for FfmpegVideoStream<'_> {
    fn frame_count(&self) -> Result<f64> {
        self.stream()?
            .frames()
            .filter(|&frames| frames > 0)
            .map(|frames| frames as f64)
            .ok_or_else(|| ProbeError::Decode("video stream has no frame count".to_string()))
    }

    fn frame_rate(&self) -> Result<f64> {
        let seconds = stream_seconds(self.stream()?)
            .filter(|&s| s > 0.0)
            .ok_or_else(|| ProbeError::Decode("video stream has no duration".to_string()))?;
        Ok(self.frame_count()? / seconds)
    }

    fn release(&mut self) {
        self.demuxer = None;
    }
}

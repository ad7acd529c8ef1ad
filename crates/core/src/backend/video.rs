//! MP4 track reader
//!
//! Parses the `moov` box of ISO-BMFF files and reads the sample count and
//! media duration of the first video track. The frame rate is derived from
//! the track's `mdhd` timescale and duration, so fractional rates such as
//! 30000/1001 stay exact. The reader stays open until the stream is
//! released.

use mp4::{Mp4Reader, Mp4Track, TrackType};

use super::{open_reader, ProbeError, Result, SourceReader, VideoBackend, VideoStream};
use crate::input::MediaSource;

/// Video backend for MP4/MOV containers
#[derive(Debug, Clone, Copy, Default)]
pub struct Mp4VideoBackend;

impl Mp4VideoBackend {
    /// Create the backend
    pub fn new() -> Self {
        Self
    }
}

impl VideoBackend for Mp4VideoBackend {
    fn open<'s>(&self, source: &'s MediaSource<'_>) -> Result<Box<dyn VideoStream + 's>> {
        let (reader, size) = open_reader(source)?;
        let reader =
            Mp4Reader::read_header(reader, size).map_err(|e| ProbeError::Open(e.to_string()))?;

        let track_id = reader
            .tracks()
            .iter()
            .filter(|(_, track)| matches!(track.track_type(), Ok(TrackType::Video)))
            .map(|(id, _)| *id)
            .min()
            .ok_or(ProbeError::MissingTrack("video"))?;

        Ok(Box::new(Mp4VideoStream {
            reader: Some(reader),
            track_id,
        }))
    }
}

struct Mp4VideoStream<'s> {
    reader: Option<Mp4Reader<SourceReader<'s>>>,
    track_id: u32,
}

impl Mp4VideoStream<'_> {
    fn track(&self) -> Result<&Mp4Track> {
        self.reader
            .as_ref()
            .and_then(|reader| reader.tracks().get(&self.track_id))
            .ok_or(ProbeError::MissingTrack("video"))
    }
}

/// Number of samples, summed over fragments for fragmented files
fn track_sample_count(track: &Mp4Track) -> Result<u64> {
    if track.trafs.is_empty() {
        return Ok(u64::from(track.trak.mdia.minf.stbl.stsz.sample_count));
    }

    Ok(track
        .trafs
        .iter()
        .filter_map(|traf| traf.trun.as_ref())
        .map(|trun| u64::from(trun.sample_count))
        .sum())
}

/// Frames per second from the sample count and the `mdhd` clock.
///
/// `Mp4Track::frame_rate` truncates to whole frames and divides by the
/// timescale unchecked, so the header fields are read directly. Sample
/// counts are summed in `u64` for the same reason.
fn track_frame_rate(track: &Mp4Track) -> Result<f64> {
    let mdhd = &track.trak.mdia.mdhd;
    if mdhd.timescale == 0 {
        return Err(ProbeError::Decode("video track has a zero timescale".to_string()));
    }
    if mdhd.duration == 0 {
        return Err(ProbeError::Decode("video track has no duration".to_string()));
    }

    let seconds = mdhd.duration as f64 / mdhd.timescale as f64;
    Ok(track_sample_count(track)? as f64 / seconds)
}

impl VideoStream for Mp4VideoStream<'_> {
    fn frame_count(&self) -> Result<f64> {
        Ok(track_sample_count(self.track()?)? as f64)
    }

    fn frame_rate(&self) -> Result<f64> {
        track_frame_rate(self.track()?)
    }

    fn release(&mut self) {
        self.reader = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fixtures::mp4_bytes;

    #[test]
    fn test_not_an_mp4() {
        let backend = Mp4VideoBackend::new();
        let source = MediaSource::from(vec![0xAB; 32]);
        assert!(backend.open(&source).is_err());
    }

    #[test]
    fn test_fractional_frame_rate_is_not_truncated() {
        // 300 frames at 30000/1001 fps = 10.01 s
        let source = MediaSource::from(mp4_bytes(300, 30000, 1001));
        let stream = Mp4VideoBackend::new().open(&source).unwrap();

        assert_eq!(stream.frame_count().unwrap(), 300.0);
        let fps = stream.frame_rate().unwrap();
        assert!((fps - 30000.0 / 1001.0).abs() < 1e-9, "fps {}", fps);
        assert!((300.0 / fps - 10.01).abs() < 1e-9);
    }

    #[test]
    fn test_release_drops_reader() {
        let source = MediaSource::from(mp4_bytes(30, 30, 1));
        let mut stream = Mp4VideoBackend::new().open(&source).unwrap();
        assert_eq!(stream.frame_rate().unwrap(), 30.0);

        stream.release();
        assert!(matches!(
            stream.frame_count(),
            Err(ProbeError::MissingTrack("video"))
        ));
    }
}

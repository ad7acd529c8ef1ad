//! Symphonia-backed audio duration reader
//!
//! Reads container headers for the default track's frame count and time
//! base. Containers that do not record a frame count (some MP3/ADTS streams)
//! fall back to summing packet durations, which reads through the file
//! without decoding samples.

use std::fs::File;
use std::io::Cursor;
use std::time::Duration;

use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::{MediaSource as SymphoniaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::units::TimeBase;

use super::{AudioBackend, ProbeError, Result};
use crate::input::MediaSource;

/// Audio backend over Symphonia's format readers
#[derive(Debug, Clone, Copy, Default)]
pub struct SymphoniaAudioBackend;

impl SymphoniaAudioBackend {
    /// Create the backend
    pub fn new() -> Self {
        Self
    }

    fn open(&self, source: &MediaSource<'_>) -> Result<Box<dyn FormatReader>> {
        let inner: Box<dyn SymphoniaSource> = match source {
            MediaSource::File(path) => Box::new(File::open(path)?),
            MediaSource::Memory(bytes) => Box::new(Cursor::new(bytes.to_vec())),
        };
        let stream = MediaSourceStream::new(inner, Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = source.extension() {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                stream,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| ProbeError::Open(e.to_string()))?;

        Ok(probed.format)
    }
}

impl AudioBackend for SymphoniaAudioBackend {
    fn duration(&self, source: &MediaSource<'_>) -> Result<Duration> {
        let mut format = self.open(source)?;

        let track = format
            .default_track()
            .ok_or(ProbeError::MissingTrack("audio"))?;
        let track_id = track.id;
        let params = track.codec_params.clone();

        let time_base = params
            .time_base
            .or_else(|| params.sample_rate.map(|rate| TimeBase::new(1, rate)))
            .ok_or_else(|| ProbeError::Decode("track has no time base".to_string()))?;

        let frames = match params.n_frames {
            Some(n) => n,
            None => {
                tracing::debug!("no frame count in header, summing packet durations");
                count_packet_frames(format.as_mut(), track_id)?
            }
        };

        let time = time_base.calc_time(frames);
        Ok(Duration::from_secs(time.seconds) + Duration::from_secs_f64(time.frac))
    }
}

fn count_packet_frames(format: &mut dyn FormatReader, track_id: u32) -> Result<u64> {
    let mut total = 0u64;
    loop {
        match format.next_packet() {
            Ok(packet) => {
                if packet.track_id() == track_id {
                    total += packet.dur;
                }
            }
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(ProbeError::Decode(e.to_string())),
        }
    }

    if total == 0 {
        return Err(ProbeError::Decode("no audio packets found".to_string()));
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wav_bytes(seconds: u32, sample_rate: u32) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for _ in 0..(seconds * sample_rate) {
                writer.write_sample(0i16).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_wav_duration_from_memory() {
        let backend = SymphoniaAudioBackend::new();
        let bytes = wav_bytes(3, 8000);
        let duration = backend.duration(&MediaSource::from(bytes)).unwrap();
        assert_eq!(duration.as_secs(), 3);
    }

    #[test]
    fn test_garbage_is_an_open_error() {
        let backend = SymphoniaAudioBackend::new();
        let result = backend.duration(&MediaSource::from(vec![0u8; 64]));
        assert!(matches!(result, Err(ProbeError::Open(_))));
    }
}

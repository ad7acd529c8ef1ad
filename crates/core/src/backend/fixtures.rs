//! Media fixtures shared by backend unit tests

use std::io::Cursor;

use bytes::Bytes;
use mp4::{AvcConfig, MediaConfig, Mp4Config, Mp4Sample, Mp4Writer, TrackConfig, TrackType};

/// H.264 track with `samples` frames of `sample_duration` ticks each
pub(crate) fn mp4_bytes(samples: u32, timescale: u32, sample_duration: u32) -> Vec<u8> {
    let config = Mp4Config {
        major_brand: "isom".parse().unwrap(),
        minor_version: 512,
        compatible_brands: vec!["isom".parse().unwrap(), "avc1".parse().unwrap()],
        timescale: 1000,
    };
    let mut writer = Mp4Writer::write_start(Cursor::new(Vec::new()), &config).unwrap();
    writer
        .add_track(&TrackConfig {
            track_type: TrackType::Video,
            timescale,
            language: "und".to_string(),
            media_conf: MediaConfig::AvcConfig(AvcConfig {
                width: 320,
                height: 240,
                seq_param_set: vec![0x67, 0x42, 0xc0, 0x1e, 0xd9, 0x00],
                pic_param_set: vec![0x68, 0xce, 0x3c, 0x80],
            }),
        })
        .unwrap();

    for i in 0..samples {
        let sample = Mp4Sample {
            start_time: u64::from(i) * u64::from(sample_duration),
            duration: sample_duration,
            rendering_offset: 0,
            is_sync: i == 0,
            bytes: Bytes::from_static(&[0, 0, 0, 1, 0x65]),
        };
        writer.write_sample(1, &sample).unwrap();
    }
    writer.write_end().unwrap();
    writer.into_writer().into_inner()
}

//! Headerless raw PCM: 44100 Hz, signed 16-bit little-endian, two channels,
//! interleaved. Both the input track format and the offline export format.

use crate::audio_data::{AudioTrack, StereoSample};
use crate::error::Result;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Loads a raw PCM file as a source track. Trailing bytes that do not form a
/// whole stereo frame are ignored.
pub fn load_raw(path: &str, sample_rate: u32) -> Result<AudioTrack> {
    let bytes = fs::read(path)?;
    let samples: Vec<StereoSample> = bytes
        .chunks_exact(4)
        .map(|b| {
            StereoSample::new(
                i16::from_le_bytes([b[0], b[1]]),
                i16::from_le_bytes([b[2], b[3]]),
            )
        })
        .collect();
    AudioTrack::new(samples, sample_rate)
}

/// Writes finalized samples in the identical raw format, suitable for muxing
/// into an exported video with external tools.
pub fn write_raw<P: AsRef<Path>>(path: P, samples: &[StereoSample]) -> Result<()> {
    let mut bytes = Vec::with_capacity(samples.len() * 4);
    for s in samples {
        bytes.extend_from_slice(&s.left.to_le_bytes());
        bytes.extend_from_slice(&s.right.to_le_bytes());
    }
    let mut file = fs::File::create(path)?;
    file.write_all(&bytes)?;
    Ok(())
}

mod decoded_loader;
mod raw_loader;
mod resampler;

use crate::error::{HyperVerbError, Result};
pub use decoded_loader::load_decoded;
pub use raw_loader::{load_raw, write_raw};
pub use resampler::StereoResampler;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// One stereo frame of the fixed output format: signed 16-bit, two channels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StereoSample {
    pub left: i16,
    pub right: i16,
}

impl StereoSample {
    pub const SILENCE: StereoSample = StereoSample { left: 0, right: 0 };

    pub fn new(left: i16, right: i16) -> Self {
        Self { left, right }
    }

    /// Amplitude of channel 0 (left) or 1 (right).
    pub fn channel(&self, ch: usize) -> i16 {
        if ch == 0 { self.left } else { self.right }
    }
}

/// The pre-recorded source track, loaded fully into memory and immutable for
/// the process lifetime. The track loops: reads wrap modulo its length.
#[derive(Debug)]
pub struct AudioTrack {
    samples: Vec<StereoSample>,
    sample_rate: u32,
}

impl AudioTrack {
    pub fn new(samples: Vec<StereoSample>, sample_rate: u32) -> Result<Self> {
        if samples.is_empty() {
            return Err(HyperVerbError::AudioFormat(
                "source track contains no samples".to_string(),
            ));
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Loads a source track. A `.raw` extension selects the headerless-PCM
    /// path (44100 Hz s16le interleaved stereo); anything else goes through
    /// the Symphonia decoder and is converted to the engine's rate.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded; callers are
    /// expected to report it and leave the feature inactive.
    pub fn from_path(path: &str, engine_rate: u32) -> Result<Arc<Self>> {
        let is_raw = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("raw"));

        let track = if is_raw {
            load_raw(path, engine_rate)?
        } else {
            load_decoded(path, engine_rate)?
        };
        log::info!(
            "loaded source track {} ({} samples, {} Hz)",
            path,
            track.len(),
            track.sample_rate()
        );
        Ok(Arc::new(track))
    }

    pub fn samples(&self) -> &[StereoSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate as f64)
    }

    /// Sample lookup wrapped modulo the track length; negative indices wrap
    /// backwards from the end. This is the Doppler read primitive.
    pub fn wrapped(&self, index: i64) -> StereoSample {
        let len = self.samples.len() as i64;
        self.samples[index.rem_euclid(len) as usize]
    }

    /// Largest absolute amplitude across both channels. Unsigned because
    /// `|i16::MIN|` does not fit in i16.
    pub fn peak(&self) -> u16 {
        self.samples
            .iter()
            .map(|s| s.left.unsigned_abs().max(s.right.unsigned_abs()))
            .max()
            .unwrap_or(0)
    }
}

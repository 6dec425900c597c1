use crate::error::{HyperVerbError, Result};
use rubato::{FftFixedIn, Resampler};

/// Fixed-chunk FFT resampler for interleaved stereo f32 buffers, used by the
/// decoded loading path when the file rate differs from the engine rate.
pub struct StereoResampler {
    source_rate: u32,
    target_rate: u32,
    chunk_size: usize,
}

impl StereoResampler {
    pub fn new(source_rate: u32, target_rate: u32) -> Result<Self> {
        if source_rate == 0 || target_rate == 0 {
            return Err(HyperVerbError::AudioFormat(
                "sample rates must be greater than 0".to_string(),
            ));
        }
        Ok(Self {
            source_rate,
            target_rate,
            chunk_size: 1024,
        })
    }

    pub fn source_rate(&self) -> u32 {
        self.source_rate
    }

    pub fn target_rate(&self) -> u32 {
        self.target_rate
    }

    /// Resamples an interleaved stereo buffer to the target rate.
    pub fn resample_interleaved(&self, interleaved: &[f32]) -> Result<Vec<f32>> {
        if self.source_rate == self.target_rate {
            return Ok(interleaved.to_vec());
        }

        let mut resampler = FftFixedIn::<f32>::new(
            self.source_rate as usize,
            self.target_rate as usize,
            self.chunk_size,
            2, // sub_chunks
            2, // stereo
        )
        .map_err(|e| HyperVerbError::AudioLoading(format!("failed to create resampler: {}", e)))?;

        let frames = interleaved.len() / 2;
        let mut left = Vec::with_capacity(frames);
        let mut right = Vec::with_capacity(frames);
        for frame in interleaved.chunks_exact(2) {
            left.push(frame[0]);
            right.push(frame[1]);
        }

        let mut out_left = Vec::new();
        let mut out_right = Vec::new();
        let mut index = 0;
        while index < frames {
            let take = (frames - index).min(self.chunk_size);
            let mut chunk = vec![vec![0.0f32; self.chunk_size]; 2];
            chunk[0][..take].copy_from_slice(&left[index..index + take]);
            chunk[1][..take].copy_from_slice(&right[index..index + take]);

            let waves_out = resampler
                .process(&chunk, None)
                .map_err(|e| HyperVerbError::AudioLoading(format!("resampling error: {}", e)))?;
            out_left.extend_from_slice(&waves_out[0]);
            out_right.extend_from_slice(&waves_out[1]);

            index += take;
        }

        let mut out = Vec::with_capacity(out_left.len() * 2);
        for (l, r) in out_left.iter().zip(out_right.iter()) {
            out.push(*l);
            out.push(*r);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resampler_creation() {
        let resampler = StereoResampler::new(48000, 44100).unwrap();
        assert_eq!(resampler.source_rate(), 48000);
        assert_eq!(resampler.target_rate(), 44100);
    }

    #[test]
    fn test_invalid_rates_rejected() {
        assert!(StereoResampler::new(0, 44100).is_err());
        assert!(StereoResampler::new(44100, 0).is_err());
    }

    #[test]
    fn test_same_rate_passthrough() {
        let resampler = StereoResampler::new(44100, 44100).unwrap();
        let samples = vec![0.1, -0.1, 0.2, -0.2];
        assert_eq!(resampler.resample_interleaved(&samples).unwrap(), samples);
    }

    #[test]
    fn test_resampled_length_tracks_ratio() {
        let resampler = StereoResampler::new(22050, 44100).unwrap();
        let frames = 4096;
        let input: Vec<f32> = (0..frames * 2).map(|i| (i as f32 * 0.01).sin()).collect();
        let output = resampler.resample_interleaved(&input).unwrap();
        let out_frames = output.len() / 2;
        // Chunked FFT resampling pads the tail, so allow one chunk of slack.
        assert!(out_frames >= frames * 2 - 2048 && out_frames <= frames * 2 + 2048);
    }
}

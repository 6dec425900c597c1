//! Decoded loading path: any format Symphonia can probe, converted to the
//! engine's fixed stereo s16 layout.

use crate::audio_data::{AudioTrack, StereoResampler, StereoSample};
use crate::error::{HyperVerbError, Result};
use std::fs::File;
use std::path::Path;
use symphonia::{
    core::{
        audio::SampleBuffer, codecs::DecoderOptions, errors::Error, formats::FormatOptions,
        io::MediaSourceStream, meta::MetadataOptions, probe::Hint,
    },
    default::{get_codecs, get_probe},
};

/// Decodes an audio file into a source track at `engine_rate`.
///
/// Mono input is duplicated to both channels; for more than two channels the
/// first two are used. A rate mismatch goes through the FFT resampler.
pub fn load_decoded(path: &str, engine_rate: u32) -> Result<AudioTrack> {
    let file = File::open(path)?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = Path::new(path).extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| {
            HyperVerbError::AudioLoading(format!("failed to probe audio format: {:?}", e))
        })?;

    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| HyperVerbError::AudioLoading("no default audio track found".to_string()))?;

    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| HyperVerbError::AudioLoading("sample rate not found".to_string()))?;

    let channels = track
        .codec_params
        .channels
        .ok_or_else(|| HyperVerbError::AudioLoading("channel count not found".to_string()))?
        .count();

    let mut decoder = get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| HyperVerbError::AudioLoading(format!("failed to create decoder: {:?}", e)))?;

    let mut samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(Error::IoError(_)) => break, // end-of-file
            Err(e) => {
                return Err(HyperVerbError::AudioLoading(format!(
                    "error reading packet: {:?}",
                    e
                )));
            }
        };

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(Error::IoError(_)) => break, // also EOF in some formats
            Err(Error::DecodeError(_)) => continue, // recoverable corruption
            Err(e) => {
                return Err(HyperVerbError::AudioLoading(format!(
                    "error decoding packet: {:?}",
                    e
                )));
            }
        };

        let spec = *decoded.spec();
        let capacity = decoded.capacity();
        let mut tmp = SampleBuffer::<f32>::new(capacity as u64, spec);
        tmp.copy_interleaved_ref(decoded);
        samples.extend_from_slice(tmp.samples());
    }

    let stereo = to_stereo(&samples, channels);

    let stereo = if sample_rate != engine_rate {
        log::info!(
            "resampling decoded track from {} Hz to {} Hz",
            sample_rate,
            engine_rate
        );
        StereoResampler::new(sample_rate, engine_rate)?.resample_interleaved(&stereo)?
    } else {
        stereo
    };

    let quantized: Vec<StereoSample> = stereo
        .chunks_exact(2)
        .map(|frame| {
            StereoSample::new(
                (frame[0].clamp(-1.0, 1.0) * i16::MAX as f32) as i16,
                (frame[1].clamp(-1.0, 1.0) * i16::MAX as f32) as i16,
            )
        })
        .collect();

    AudioTrack::new(quantized, engine_rate)
}

fn to_stereo(interleaved: &[f32], channels: usize) -> Vec<f32> {
    match channels {
        0 => Vec::new(),
        1 => interleaved.iter().flat_map(|s| [*s, *s]).collect(),
        2 => interleaved.to_vec(),
        n => interleaved
            .chunks_exact(n)
            .flat_map(|frame| [frame[0], frame[1]])
            .collect(),
    }
}

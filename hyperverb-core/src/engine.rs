//! Platform audio output bridge.
//!
//! Owns the cpal output stream and drains the shared playback buffer from
//! the device callback. If the device cannot be opened the session simply
//! continues without live output; mixing still runs and offline export
//! remains available.

use crate::audio_data::StereoSample;
use crate::config::EngineDesc;
use crate::error::{HyperVerbError, Result};
use crate::playback::PlaybackShared;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SizedSample};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub struct AudioEngine {
    desc: EngineDesc,
    stream: Option<cpal::Stream>,
    is_running: Arc<AtomicBool>,
    shared: Arc<PlaybackShared>,
}

impl AudioEngine {
    pub fn new(desc: EngineDesc, shared: Arc<PlaybackShared>) -> Self {
        Self {
            desc,
            stream: None,
            is_running: Arc::new(AtomicBool::new(false)),
            shared,
        }
    }

    /// Opens the default output device and starts draining the playback
    /// buffer at the fixed sample rate.
    pub fn start(&mut self) -> Result<()> {
        if self.is_running.load(Ordering::Relaxed) {
            return Ok(());
        }

        let host = cpal::default_host();
        let device = host.default_output_device().ok_or_else(|| {
            HyperVerbError::AudioDevice("no default output device available".into())
        })?;

        let config = cpal::StreamConfig {
            channels: self.desc.channels,
            sample_rate: cpal::SampleRate(self.desc.sample_rate),
            buffer_size: cpal::BufferSize::Fixed(self.desc.block_size as u32),
        };

        let default_config = device.default_output_config().map_err(|e| {
            HyperVerbError::AudioDevice(format!("failed to get default config: {}", e))
        })?;

        let stream = match default_config.sample_format() {
            cpal::SampleFormat::F32 => self.create_stream::<f32>(&device, &config)?,
            cpal::SampleFormat::I16 => self.create_stream::<i16>(&device, &config)?,
            cpal::SampleFormat::U16 => self.create_stream::<u16>(&device, &config)?,
            _ => {
                return Err(HyperVerbError::AudioFormat(
                    "unsupported sample format".into(),
                ));
            }
        };

        stream
            .play()
            .map_err(|e| HyperVerbError::AudioDevice(format!("failed to start stream: {}", e)))?;

        log::info!(
            "audio output started ({} Hz, {} channels, block {})",
            self.desc.sample_rate,
            self.desc.channels,
            self.desc.block_size
        );

        self.stream = Some(stream);
        self.is_running.store(true, Ordering::Relaxed);
        Ok(())
    }

    pub fn stop(&mut self) -> Result<()> {
        if let Some(stream) = self.stream.take() {
            self.is_running.store(false, Ordering::Relaxed);
            drop(stream);
        }
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::Relaxed)
    }

    pub fn desc(&self) -> &EngineDesc {
        &self.desc
    }

    fn create_stream<T>(
        &self,
        device: &cpal::Device,
        config: &cpal::StreamConfig,
    ) -> Result<cpal::Stream>
    where
        T: SizedSample + FromSample<i16>,
    {
        let channels = self.desc.channels as usize;
        let shared = self.shared.clone();
        let is_running = self.is_running.clone();

        let stream = device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    if !is_running.load(Ordering::Relaxed) {
                        for sample in data.iter_mut() {
                            *sample = T::from_sample(0i16);
                        }
                        return;
                    }

                    let frames = data.len() / channels;
                    let mut buffer = vec![StereoSample::SILENCE; frames];
                    shared.fill(&mut buffer);

                    for (frame, out) in buffer.iter().zip(data.chunks_mut(channels)) {
                        for (ch, sample) in out.iter_mut().enumerate() {
                            *sample = T::from_sample(frame.channel(ch.min(1)));
                        }
                    }
                },
                move |err| {
                    log::error!("audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| HyperVerbError::AudioDevice(format!("failed to build stream: {}", e)))?;

        Ok(stream)
    }
}

impl Drop for AudioEngine {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

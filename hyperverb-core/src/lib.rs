//! Positional audio for non-Euclidean worlds: a looping source track is
//! re-emitted from every visible cell of the tiling, with geometry-aware
//! attenuation, per-ear delay (Doppler included) and echo images. The host
//! renderer reports cell visibility each frame; the mixer turns those
//! reports into a continuous stereo stream played through cpal or exported
//! as raw PCM.

pub mod audio_data;
pub mod config;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod mixer;
pub mod playback;
pub mod tracker;

pub use audio_data::{AudioTrack, StereoSample};
pub use config::{EngineDesc, MixLimits, ParamCommand, ParamStore, ReverbParams};
pub use engine::AudioEngine;
pub use error::HyperVerbError;
pub use geometry::Geometry;
pub use mixer::ReverbMixer;
pub use playback::PlaybackShared;
pub use tracker::{CellId, CellInfo, CellTracker};

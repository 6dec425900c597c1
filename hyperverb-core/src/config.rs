//! Configuration for HyperVerb

use crate::geometry::Geometry;
use crossbeam_channel::{Receiver, Sender, unbounded};

/// Fixed properties of the audio engine and output stream.
#[derive(Debug, Clone)]
pub struct EngineDesc {
    pub sample_rate: u32,
    pub channels: u16,
    pub block_size: usize,
}

impl Default for EngineDesc {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 2,
            block_size: 4096,
        }
    }
}

impl EngineDesc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sample_rate(mut self, rate: u32) -> Self {
        self.sample_rate = rate;
        self
    }

    pub fn block_size(mut self, size: usize) -> Self {
        self.block_size = size;
        self
    }
}

/// Tunable physical parameters of the simulation. Live-tunable through
/// [`ParamStore`]; read by the mixer once per frame.
#[derive(Debug, Clone)]
pub struct ReverbParams {
    /// Fraction of sound energy lost per unit of topological distance, in [0,1].
    pub absorption: f64,
    /// Seconds for sound to cross one absolute geometric unit (reciprocal speed).
    pub speed_of_sound: f64,
    /// Offset of each ear from the listener's center, along the lateral axis.
    pub interaural_distance: f64,
    /// Cap on the per-channel attenuation factor near distance zero.
    pub max_gain: f64,
    /// Manual floor for the normalization divisor. Larger means quieter;
    /// raised automatically whenever the mix gets louder.
    pub volume_divisor: f64,
}

impl Default for ReverbParams {
    fn default() -> Self {
        Self {
            absorption: 0.1,
            speed_of_sound: 0.25,
            interaural_distance: 0.05,
            max_gain: 5.0,
            volume_divisor: 1.0,
        }
    }
}

/// Quality/performance thresholds of the mix step. Their values are tuning
/// choices, not consequences of the acoustic model.
#[derive(Debug, Clone)]
pub struct MixLimits {
    /// Real-time gaps longer than this are treated as pause/resume
    /// discontinuities and skipped instead of backfilled.
    pub discontinuity_gap_secs: f64,
    /// Topological visibility radius for real-time mixing.
    pub realtime_radius: u32,
    /// Wider radius on spherical geometry, where wrap-around paths matter.
    pub realtime_radius_spherical: u32,
    /// Number of wrap-around image copies summed on spherical geometry.
    pub spherical_images: u32,
    /// Extra topological distance per image copy.
    pub image_spacing: f64,
    /// Extra geometric phase per image copy in the delay computation.
    pub image_phase: f64,
}

impl Default for MixLimits {
    fn default() -> Self {
        Self {
            discontinuity_gap_secs: 1.0,
            realtime_radius: 2,
            realtime_radius_spherical: 3,
            spherical_images: 10,
            image_spacing: 3.0,
            image_phase: std::f64::consts::PI,
        }
    }
}

impl MixLimits {
    /// Visibility radius for the given geometry.
    pub fn radius_for(&self, geometry: Geometry) -> u32 {
        if geometry == Geometry::Spherical {
            self.realtime_radius_spherical
        } else {
            self.realtime_radius
        }
    }

    /// Image copies summed for the given geometry (1 everywhere but the sphere).
    pub fn images_for(&self, geometry: Geometry) -> u32 {
        if geometry == Geometry::Spherical {
            self.spherical_images
        } else {
            1
        }
    }
}

/// Parameter mutations sent from the settings UI to the render thread.
#[derive(Debug, Clone)]
pub enum ParamCommand {
    SetAbsorption(f64),
    SetSpeedOfSound(f64),
    SetInterauralDistance(f64),
    SetVolumeDivisor(f64),
    /// Snap the playback cursor to the current mix position to correct drift.
    Resync,
}

/// Owns the live [`ReverbParams`] and the channel the settings UI mutates
/// them through. `apply_pending` runs on the render thread once per frame;
/// the UI side only ever touches the [`Sender`].
pub struct ParamStore {
    params: ReverbParams,
    sender: Sender<ParamCommand>,
    receiver: Receiver<ParamCommand>,
    resync_requested: bool,
}

impl ParamStore {
    pub fn new(params: ReverbParams) -> Self {
        let (sender, receiver) = unbounded();
        Self {
            params,
            sender,
            receiver,
            resync_requested: false,
        }
    }

    pub fn params(&self) -> &ReverbParams {
        &self.params
    }

    /// Handle for the settings UI.
    pub fn sender(&self) -> Sender<ParamCommand> {
        self.sender.clone()
    }

    /// Drains queued commands into the live parameters. Returns true if a
    /// resynchronization was requested since the last call.
    pub fn apply_pending(&mut self) -> bool {
        while let Ok(cmd) = self.receiver.try_recv() {
            log::debug!("applying parameter command {:?}", cmd);
            match cmd {
                ParamCommand::SetAbsorption(v) => self.params.absorption = v.clamp(0.0, 1.0),
                ParamCommand::SetSpeedOfSound(v) => self.params.speed_of_sound = v,
                ParamCommand::SetInterauralDistance(v) => self.params.interaural_distance = v,
                ParamCommand::SetVolumeDivisor(v) => self.params.volume_divisor = v.max(1.0),
                ParamCommand::Resync => self.resync_requested = true,
            }
        }
        std::mem::take(&mut self.resync_requested)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_store_applies_commands() {
        let mut store = ParamStore::new(ReverbParams::default());
        let tx = store.sender();
        tx.send(ParamCommand::SetAbsorption(0.5)).unwrap();
        tx.send(ParamCommand::SetVolumeDivisor(0.0)).unwrap();
        let resync = store.apply_pending();
        assert!(!resync);
        assert_eq!(store.params().absorption, 0.5);
        // divisor never drops below 1
        assert_eq!(store.params().volume_divisor, 1.0);
    }

    #[test]
    fn test_param_store_resync_is_one_shot() {
        let mut store = ParamStore::new(ReverbParams::default());
        store.sender().send(ParamCommand::Resync).unwrap();
        assert!(store.apply_pending());
        assert!(!store.apply_pending());
    }

    #[test]
    fn test_limits_per_geometry() {
        let limits = MixLimits::default();
        assert_eq!(limits.radius_for(Geometry::Hyperbolic), 2);
        assert_eq!(limits.radius_for(Geometry::Spherical), 3);
        assert_eq!(limits.images_for(Geometry::Euclidean), 1);
        assert_eq!(limits.images_for(Geometry::Spherical), 10);
    }
}

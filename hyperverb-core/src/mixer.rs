//! The reverb mixer: converts tracked binaural distances into per-channel
//! attenuation and delay, and accumulates every visible cell's contribution
//! into the output timeline once per frame.

use crate::audio_data::{AudioTrack, StereoSample, write_raw};
use crate::config::{MixLimits, ReverbParams};
use crate::error::Result;
use crate::geometry::{Geometry, ilerp, lerp};
use crate::playback::PlaybackShared;
use crate::tracker::CellTracker;
use std::path::Path;
use std::sync::Arc;

/// Attenuation of a single image copy at `path_distance` topological units,
/// heard through one ear at geometric distance `binaural`. Divides the
/// absorption law by the geometry's spreading function and caps the result
/// near the distance-zero singularity.
pub fn attenuation(
    geometry: Geometry,
    absorption: f64,
    path_distance: f64,
    binaural: f64,
    max_gain: f64,
) -> f64 {
    let base = (1.0 - absorption).powf(path_distance);
    let att = base / geometry.sin_auto(binaural);
    if !att.is_finite() || att > max_gain {
        log::debug!("attenuation {} capped to {}", att, max_gain);
        max_gain
    } else {
        att
    }
}

pub struct ReverbMixer {
    track: Arc<AudioTrack>,
    geometry: Geometry,
    limits: MixLimits,
    high_quality: bool,
    /// Accumulated stereo contributions indexed by absolute sample-time.
    timeline: Vec<[f64; 2]>,
    prev_t: usize,
    curr_t: usize,
    /// Running maximum magnitude, the normalization divisor. Only ever grows.
    max_volume: f64,
    shared: Arc<PlaybackShared>,
}

impl ReverbMixer {
    pub fn new(
        track: Arc<AudioTrack>,
        geometry: Geometry,
        limits: MixLimits,
        shared: Arc<PlaybackShared>,
    ) -> Self {
        Self {
            track,
            geometry,
            limits,
            high_quality: false,
            timeline: Vec::new(),
            prev_t: 0,
            curr_t: 0,
            max_volume: 1.0,
            shared,
        }
    }

    /// High-quality mode: process every tracked cell regardless of the
    /// visibility radius and silence the live device output. Used for
    /// deterministic offline export.
    pub fn set_high_quality(&mut self, on: bool) {
        self.high_quality = on;
        self.shared.set_offline(on);
    }

    pub fn high_quality(&self) -> bool {
        self.high_quality
    }

    /// Current mix position in absolute samples.
    pub fn mix_position(&self) -> usize {
        self.curr_t
    }

    pub fn max_volume(&self) -> f64 {
        self.max_volume
    }

    /// The accumulated, un-normalized output timeline.
    pub fn timeline(&self) -> &[[f64; 2]] {
        &self.timeline
    }

    /// Snaps the playback cursor to the current mix position.
    pub fn resync(&self) {
        log::info!("resynchronizing playback to sample {}", self.curr_t);
        self.shared.resync_to(self.curr_t);
    }

    /// Seconds of drift between the playback cursor and the mix position.
    pub fn drift_secs(&self) -> f64 {
        (self.shared.cursor() as f64 - self.curr_t as f64) / self.track.sample_rate() as f64
    }

    /// Mixes the frame that just completed: every cell recorded for the
    /// tracker's current frame id contributes over the sample-time window
    /// derived from `now_millis`. Call once per host frame, after all
    /// visibility callbacks.
    pub fn mix_frame(&mut self, tracker: &mut CellTracker, params: &ReverbParams, now_millis: u64) {
        let rate = self.track.sample_rate() as u64;

        self.prev_t = self.curr_t;
        self.curr_t = (now_millis * rate / 1000) as usize;
        // rewound clock: drop the mixed-ahead tail so the window is
        // recomputed in place instead of accumulating a second copy
        if self.prev_t > self.curr_t {
            self.prev_t = self.curr_t;
            self.timeline.truncate(self.curr_t);
        }
        let gap = self.curr_t - self.prev_t;
        if gap as f64 > self.limits.discontinuity_gap_secs * rate as f64 {
            log::debug!(
                "discontinuity of {} samples exceeds the gap limit, skipping frame",
                gap
            );
            return;
        }

        if self.timeline.len() < self.curr_t {
            self.timeline.resize(self.curr_t, [0.0; 2]);
        }

        let frame = tracker.frame_id();
        let radius = self.limits.radius_for(self.geometry);
        let images = self.limits.images_for(self.geometry);
        let track_len = self.track.len() as i64;
        let (prev_t, curr_t) = (self.prev_t, self.curr_t);

        for (_, info) in tracker.cells_mut() {
            if info.curr_frame != frame {
                continue;
            }
            // invisible for at least one frame: do not interpolate across the gap
            if info.last_frame + 1 != info.curr_frame {
                info.last_dist = info.curr_dist;
            }
            if info.topo_distance > radius && !self.high_quality {
                continue;
            }

            for s in 0..images {
                let path_distance = info.topo_distance as f64 + self.limits.image_spacing * s as f64;
                let phase = self.limits.image_phase * s as f64;

                let mut att0 = [0.0f64; 2];
                let mut att1 = [0.0f64; 2];
                for ch in 0..2 {
                    att0[ch] = attenuation(
                        self.geometry,
                        params.absorption,
                        path_distance,
                        info.last_dist[ch],
                        params.max_gain,
                    );
                    att1[ch] = attenuation(
                        self.geometry,
                        params.absorption,
                        path_distance,
                        info.curr_dist[ch],
                        params.max_gain,
                    );
                }

                for ch in 0..2 {
                    for i in prev_t..curr_t {
                        let a = ilerp(prev_t as f64, curr_t as f64, i as f64);
                        let d = lerp(info.last_dist[ch], info.curr_dist[ch], a) + phase;
                        let tim = (i as f64 - d * rate as f64 * params.speed_of_sound) as i64;
                        let source = self.track.wrapped(tim.rem_euclid(track_len));
                        self.timeline[i][ch] +=
                            source.channel(ch) as f64 * lerp(att0[ch], att1[ch], a);
                    }
                }
            }

            info.last_frame = info.curr_frame;
            info.last_dist = info.curr_dist;
        }

        for i in prev_t..curr_t {
            for ch in 0..2 {
                let magnitude = self.timeline[i][ch].abs();
                if magnitude > self.max_volume {
                    self.max_volume = magnitude;
                }
            }
        }

        tracker.advance_frame();

        let divisor = self.max_volume.max(params.volume_divisor);
        let finalized: Vec<StereoSample> = self.timeline[prev_t..curr_t]
            .iter()
            .map(|s| {
                StereoSample::new(
                    (s[0] / divisor * 30000.0) as i16,
                    (s[1] / divisor * 30000.0) as i16,
                )
            })
            .collect();
        self.shared.publish(prev_t, &finalized);
    }

    /// Writes the finalized portion of the timeline as raw PCM, renormalized
    /// with the end-of-run divisor.
    pub fn export_raw<P: AsRef<Path>>(&self, path: P, params: &ReverbParams) -> Result<()> {
        let divisor = self.max_volume.max(params.volume_divisor);
        // a trailing skipped frame can leave curr_t past the timeline end
        let end = self.curr_t.min(self.timeline.len());
        let samples: Vec<StereoSample> = self.timeline[..end]
            .iter()
            .map(|s| {
                StereoSample::new(
                    (s[0] / divisor * 30000.0) as i16,
                    (s[1] / divisor * 30000.0) as i16,
                )
            })
            .collect();
        write_raw(path, &samples)?;
        log::info!("exported {} samples of raw audio", samples.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::CellId;
    use glam::{DMat4, DVec3};

    // 1000 Hz test rate so a millisecond clock maps 1:1 onto sample indices.
    const TEST_RATE: u32 = 1000;

    fn test_track() -> Arc<AudioTrack> {
        Arc::new(
            AudioTrack::new(
                vec![
                    StereoSample::new(100, -100),
                    StereoSample::new(200, -200),
                    StereoSample::new(0, 0),
                    StereoSample::new(0, 0),
                ],
                TEST_RATE,
            )
            .unwrap(),
        )
    }

    fn passthrough_params() -> ReverbParams {
        ReverbParams {
            absorption: 0.0,
            speed_of_sound: 0.0,
            interaural_distance: 0.0,
            ..ReverbParams::default()
        }
    }

    fn at_distance(d: f64) -> DMat4 {
        DMat4::from_translation(DVec3::new(d, 0.0, 0.0))
    }

    fn setup(geometry: Geometry) -> (ReverbMixer, CellTracker, Arc<PlaybackShared>) {
        let shared = Arc::new(PlaybackShared::new());
        let mixer = ReverbMixer::new(test_track(), geometry, MixLimits::default(), shared.clone());
        (mixer, CellTracker::new(geometry), shared)
    }

    #[test]
    fn test_attenuation_monotonic_in_distance_and_absorption() {
        for geometry in [Geometry::Hyperbolic, Geometry::Spherical, Geometry::Euclidean] {
            // spherical spreading refocuses toward the antipode, so only
            // sweep the arc where sin is still widening
            let steps = if geometry == Geometry::Spherical { 13 } else { 40 };
            let mut prev = f64::INFINITY;
            for step in 0..steps {
                let d = 0.2 + step as f64 * 0.1;
                let att = attenuation(geometry, 0.3, d, d, 5.0);
                assert!(att <= prev, "{:?}: attenuation rose with distance", geometry);
                prev = att;
            }
            let mut prev = f64::INFINITY;
            for step in 0..10 {
                let absorption = step as f64 * 0.1;
                let att = attenuation(geometry, absorption, 2.0, 1.0, 5.0);
                assert!(att <= prev, "{:?}: attenuation rose with absorption", geometry);
                prev = att;
            }
        }
    }

    #[test]
    fn test_attenuation_caps_near_zero_distance() {
        assert_eq!(attenuation(Geometry::Euclidean, 0.0, 0.0, 0.0, 5.0), 5.0);
        assert_eq!(attenuation(Geometry::Hyperbolic, 0.0, 0.0, 1e-9, 5.0), 5.0);
    }

    #[test]
    fn test_zero_distance_passthrough() {
        // One cell at topological distance 0, both ears at geometric
        // distance 1 (Euclidean spreading factor 1), no absorption, no
        // sound travel time: the timeline reproduces the source exactly.
        let (mut mixer, mut tracker, _) = setup(Geometry::Euclidean);
        let params = passthrough_params();

        tracker.record_visibility(CellId(1), at_distance(1.0), 0, &params);
        mixer.mix_frame(&mut tracker, &params, 4);

        assert_eq!(mixer.timeline().len(), 4);
        let expected = [[100.0, -100.0], [200.0, -200.0], [0.0, 0.0], [0.0, 0.0]];
        for (i, want) in expected.iter().enumerate() {
            assert_eq!(mixer.timeline()[i], *want, "sample {}", i);
        }
    }

    #[test]
    fn test_empty_window_is_idempotent() {
        let (mut mixer, mut tracker, shared) = setup(Geometry::Euclidean);
        let params = passthrough_params();

        tracker.record_visibility(CellId(1), at_distance(1.0), 0, &params);
        mixer.mix_frame(&mut tracker, &params, 4);
        let timeline_before = mixer.timeline().to_vec();
        let buffered_before = shared.len();

        tracker.record_visibility(CellId(1), at_distance(1.0), 0, &params);
        mixer.mix_frame(&mut tracker, &params, 4);
        assert_eq!(mixer.timeline(), &timeline_before[..]);
        assert_eq!(shared.len(), buffered_before);
    }

    #[test]
    fn test_discontinuity_skips_frame() {
        let (mut mixer, mut tracker, shared) = setup(Geometry::Euclidean);
        let params = passthrough_params();

        tracker.record_visibility(CellId(1), at_distance(1.0), 0, &params);
        mixer.mix_frame(&mut tracker, &params, 2000);
        // the gap exceeded one second of samples: nothing was produced
        assert!(mixer.timeline().is_empty());
        assert_eq!(shared.len(), 0);

        tracker.record_visibility(CellId(1), at_distance(1.0), 0, &params);
        mixer.mix_frame(&mut tracker, &params, 2100);
        // mixing resumed after the discontinuity
        assert_eq!(mixer.timeline().len(), 2100);
        assert_eq!(shared.len(), 2100);
    }

    #[test]
    fn test_gap_reacquisition_resets_distance() {
        // Seen at distance 1, invisible for one frame, reacquired at
        // distance 2: the reacquired frame mixes at the constant far
        // attenuation with no interpolation artifact spanning the gap.
        let (mut mixer, mut tracker, _) = setup(Geometry::Euclidean);
        let params = passthrough_params();

        tracker.record_visibility(CellId(1), at_distance(1.0), 0, &params);
        mixer.mix_frame(&mut tracker, &params, 4);

        // invisible this frame
        mixer.mix_frame(&mut tracker, &params, 8);

        tracker.record_visibility(CellId(1), at_distance(2.0), 0, &params);
        mixer.mix_frame(&mut tracker, &params, 12);

        // distance 2 means attenuation 1/2 across the entire window
        let timeline = mixer.timeline();
        assert_eq!(timeline[8], [100.0 * 0.5, -100.0 * 0.5]);
        assert_eq!(timeline[11], [0.0, 0.0]);
        assert_eq!(timeline[9], [200.0 * 0.5, -200.0 * 0.5]);
    }

    #[test]
    fn test_rewound_clock_remixes_in_place() {
        let (mut mixer, mut tracker, shared) = setup(Geometry::Euclidean);
        let params = passthrough_params();

        tracker.record_visibility(CellId(1), at_distance(1.0), 0, &params);
        mixer.mix_frame(&mut tracker, &params, 4);
        assert_eq!(shared.len(), 4);

        // the clock rewinds to zero: the mixed-ahead range is dropped
        mixer.mix_frame(&mut tracker, &params, 0);
        assert!(mixer.timeline().is_empty());
        assert_eq!(shared.len(), 0);

        // remixing the window produces one copy, not an accumulation
        tracker.record_visibility(CellId(1), at_distance(1.0), 0, &params);
        mixer.mix_frame(&mut tracker, &params, 4);
        assert_eq!(mixer.timeline()[0], [100.0, -100.0]);
        assert_eq!(shared.len(), 4);
    }

    #[test]
    fn test_auto_gain_never_decreases() {
        let (mut mixer, mut tracker, _) = setup(Geometry::Euclidean);
        let params = passthrough_params();

        tracker.record_visibility(CellId(1), at_distance(1.0), 0, &params);
        mixer.mix_frame(&mut tracker, &params, 4);
        let loud = mixer.max_volume();
        assert_eq!(loud, 200.0);

        // a quieter passage (distance 2 halves every contribution)
        tracker.record_visibility(CellId(1), at_distance(2.0), 0, &params);
        mixer.mix_frame(&mut tracker, &params, 8);
        assert_eq!(mixer.max_volume(), loud);
    }

    #[test]
    fn test_spherical_wraparound_images() {
        // A cell at topological distance 0 on the sphere sums 10 image
        // copies, the k-th carrying an extra (1-absorption)^(3k) factor.
        let shared = Arc::new(PlaybackShared::new());
        let mut mixer = ReverbMixer::new(
            test_track(),
            Geometry::Spherical,
            MixLimits::default(),
            shared,
        );
        let mut tracker = CellTracker::new(Geometry::Spherical);
        let params = ReverbParams {
            absorption: 0.5,
            speed_of_sound: 0.0,
            interaural_distance: 0.3,
            ..ReverbParams::default()
        };

        // cell at the listener's own position: both ears at distance iad
        tracker.record_visibility(CellId(1), DMat4::IDENTITY, 0, &params);
        mixer.mix_frame(&mut tracker, &params, 4);

        let spread = (0.3f64).sin();
        let per_image: f64 = (0..10).map(|k| 0.5f64.powf(3.0 * k as f64) / spread).sum();
        let got = mixer.timeline()[0][0];
        assert!(
            (got - 100.0 * per_image).abs() < 1e-9,
            "expected 10 summed images, got {}",
            got
        );
    }

    #[test]
    fn test_radius_cull_and_high_quality() {
        let (mut mixer, mut tracker, _) = setup(Geometry::Euclidean);
        let params = passthrough_params();

        // beyond the real-time radius of 2: culled
        tracker.record_visibility(CellId(1), at_distance(1.0), 3, &params);
        mixer.mix_frame(&mut tracker, &params, 4);
        assert_eq!(mixer.timeline()[0], [0.0, 0.0]);

        // high-quality mode processes it
        mixer.set_high_quality(true);
        tracker.record_visibility(CellId(1), at_distance(1.0), 3, &params);
        mixer.mix_frame(&mut tracker, &params, 8);
        assert_eq!(mixer.timeline()[4], [100.0, -100.0]);
    }

    #[test]
    fn test_silent_export_round_trip() {
        // No contributing cells: the export is byte-identical silence, not
        // an echo of the input track.
        let (mut mixer, mut tracker, _) = setup(Geometry::Euclidean);
        let params = passthrough_params();
        mixer.mix_frame(&mut tracker, &params, 4);
        mixer.mix_frame(&mut tracker, &params, 8);

        let dir = std::env::temp_dir().join("hyperverb_mixer_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("silence.raw");
        mixer.export_raw(&path, &params).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), 8 * 4);
        assert!(bytes.iter().all(|b| *b == 0));
    }

    #[test]
    fn test_resync_snaps_cursor() {
        let (mut mixer, mut tracker, shared) = setup(Geometry::Euclidean);
        let params = passthrough_params();
        tracker.record_visibility(CellId(1), at_distance(1.0), 0, &params);
        mixer.mix_frame(&mut tracker, &params, 4);

        assert_eq!(shared.cursor(), 0);
        mixer.resync();
        assert_eq!(shared.cursor(), 4);
        assert_eq!(mixer.drift_secs(), 0.0);
    }
}

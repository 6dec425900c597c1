mod cli;

use anyhow::Result;
use glam::DMat4;
use hyperverb_core::{
    AudioEngine, CellId, CellTracker, EngineDesc, Geometry, MixLimits, ParamStore, PlaybackShared,
    ReverbMixer, ReverbParams,
};
use hyperverb_vr::VrConfig;
use std::sync::Arc;
use std::time::Duration;

const FRAME_MILLIS: u64 = 16;
const ORBITING_SOURCES: u64 = 7;

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let opts = match cli::Options::parse(std::env::args().skip(1)) {
        Ok(opts) => opts,
        Err(err) => {
            eprintln!("{err}\n\n{}", cli::USAGE);
            std::process::exit(2);
        }
    };
    run(opts)
}

fn run(opts: cli::Options) -> Result<()> {
    let desc = EngineDesc::default();
    let track = hyperverb_core::AudioTrack::from_path(&opts.audio_path, desc.sample_rate)?;
    log::info!(
        "loaded {} ({} samples, {:.2} s)",
        opts.audio_path,
        track.len(),
        track.duration().as_secs_f64()
    );

    let mut params = ReverbParams::default();
    if let Some(v) = opts.absorption {
        params.absorption = v.clamp(0.0, 1.0);
    }
    if let Some(v) = opts.speed_of_sound {
        params.speed_of_sound = v;
    }
    if let Some(v) = opts.interaural_distance {
        params.interaural_distance = v;
    }
    let mut store = ParamStore::new(params);

    let shared = Arc::new(PlaybackShared::new());
    let mut tracker = CellTracker::new(opts.geometry);
    let mut mixer = ReverbMixer::new(track, opts.geometry, MixLimits::default(), shared.clone());
    if opts.high_quality {
        log::info!("high-quality offline mix, live output muted");
        mixer.set_high_quality(true);
    }

    let mut engine = AudioEngine::new(desc, shared);
    let live = !opts.high_quality
        && match engine.start() {
            Ok(()) => true,
            Err(err) => {
                log::warn!("continuing without live output: {err}");
                false
            }
        };

    if opts.vr {
        report_vr_modes(&opts);
    }

    let frames = opts.seconds * 1000 / FRAME_MILLIS;
    log::info!(
        "running {} frames of {} orbiting sources in {:?} geometry",
        frames,
        ORBITING_SOURCES,
        opts.geometry
    );
    for frame in 0..frames {
        if store.apply_pending() {
            mixer.resync();
        }
        record_orbit(&mut tracker, opts.geometry, frame, store.params());
        mixer.mix_frame(&mut tracker, store.params(), frame * FRAME_MILLIS);
        if live {
            std::thread::sleep(Duration::from_millis(FRAME_MILLIS));
        }
    }

    log::info!(
        "mixed {} samples, normalization divisor {:.3}, playback drift {:.3} s",
        mixer.mix_position(),
        mixer.max_volume(),
        mixer.drift_secs()
    );

    if let Some(path) = &opts.export_path {
        mixer.export_raw(path, store.params())?;
        log::info!("exported mix to {path}");
    }
    engine.stop()?;
    Ok(())
}

/// Synthetic scene: sources on two rings around the listener, slowly
/// orbiting so the binaural distances keep changing.
fn record_orbit(tracker: &mut CellTracker, geometry: Geometry, frame: u64, params: &ReverbParams) {
    let t = frame as f64 * FRAME_MILLIS as f64 / 1000.0;
    for k in 0..ORBITING_SOURCES {
        let topo = 1 + (k % 2) as u32;
        let angle = t * 0.4 + k as f64 * std::f64::consts::TAU / ORBITING_SOURCES as f64;
        let ego = DMat4::from_rotation_z(angle) * geometry.xpush(topo as f64);
        tracker.record_visibility(CellId(k), ego, topo, params);
    }
}

/// There is no headset runtime wired into the demo; this reports what the
/// selected configuration would do.
fn report_vr_modes(opts: &cli::Options) {
    let config = VrConfig {
        enabled: true,
        headset: opts.headset_mode,
        eyes: opts.eye_mode,
        mirror: opts.mirror_mode,
        ..VrConfig::default()
    };
    log::info!(
        "VR headset mode '{}': {}",
        config.headset.label(),
        config.headset.description()
    );
    log::info!(
        "VR eye mode '{}': {}",
        config.eyes.label(),
        config.eyes.description()
    );
    log::info!("VR desktop mirror: '{}'", config.mirror.label());
    log::info!(
        "eye projection range: near {} far {}",
        config.near,
        config.far
    );
}

//! Hand-parsed command line options.

use hyperverb_core::Geometry;
use hyperverb_vr::{EyeMode, HeadsetMode, MirrorMode};

pub const USAGE: &str = "\
usage: hyperverb-demo <audio-file> [options]

The audio file is looped as the source sound; .raw files are read as
interleaved stereo i16 little-endian at the engine rate, anything else is
decoded and resampled.

options:
  --geometry h|s|e      hyperbolic (default), spherical or euclidean
  --seconds <n>         how long to run the simulation (default 10)
  --hq                  high-quality offline mix (mutes live output)
  --export <path>       write the normalized mix as .raw at the end
  --vr                  report the VR display configuration
  --vr-mode <h> <e> <s> headset / eyes / screen mode indices
  --absorption <f>      energy fraction lost per cell of distance
  --speed-of-sound <f>  seconds per absolute unit
  --iad <f>             inter-aural distance in absolute units
";

#[derive(Debug, Clone)]
pub struct Options {
    pub audio_path: String,
    pub geometry: Geometry,
    pub seconds: u64,
    pub high_quality: bool,
    pub export_path: Option<String>,
    pub vr: bool,
    pub headset_mode: HeadsetMode,
    pub eye_mode: EyeMode,
    pub mirror_mode: MirrorMode,
    pub absorption: Option<f64>,
    pub speed_of_sound: Option<f64>,
    pub interaural_distance: Option<f64>,
}

fn take_value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String, String> {
    args.next().ok_or_else(|| format!("{flag} needs a value"))
}

fn parse_num<T: std::str::FromStr>(value: &str, flag: &str) -> Result<T, String> {
    value
        .parse()
        .map_err(|_| format!("{flag}: cannot parse {value}"))
}

impl Options {
    pub fn parse(mut args: impl Iterator<Item = String>) -> Result<Options, String> {
        let mut audio_path = None;
        let mut opts = Options {
            audio_path: String::new(),
            geometry: Geometry::Hyperbolic,
            seconds: 10,
            high_quality: false,
            export_path: None,
            vr: false,
            headset_mode: HeadsetMode::default(),
            eye_mode: EyeMode::default(),
            mirror_mode: MirrorMode::default(),
            absorption: None,
            speed_of_sound: None,
            interaural_distance: None,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--geometry" => {
                    opts.geometry = match take_value(&mut args, "--geometry")?.as_str() {
                        "h" => Geometry::Hyperbolic,
                        "s" => Geometry::Spherical,
                        "e" => Geometry::Euclidean,
                        other => return Err(format!("unknown geometry {other}")),
                    };
                }
                "--seconds" => {
                    opts.seconds = parse_num(&take_value(&mut args, "--seconds")?, "--seconds")?;
                }
                "--hq" => opts.high_quality = true,
                "--export" => opts.export_path = Some(take_value(&mut args, "--export")?),
                "--vr" => opts.vr = true,
                "--vr-mode" => {
                    let h: usize = parse_num(&take_value(&mut args, "--vr-mode")?, "--vr-mode")?;
                    let e: usize = parse_num(&take_value(&mut args, "--vr-mode")?, "--vr-mode")?;
                    let s: usize = parse_num(&take_value(&mut args, "--vr-mode")?, "--vr-mode")?;
                    opts.headset_mode = HeadsetMode::from_index(h)
                        .ok_or_else(|| format!("invalid headset mode {h}"))?;
                    opts.eye_mode =
                        EyeMode::from_index(e).ok_or_else(|| format!("invalid eye mode {e}"))?;
                    opts.mirror_mode = MirrorMode::from_index(s)
                        .ok_or_else(|| format!("invalid screen mode {s}"))?;
                    opts.vr = true;
                }
                "--absorption" => {
                    opts.absorption =
                        Some(parse_num(&take_value(&mut args, "--absorption")?, "--absorption")?);
                }
                "--speed-of-sound" => {
                    opts.speed_of_sound = Some(parse_num(
                        &take_value(&mut args, "--speed-of-sound")?,
                        "--speed-of-sound",
                    )?);
                }
                "--iad" => {
                    opts.interaural_distance =
                        Some(parse_num(&take_value(&mut args, "--iad")?, "--iad")?);
                }
                other if other.starts_with('-') => {
                    return Err(format!("unknown option {other}"));
                }
                other => {
                    if audio_path.replace(other.to_owned()).is_some() {
                        return Err("more than one audio file given".into());
                    }
                }
            }
        }

        opts.audio_path = audio_path.ok_or("no audio file given")?;
        Ok(opts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Options, String> {
        Options::parse(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_defaults() {
        let opts = parse(&["sound.raw"]).unwrap();
        assert_eq!(opts.audio_path, "sound.raw");
        assert_eq!(opts.geometry, Geometry::Hyperbolic);
        assert_eq!(opts.seconds, 10);
        assert!(!opts.high_quality);
        assert!(!opts.vr);
        assert!(opts.export_path.is_none());
    }

    #[test]
    fn test_full_invocation() {
        let opts = parse(&[
            "a.ogg", "--geometry", "s", "--seconds", "3", "--hq", "--export", "out.raw",
            "--vr-mode", "3", "2", "1", "--absorption", "0.2", "--iad", "0.1",
        ])
        .unwrap();
        assert_eq!(opts.geometry, Geometry::Spherical);
        assert_eq!(opts.seconds, 3);
        assert!(opts.high_quality);
        assert_eq!(opts.export_path.as_deref(), Some("out.raw"));
        assert!(opts.vr);
        assert_eq!(opts.headset_mode, HeadsetMode::Holonomy);
        assert_eq!(opts.eye_mode, EyeMode::TrueVision);
        assert_eq!(opts.mirror_mode, MirrorMode::Reference);
        assert_eq!(opts.absorption, Some(0.2));
        assert_eq!(opts.interaural_distance, Some(0.1));
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["a.raw", "b.raw"]).is_err());
        assert!(parse(&["a.raw", "--geometry", "x"]).is_err());
        assert!(parse(&["a.raw", "--vr-mode", "9", "0", "0"]).is_err());
        assert!(parse(&["a.raw", "--frobnicate"]).is_err());
    }
}

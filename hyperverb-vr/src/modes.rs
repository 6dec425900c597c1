//! The three display-mode choices surfaced in the settings UI and on the
//! command line (each selected by an integer index).

/// How headset movement maps into the non-Euclidean world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeadsetMode {
    /// Ignore headset movement and rotation.
    Disabled,
    /// Ignore headset movement but keep its rotation.
    RotationOnly,
    /// Movement relative to a fixed reference pose; head loops close.
    #[default]
    Reference,
    /// Consecutive pose deltas applied directly: loops do not close in
    /// curved geometry (holonomy), by design.
    Holonomy,
}

impl HeadsetMode {
    pub fn from_index(i: usize) -> Option<Self> {
        match i {
            0 => Some(Self::Disabled),
            1 => Some(Self::RotationOnly),
            2 => Some(Self::Reference),
            3 => Some(Self::Holonomy),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Disabled => "none",
            Self::RotationOnly => "rotation only",
            Self::Reference => "reference",
            Self::Holonomy => "holonomy",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Disabled => "Ignore the headset movement and rotation.",
            Self::RotationOnly => "Ignore the headset movement but do not ignore its rotation.",
            Self::Reference => {
                "The reference point in the real world corresponds to the reference point in VR. \
                 When you move your head in a loop, you return to where you started."
            }
            Self::Holonomy => {
                "Headset movements in the real world are translated to the same movements in VR. \
                 Since the geometry is different, when you move your head in a loop, you usually \
                 don't return to where you started."
            }
        }
    }
}

/// How the two eye images are projected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EyeMode {
    /// Both eyes see the same image.
    Shared,
    /// Perceived direction and distance are correct.
    #[default]
    Equidistant,
    /// Simulate actual binocular vision in the non-Euclidean space.
    TrueVision,
}

impl EyeMode {
    pub fn from_index(i: usize) -> Option<Self> {
        match i {
            0 => Some(Self::Shared),
            1 => Some(Self::Equidistant),
            2 => Some(Self::TrueVision),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Shared => "none",
            Self::Equidistant => "equidistant",
            Self::TrueVision => "true vision",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Shared => "Both eyes see the same image.",
            Self::Equidistant => {
                "Render the image so that the perceived direction and distance is correct."
            }
            Self::TrueVision => {
                "Simulate the actual binocular vision in the non-Euclidean space. Hyperbolic \
                 spaces look smaller than they are, spherical spaces look weird."
            }
        }
    }
}

/// What the desktop window shows while VR is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MirrorMode {
    /// Nothing on the computer screen.
    Disabled,
    /// The view from the reference point.
    Reference,
    /// A single monocular image.
    #[default]
    Single,
    /// A side-by-side copy of the VR display.
    Eyes,
}

impl MirrorMode {
    pub fn from_index(i: usize) -> Option<Self> {
        match i {
            0 => Some(Self::Disabled),
            1 => Some(Self::Reference),
            2 => Some(Self::Single),
            3 => Some(Self::Eyes),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Disabled => "none",
            Self::Reference => "reference",
            Self::Single => "single",
            Self::Eyes => "eyes",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_index_round_trip() {
        for i in 0..4 {
            assert!(HeadsetMode::from_index(i).is_some());
            assert!(MirrorMode::from_index(i).is_some());
        }
        for i in 0..3 {
            assert!(EyeMode::from_index(i).is_some());
        }
        assert!(HeadsetMode::from_index(4).is_none());
        assert!(EyeMode::from_index(3).is_none());
        assert!(MirrorMode::from_index(4).is_none());
    }

    #[test]
    fn test_defaults_match_settings_ui() {
        assert_eq!(HeadsetMode::default(), HeadsetMode::Reference);
        assert_eq!(EyeMode::default(), EyeMode::Equidistant);
        assert_eq!(MirrorMode::default(), MirrorMode::Single);
    }
}

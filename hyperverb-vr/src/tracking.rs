//! Head pose tracking and reference-frame bookkeeping.

use crate::modes::HeadsetMode;
use crate::runtime::DevicePose;
use glam::{Mat4, Vec4};

/// Strips the translation part of a real-world transform, keeping the
/// 3x3 rotation block.
pub fn rotation_only(m: Mat4) -> Mat4 {
    let mut r = m;
    r.x_axis.w = 0.0;
    r.y_axis.w = 0.0;
    r.z_axis.w = 0.0;
    r.w_axis = Vec4::new(0.0, 0.0, 0.0, 1.0);
    r
}

/// Tracks the head's live pose against a fixed reference pose.
///
/// `hmd_at` is the world-from-head inverse of the tracked device transform;
/// the reference is captured on the first valid pose and re-captured on an
/// explicit reset (or every frame in holonomy mode).
pub struct PoseTracker {
    hmd_at: Mat4,
    hmd_ref_at: Mat4,
    first: bool,
    axis_flip: Mat4,
    /// How many meters of real-world movement make one absolute unit of the
    /// non-Euclidean world.
    pub absolute_unit_in_meters: f32,
}

impl PoseTracker {
    pub fn new() -> Self {
        Self {
            hmd_at: Mat4::IDENTITY,
            hmd_ref_at: Mat4::IDENTITY,
            first: true,
            // SDK coordinates have y up and -z forward; the host uses y down
            // and +z forward.
            axis_flip: Mat4::from_diagonal(Vec4::new(1.0, -1.0, -1.0, 1.0)),
            absolute_unit_in_meters: 3.0,
        }
    }

    pub fn axis_flip(&self) -> Mat4 {
        self.axis_flip
    }

    /// Whether a valid head pose has been seen yet.
    pub fn has_reference(&self) -> bool {
        !self.first
    }

    pub fn head_pose(&self) -> Mat4 {
        self.hmd_at
    }

    /// Feeds the head's device-to-absolute transform for this frame.
    pub fn update(&mut self, pose: &DevicePose) {
        if !pose.valid {
            return;
        }
        let t = pose.device_to_absolute * self.axis_flip;
        self.hmd_at = t.inverse();
        if self.first {
            self.hmd_ref_at = self.hmd_at;
            self.first = false;
        }
    }

    /// Re-captures the reference pose at the current head pose.
    pub fn reset_reference(&mut self) {
        self.hmd_ref_at = self.hmd_at;
    }

    /// The head's transform relative to the reference pose.
    pub fn head_from_reference(&self) -> Mat4 {
        self.hmd_at * self.hmd_ref_at.inverse()
    }

    /// Meters the head has moved away from the reference point, shown in the
    /// settings UI next to the reset action.
    pub fn displacement_from_reference(&self) -> f32 {
        let h = self.head_from_reference() * Vec4::new(0.0, 0.0, 0.0, 1.0);
        (h.x * h.x + h.y * h.y + h.z * h.z).sqrt()
    }

    /// Per-frame movement transform for the modes that express the camera
    /// relative to a fixed frame. Holonomy is handled by
    /// [`PoseTracker::take_holonomy_delta`] instead.
    pub fn movement(&self, mode: HeadsetMode) -> Option<Mat4> {
        match mode {
            HeadsetMode::Disabled | HeadsetMode::Holonomy => None,
            HeadsetMode::RotationOnly => Some(rotation_only(self.hmd_at)),
            HeadsetMode::Reference => Some(self.head_from_reference()),
        }
    }

    /// The delta between the previous and current head pose, re-basing the
    /// reference so next frame's delta starts here. Applying these deltas
    /// directly to the camera produces holonomy in curved geometry.
    pub fn take_holonomy_delta(&mut self) -> Option<Mat4> {
        if self.first {
            return None;
        }
        let delta = self.head_from_reference();
        self.hmd_ref_at = self.hmd_at;
        Some(delta)
    }

    /// Scale matrix mapping absolute world units to real-world meters.
    pub fn unit_scale(&self) -> Mat4 {
        let u = self.absolute_unit_in_meters;
        Mat4::from_diagonal(Vec4::new(u, u, u, 1.0))
    }
}

impl Default for PoseTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn pose_at(x: f32, y: f32, z: f32) -> DevicePose {
        DevicePose {
            valid: true,
            device_to_absolute: Mat4::from_translation(Vec3::new(x, y, z)),
        }
    }

    #[test]
    fn test_first_valid_pose_becomes_reference() {
        let mut tracker = PoseTracker::new();
        assert!(!tracker.has_reference());

        tracker.update(&DevicePose::default()); // invalid, ignored
        assert!(!tracker.has_reference());

        tracker.update(&pose_at(1.0, 0.0, 0.0));
        assert!(tracker.has_reference());
        // at the reference, the relative transform is identity
        let rel = tracker.head_from_reference();
        assert!(rel.abs_diff_eq(Mat4::IDENTITY, 1e-6));
    }

    #[test]
    fn test_reference_mode_tracks_displacement() {
        let mut tracker = PoseTracker::new();
        tracker.update(&pose_at(0.0, 0.0, 0.0));
        tracker.update(&pose_at(2.0, 0.0, 0.0));

        let rel = tracker.movement(HeadsetMode::Reference).unwrap();
        assert!(!rel.abs_diff_eq(Mat4::IDENTITY, 1e-6));
        assert!((tracker.displacement_from_reference() - 2.0).abs() < 1e-5);

        tracker.reset_reference();
        assert!(tracker.displacement_from_reference() < 1e-6);
    }

    #[test]
    fn test_rotation_only_strips_translation() {
        let mut tracker = PoseTracker::new();
        let pose = DevicePose {
            valid: true,
            device_to_absolute: Mat4::from_rotation_y(0.5) * Mat4::from_translation(Vec3::X),
        };
        tracker.update(&pose);

        let m = tracker.movement(HeadsetMode::RotationOnly).unwrap();
        let origin = m * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!(origin.abs_diff_eq(Vec4::new(0.0, 0.0, 0.0, 1.0), 1e-6));
    }

    #[test]
    fn test_holonomy_rebases_every_take() {
        let mut tracker = PoseTracker::new();
        tracker.update(&pose_at(0.0, 0.0, 0.0));
        tracker.update(&pose_at(1.0, 0.0, 0.0));

        let first = tracker.take_holonomy_delta().unwrap();
        assert!(!first.abs_diff_eq(Mat4::IDENTITY, 1e-6));

        // no movement since the re-base: the next delta is identity
        let second = tracker.take_holonomy_delta().unwrap();
        assert!(second.abs_diff_eq(Mat4::IDENTITY, 1e-6));
    }

    #[test]
    fn test_no_delta_before_first_pose() {
        let mut tracker = PoseTracker::new();
        assert!(tracker.take_holonomy_delta().is_none());
        assert!(tracker.movement(HeadsetMode::Disabled).is_none());
    }
}

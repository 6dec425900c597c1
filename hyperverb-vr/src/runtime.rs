//! The headset SDK boundary.
//!
//! [`VrRuntime`] is the seam between this subsystem and the actual device
//! SDK: the host supplies an implementation backed by its VR runtime, tests
//! use a mock. The surface mirrors what the tracking, action and compositor
//! code needs and nothing more.

use crate::compositor::TextureHandle;
use crate::error::Result;
use glam::Mat4;
use std::path::Path;

pub const MAX_TRACKED_DEVICES: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eye {
    Left,
    Right,
}

impl Eye {
    pub const BOTH: [Eye; 2] = [Eye::Left, Eye::Right];

    pub fn index(self) -> usize {
        match self {
            Eye::Left => 0,
            Eye::Right => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hand {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Invalid,
    Hmd,
    Controller,
    Tracker,
    TrackingReference,
}

impl DeviceClass {
    pub fn name(self) -> &'static str {
        match self {
            DeviceClass::Invalid => "invalid",
            DeviceClass::Hmd => "HMD",
            DeviceClass::Controller => "controller",
            DeviceClass::Tracker => "tracker",
            DeviceClass::TrackingReference => "reference",
        }
    }
}

/// One tracked device pose as delivered by the compositor.
#[derive(Debug, Clone, Copy)]
pub struct DevicePose {
    pub valid: bool,
    pub device_to_absolute: Mat4,
}

impl Default for DevicePose {
    fn default() -> Self {
        Self {
            valid: false,
            device_to_absolute: Mat4::IDENTITY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionHandle(pub u64);

impl ActionHandle {
    pub const INVALID: ActionHandle = ActionHandle(0);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionSetHandle(pub u64);

impl ActionSetHandle {
    pub const INVALID: ActionSetHandle = ActionSetHandle(0);
}

/// An action set pushed for this frame's state update, with its priority.
#[derive(Debug, Clone, Copy)]
pub struct ActiveActionSet {
    pub handle: ActionSetHandle,
    pub priority: i32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DigitalActionState {
    pub pressed: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AnalogActionState {
    pub x: f32,
    pub y: f32,
}

/// Mesh and texture data for a physical controller, as delivered by the SDK's
/// asynchronous loader.
#[derive(Debug, Clone)]
pub struct RenderModelData {
    pub positions: Vec<[f32; 3]>,
    pub tex_coords: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
    pub texture_width: u32,
    pub texture_height: u32,
    pub texture_rgba: Vec<u8>,
}

pub trait VrRuntime {
    /// Connects to the headset. Failure is captured by the session as a
    /// persistent failed flag, never a crash.
    fn init(&mut self) -> Result<()>;

    fn shutdown(&mut self);

    /// Whether the compositor came up. Without one there is no degraded
    /// mode; the session reports a fatal error.
    fn compositor_available(&self) -> bool;

    /// Driver and display identification, for the startup log.
    fn driver_description(&self) -> String;

    fn recommended_target_size(&self) -> (u32, u32);

    fn projection_matrix(&self, eye: Eye, near: f32, far: f32) -> Mat4;

    fn eye_to_head(&self, eye: Eye) -> Mat4;

    /// Blocks until the compositor hands back fresh poses. This is the
    /// natural frame pacing mechanism: while VR is active it rate-limits
    /// the whole render loop.
    fn wait_get_poses(&mut self, poses: &mut [DevicePose; MAX_TRACKED_DEVICES]);

    fn hmd_index(&self) -> usize {
        0
    }

    fn device_class(&self, index: usize) -> DeviceClass;

    fn render_model_name(&self, index: usize) -> Option<String>;

    fn controller_index(&self, hand: Hand) -> Option<usize>;

    fn set_action_manifest(&mut self, path: &Path) -> Result<()>;

    fn action_set_handle(&mut self, name: &str) -> ActionSetHandle;

    fn action_handle(&mut self, name: &str) -> ActionHandle;

    fn update_action_state(&mut self, sets: &[ActiveActionSet]);

    fn digital_action_state(&self, handle: ActionHandle) -> DigitalActionState;

    fn analog_action_state(&self, handle: ActionHandle) -> AnalogActionState;

    /// Loads a controller render model by name, polling the SDK's async
    /// loader until it settles.
    fn load_render_model(&mut self, name: &str) -> Result<RenderModelData>;

    /// Hands one eye's resolved texture to the headset compositor.
    fn submit(&mut self, eye: Eye, texture: TextureHandle) -> Result<()>;
}

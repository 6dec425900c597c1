//! Headset support for the non-Euclidean host: pose tracking against a
//! reference frame, manifest-based controller actions, and stereo
//! composition with desktop mirroring. The device SDK and the graphics API
//! both sit behind traits so the subsystem is testable without hardware.

pub mod actions;
pub mod compositor;
pub mod error;
pub mod models;
pub mod modes;
pub mod runtime;
pub mod session;
pub mod tracking;

pub use actions::{ActionBinder, AnalogCallback, DigitalCallback, WhenPredicate, MANIFEST_FILE};
pub use compositor::{
    CompositeFrame, ControllerDraw, EyeTarget, EyeView, RenderBackend, SceneRenderer, ScreenSide,
    StereoCompositor, TargetHandle, TextureHandle,
};
pub use error::{Result, VrError};
pub use models::{RenderModel, RenderModelCache, TexturedVertex};
pub use modes::{EyeMode, HeadsetMode, MirrorMode};
pub use runtime::{
    ActionHandle, ActionSetHandle, ActiveActionSet, AnalogActionState, DeviceClass,
    DevicePose, DigitalActionState, Eye, Hand, RenderModelData, VrRuntime, MAX_TRACKED_DEVICES,
};
pub use session::{VrConfig, VrSession, VrState};
pub use tracking::PoseTracker;

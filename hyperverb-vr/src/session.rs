//! VR session lifecycle and the per-frame driving loop.

use crate::actions::ActionBinder;
use crate::compositor::{
    CompositeFrame, ControllerDraw, EyeView, RenderBackend, SceneRenderer, StereoCompositor,
};
use crate::error::{Result, VrError};
use crate::modes::{EyeMode, HeadsetMode, MirrorMode};
use crate::runtime::{DeviceClass, DevicePose, Eye, VrRuntime, MAX_TRACKED_DEVICES};
use crate::tracking::PoseTracker;
use glam::Mat4;
use log::{error, info};

/// Where the session is in its frame, matching the stages the host's
/// drawing code needs to distinguish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VrState {
    /// Not started, or shut down.
    Inactive,
    /// Started; poses and actions are being tracked.
    Tracking,
    /// Inside the per-eye render passes.
    RenderingVr,
    /// Inside the desktop mirror pass.
    RenderingDesktop,
}

#[derive(Debug, Clone)]
pub struct VrConfig {
    pub enabled: bool,
    pub headset: HeadsetMode,
    pub eyes: EyeMode,
    pub mirror: MirrorMode,
    pub near: f32,
    pub far: f32,
}

impl Default for VrConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            headset: HeadsetMode::default(),
            eyes: EyeMode::default(),
            mirror: MirrorMode::default(),
            near: 0.01,
            far: 300.0,
        }
    }
}

pub struct VrSession<R: VrRuntime> {
    runtime: R,
    pub config: VrConfig,
    state: VrState,
    failed: bool,
    error_msg: Option<String>,
    tracker: PoseTracker,
    binder: ActionBinder,
    compositor: StereoCompositor,
    poses: [DevicePose; MAX_TRACKED_DEVICES],
    controllers: Vec<ControllerDraw>,
}

impl<R: VrRuntime> VrSession<R> {
    pub fn new(runtime: R, config: VrConfig) -> Self {
        Self {
            runtime,
            config,
            state: VrState::Inactive,
            failed: false,
            error_msg: None,
            tracker: PoseTracker::new(),
            binder: ActionBinder::new(),
            compositor: StereoCompositor::new(),
            poses: [DevicePose::default(); MAX_TRACKED_DEVICES],
            controllers: Vec::new(),
        }
    }

    pub fn state(&self) -> VrState {
        self.state
    }

    /// Set when startup failed; the session then skips all per-frame work
    /// instead of retrying every frame.
    pub fn failed(&self) -> bool {
        self.failed
    }

    /// Startup failure text, surfaced to the settings UI.
    pub fn error_message(&self) -> Option<&str> {
        self.error_msg.as_deref()
    }

    pub fn tracker(&self) -> &PoseTracker {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut PoseTracker {
        &mut self.tracker
    }

    pub fn actions_mut(&mut self) -> &mut ActionBinder {
        &mut self.binder
    }

    pub fn compositor(&self) -> &StereoCompositor {
        &self.compositor
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    pub fn runtime_mut(&mut self) -> &mut R {
        &mut self.runtime
    }

    /// Connects to the headset and resolves action bindings.
    ///
    /// A missing compositor is the one fatal case; any other startup
    /// failure sets the `failed` flag and returns Ok so the host keeps
    /// running on the desktop.
    pub fn start(&mut self) -> Result<()> {
        if self.state != VrState::Inactive || self.failed {
            return Ok(());
        }
        if let Err(err) = self.runtime.init() {
            error!("VR initialization failed: {err}");
            self.failed = true;
            self.error_msg = Some(err.to_string());
            return Ok(());
        }
        if !self.runtime.compositor_available() {
            self.runtime.shutdown();
            self.failed = true;
            self.error_msg = Some(VrError::CompositorUnavailable.to_string());
            return Err(VrError::CompositorUnavailable);
        }
        info!("VR driver: {}", self.runtime.driver_description());
        if let Err(err) = self.binder.bind(&mut self.runtime) {
            error!("action binding failed: {err}");
            self.runtime.shutdown();
            self.failed = true;
            self.error_msg = Some(err.to_string());
            return Ok(());
        }
        self.state = VrState::Tracking;
        Ok(())
    }

    pub fn shutdown(&mut self, backend: &mut dyn RenderBackend) {
        if self.state == VrState::Inactive {
            return;
        }
        self.compositor.destroy_targets(backend);
        self.runtime.shutdown();
        self.state = VrState::Inactive;
        self.tracker = PoseTracker::new();
    }

    /// Per-frame control: starts on demand when enabled, then polls input
    /// and waits for fresh poses. The pose wait doubles as the frame pacer.
    pub fn update(&mut self) -> Result<()> {
        if !self.config.enabled || self.failed {
            return Ok(());
        }
        if self.state == VrState::Inactive {
            self.start()?;
        }
        if self.state == VrState::Inactive {
            return Ok(());
        }
        self.binder.poll(&mut self.runtime)?;
        self.track_all();
        Ok(())
    }

    fn track_all(&mut self) {
        self.runtime.wait_get_poses(&mut self.poses);
        let hmd = self.poses[self.runtime.hmd_index()];
        self.tracker.update(&hmd);

        self.controllers.clear();
        for index in 0..MAX_TRACKED_DEVICES {
            if self.runtime.device_class(index) != DeviceClass::Controller {
                continue;
            }
            let pose = self.poses[index];
            if !pose.valid {
                continue;
            }
            if let Some(name) = self.runtime.render_model_name(index) {
                self.controllers.push(ControllerDraw {
                    model_name: name,
                    device_to_absolute: pose.device_to_absolute,
                });
            }
        }
    }

    /// The eye offset lands in a different place per [`EyeMode`]: nowhere
    /// (both eyes identical), in the view transform (perceived direction and
    /// distance correct), or as in-world movement (true binocular vision in
    /// the curved space).
    fn eye_view(&mut self, eye: Eye, movement: Mat4) -> EyeView {
        let projection = self
            .runtime
            .projection_matrix(eye, self.config.near, self.config.far);
        let base = self.tracker.unit_scale() * self.tracker.axis_flip();
        let (view, movement) = match self.config.eyes {
            EyeMode::Shared => (base, movement),
            EyeMode::Equidistant => (self.runtime.eye_to_head(eye).inverse() * base, movement),
            EyeMode::TrueVision => (base, self.runtime.eye_to_head(eye).inverse() * movement),
        };
        EyeView {
            eye,
            projection,
            view,
            movement,
        }
    }

    /// Renders and submits both eyes, then the desktop mirror. Holonomy
    /// consumes the pose delta here, so call at most once per `update`.
    pub fn render_frame(
        &mut self,
        backend: &mut dyn RenderBackend,
        scene: &mut dyn SceneRenderer,
    ) -> Result<()> {
        if self.state != VrState::Tracking {
            let prev = self.state;
            self.state = VrState::RenderingDesktop;
            scene.draw_desktop();
            self.state = prev;
            return Ok(());
        }

        let movement = match self.config.headset {
            HeadsetMode::Holonomy => self.tracker.take_holonomy_delta(),
            mode => self.tracker.movement(mode),
        }
        .unwrap_or(Mat4::IDENTITY);

        let frame = CompositeFrame {
            views: [
                self.eye_view(Eye::Left, movement),
                self.eye_view(Eye::Right, movement),
            ],
            controllers: std::mem::take(&mut self.controllers),
            hmd_at: self.tracker.head_pose(),
            axis_flip: self.tracker.axis_flip(),
            mirror: self.config.mirror,
        };

        self.state = VrState::RenderingVr;
        let result =
            self.compositor
                .render_and_submit(&mut self.runtime, backend, scene, &frame);
        self.state = VrState::Tracking;
        result
    }
}

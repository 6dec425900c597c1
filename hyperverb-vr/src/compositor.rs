//! Per-eye render targets and frame composition.
//!
//! The graphics API sits behind [`RenderBackend`] and the host's drawing
//! code behind [`SceneRenderer`]; the compositor owns the eye targets and
//! the order of passes: render both eyes into multisampled targets, resolve
//! them, hand the resolved textures to the headset, then mirror to the
//! desktop window.

use crate::error::{Result, VrError};
use crate::models::{RenderModelCache, TexturedVertex};
use crate::modes::MirrorMode;
use crate::runtime::{Eye, VrRuntime};
use glam::Mat4;
use log::info;

/// Opaque backend identifier for a complete eye render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetHandle(pub u64);

/// Opaque backend identifier for a resolved, samplable texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);

/// A multisampled render target plus the single-sample texture its content
/// is resolved into before submission.
#[derive(Debug, Clone, Copy)]
pub struct EyeTarget {
    pub target: TargetHandle,
    pub resolved: TextureHandle,
    pub width: u32,
    pub height: u32,
}

/// Where on the desktop window a mirrored eye lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenSide {
    Full,
    LeftHalf,
    RightHalf,
}

/// The graphics-API seam. The host supplies an implementation backed by
/// its renderer; tests use a mock that records calls.
pub trait RenderBackend {
    fn create_eye_target(&mut self, width: u32, height: u32) -> Result<EyeTarget>;

    fn destroy_eye_target(&mut self, target: &EyeTarget);

    /// Binds the target and clears color and depth.
    fn begin_eye(&mut self, target: &EyeTarget) -> Result<()>;

    /// Binds the target without clearing, for passes drawn on top of an
    /// already rendered eye.
    fn bind_eye(&mut self, target: &EyeTarget) -> Result<()>;

    /// Resolves the multisampled content into the samplable texture.
    fn resolve(&mut self, target: &EyeTarget) -> Result<()>;

    fn bind_screen(&mut self);

    fn blit_to_screen(&mut self, target: &EyeTarget, side: ScreenSide);

    fn upload_texture(&mut self, width: u32, height: u32, rgba: &[u8]) -> Result<TextureHandle>;

    fn draw_textured(&mut self, texture: TextureHandle, vertices: &[TexturedVertex], mvp: Mat4);
}

/// Everything the host draws; called once per eye and once for the desktop.
pub trait SceneRenderer {
    fn draw_scene(&mut self, view: &EyeView);

    /// The desktop view from the reference point, used by
    /// [`MirrorMode::Reference`].
    fn draw_desktop(&mut self);
}

/// Per-eye camera setup handed to the host's scene renderer.
#[derive(Debug, Clone, Copy)]
pub struct EyeView {
    pub eye: Eye,
    pub projection: Mat4,
    /// Head-from-eye inverse, in world axes.
    pub view: Mat4,
    /// Camera movement from head tracking; identity when tracking is off.
    pub movement: Mat4,
}

/// One controller to draw this frame, in real-world coordinates.
#[derive(Debug, Clone)]
pub struct ControllerDraw {
    pub model_name: String,
    pub device_to_absolute: Mat4,
}

/// Everything the compositor needs to draw one frame.
pub struct CompositeFrame {
    pub views: [EyeView; 2],
    pub controllers: Vec<ControllerDraw>,
    /// Inverse head pose, in world axes.
    pub hmd_at: Mat4,
    pub axis_flip: Mat4,
    pub mirror: MirrorMode,
}

pub struct StereoCompositor {
    targets: Option<[EyeTarget; 2]>,
    models: RenderModelCache,
}

impl StereoCompositor {
    pub fn new() -> Self {
        Self {
            targets: None,
            models: RenderModelCache::new(),
        }
    }

    /// Creates both eye targets at the runtime's recommended size. Safe to
    /// call every frame; targets are only created once.
    pub fn ensure_targets(
        &mut self,
        runtime: &dyn VrRuntime,
        backend: &mut dyn RenderBackend,
    ) -> Result<()> {
        if self.targets.is_some() {
            return Ok(());
        }
        let (width, height) = runtime.recommended_target_size();
        info!("creating eye render targets at {width}x{height}");
        let left = backend.create_eye_target(width, height)?;
        let right = backend.create_eye_target(width, height)?;
        self.targets = Some([left, right]);
        Ok(())
    }

    pub fn destroy_targets(&mut self, backend: &mut dyn RenderBackend) {
        if let Some(targets) = self.targets.take() {
            for target in &targets {
                backend.destroy_eye_target(target);
            }
        }
    }

    /// Renders both eyes, submits them to the headset, then mirrors to the
    /// desktop window per the configured mode.
    pub fn render_and_submit(
        &mut self,
        runtime: &mut dyn VrRuntime,
        backend: &mut dyn RenderBackend,
        scene: &mut dyn SceneRenderer,
        frame: &CompositeFrame,
    ) -> Result<()> {
        self.ensure_targets(runtime, backend)?;
        let targets = self
            .targets
            .ok_or_else(|| VrError::Render("eye targets unavailable".into()))?;

        for eye in Eye::BOTH {
            let target = &targets[eye.index()];
            backend.begin_eye(target)?;
            scene.draw_scene(&frame.views[eye.index()]);
            self.draw_controllers(eye, runtime, backend, frame, target)?;
            backend.resolve(target)?;
        }
        for eye in Eye::BOTH {
            runtime.submit(eye, targets[eye.index()].resolved)?;
        }
        self.mirror_to_screen(backend, scene, frame, &targets);
        Ok(())
    }

    /// Controllers live in real-world coordinates, so their transform goes
    /// through the head pose rather than the world camera.
    fn draw_controllers(
        &mut self,
        eye: Eye,
        runtime: &mut dyn VrRuntime,
        backend: &mut dyn RenderBackend,
        frame: &CompositeFrame,
        target: &EyeTarget,
    ) -> Result<()> {
        if frame.controllers.is_empty() {
            return Ok(());
        }
        backend.bind_eye(target)?;
        let view = &frame.views[eye.index()];
        for controller in &frame.controllers {
            let model = match self
                .models
                .get_or_load(&controller.model_name, runtime, backend)
            {
                Some(m) => m,
                None => continue,
            };
            let mvp = view.projection
                * view.view
                * frame.axis_flip
                * frame.hmd_at
                * controller.device_to_absolute
                * frame.axis_flip;
            backend.draw_textured(model.texture, &model.vertices, mvp);
        }
        Ok(())
    }

    fn mirror_to_screen(
        &self,
        backend: &mut dyn RenderBackend,
        scene: &mut dyn SceneRenderer,
        frame: &CompositeFrame,
        targets: &[EyeTarget; 2],
    ) {
        backend.bind_screen();
        match frame.mirror {
            MirrorMode::Disabled => {}
            MirrorMode::Reference => scene.draw_desktop(),
            MirrorMode::Single => {
                backend.blit_to_screen(&targets[Eye::Left.index()], ScreenSide::Full);
            }
            MirrorMode::Eyes => {
                backend.blit_to_screen(&targets[Eye::Left.index()], ScreenSide::LeftHalf);
                backend.blit_to_screen(&targets[Eye::Right.index()], ScreenSide::RightHalf);
            }
        }
    }

    pub fn model_cache(&self) -> &RenderModelCache {
        &self.models
    }
}

impl Default for StereoCompositor {
    fn default() -> Self {
        Self::new()
    }
}

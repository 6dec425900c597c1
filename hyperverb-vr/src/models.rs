//! Controller render models, loaded once and cached by name.

use crate::compositor::{RenderBackend, TextureHandle};
use crate::error::{Result, VrError};
use crate::runtime::VrRuntime;
use log::{info, warn};
use std::collections::HashMap;

/// One flat-shaded textured vertex, ready for a triangle-list draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TexturedVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

pub struct RenderModel {
    pub name: String,
    /// Expanded triangle list (the SDK delivers indexed data).
    pub vertices: Vec<TexturedVertex>,
    pub texture: TextureHandle,
}

/// Caches loaded controller models so the SDK's async loader is only hit
/// once per model name, not once per frame.
pub struct RenderModelCache {
    models: HashMap<String, Option<RenderModel>>,
}

impl RenderModelCache {
    pub fn new() -> Self {
        Self {
            models: HashMap::new(),
        }
    }

    /// Returns the cached model, loading it on the first request. A model
    /// that failed to load is cached as absent so the failure is logged once.
    pub fn get_or_load(
        &mut self,
        name: &str,
        runtime: &mut dyn VrRuntime,
        backend: &mut dyn RenderBackend,
    ) -> Option<&RenderModel> {
        if !self.models.contains_key(name) {
            let loaded = match Self::load(name, runtime, backend) {
                Ok(model) => {
                    info!(
                        "loaded render model {} ({} vertices)",
                        name,
                        model.vertices.len()
                    );
                    Some(model)
                }
                Err(err) => {
                    warn!("failed to load render model {name}: {err}");
                    None
                }
            };
            self.models.insert(name.to_owned(), loaded);
        }
        self.models.get(name).and_then(|m| m.as_ref())
    }

    fn load(
        name: &str,
        runtime: &mut dyn VrRuntime,
        backend: &mut dyn RenderBackend,
    ) -> Result<RenderModel> {
        let data = runtime.load_render_model(name)?;
        let mut vertices = Vec::with_capacity(data.indices.len());
        for &i in &data.indices {
            let i = i as usize;
            let (position, uv) = match (data.positions.get(i), data.tex_coords.get(i)) {
                (Some(&p), Some(&t)) => (p, t),
                _ => {
                    return Err(VrError::Model(format!(
                        "index {i} out of range in model {name}"
                    )));
                }
            };
            vertices.push(TexturedVertex { position, uv });
        }
        let texture = backend.upload_texture(
            data.texture_width,
            data.texture_height,
            &data.texture_rgba,
        )?;
        Ok(RenderModel {
            name: name.to_owned(),
            vertices,
            texture,
        })
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl Default for RenderModelCache {
    fn default() -> Self {
        Self::new()
    }
}

use crate::foundation::error::StageResult;
use crate::render::{FrameRgba, RenderSurface};
use crate::scene::camera::Camera;
use crate::scene::node::{RenderObject, TextNode};

/// Ordered render objects under the shared viewport.
///
/// Later attachments paint on top. Objects are only ever removed all at once.
pub struct Compositor {
    objects: Vec<RenderObject>,
    surface: Box<dyn RenderSurface>,
    renders: u64,
}

impl std::fmt::Debug for Compositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compositor")
            .field("objects", &self.objects.len())
            .field("renders", &self.renders)
            .finish_non_exhaustive()
    }
}

impl Compositor {
    pub fn new(surface: Box<dyn RenderSurface>) -> Self {
        Self {
            objects: Vec::new(),
            surface,
            renders: 0,
        }
    }

    pub fn attach(&mut self, object: RenderObject) {
        tracing::debug!(id = object.id(), index = self.objects.len(), "attach");
        self.objects.push(object);
    }

    /// Detach every object.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.surface.release();
    }

    /// Redraw the viewport now.
    pub fn request_render(&mut self, camera: &Camera) -> StageResult<()> {
        self.surface.redraw(camera.view(), &self.objects)?;
        self.renders += 1;
        Ok(())
    }

    pub fn objects(&self) -> &[RenderObject] {
        &self.objects
    }

    pub fn get(&self, id: &str) -> Option<&RenderObject> {
        self.objects.iter().find(|o| o.id() == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut RenderObject> {
        self.objects.iter_mut().find(|o| o.id() == id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Redraws performed so far.
    pub fn render_count(&self) -> u64 {
        self.renders
    }

    pub fn measure_text(&mut self, node: &TextNode) -> f64 {
        self.surface.measure_text(node)
    }

    pub fn resize(&mut self, width: u32, height: u32) -> StageResult<()> {
        self.surface.resize(width, height)
    }

    pub fn register_font(&mut self, family: &str, bytes: Vec<u8>) -> StageResult<()> {
        self.surface.register_font(family, bytes)
    }

    pub fn frame(&self) -> Option<&FrameRgba> {
        self.surface.frame()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/compositor.rs"]
mod tests;

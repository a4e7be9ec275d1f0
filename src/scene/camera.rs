use crate::foundation::core::{Affine, Point, Vec2};

/// Pan and zoom over the whole stage.
///
/// Independent of every per-layer transform. The view maps scene space to viewport pixels as
/// `scale(zoom) * translate(pan)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pan: Vec2,
    zoom: f64,
    zoom_factor: f64,
    viewport: (u32, u32),
    drag_from: Option<Point>,
}

impl Camera {
    /// Unpanned camera at `initial_zoom`. Each zoom step multiplies or divides by `zoom_factor`.
    pub fn new(viewport: (u32, u32), initial_zoom: f64, zoom_factor: f64) -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: initial_zoom,
            zoom_factor,
            viewport,
            drag_from: None,
        }
    }

    /// Pan offset in scene units.
    pub fn pan(&self) -> Vec2 {
        self.pan
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Viewport size in pixels.
    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    /// True between `start_pan` and `end_pan`.
    pub fn is_panning(&self) -> bool {
        self.drag_from.is_some()
    }

    /// Begin a drag at `pointer`, in viewport pixels.
    pub fn start_pan(&mut self, pointer: Point) {
        self.drag_from = Some(pointer);
    }

    /// Move by the pointer delta divided by the zoom. Returns false when no drag is active.
    pub fn continue_pan(&mut self, pointer: Point) -> bool {
        let Some(from) = self.drag_from else {
            return false;
        };
        self.pan += (pointer - from) / self.zoom;
        self.drag_from = Some(pointer);
        true
    }

    /// Stop dragging. Later `continue_pan` calls are ignored.
    pub fn end_pan(&mut self) {
        self.drag_from = None;
    }

    /// Multiply the zoom by the zoom factor.
    pub fn zoom_in(&mut self) {
        self.zoom *= self.zoom_factor;
    }

    /// Divide the zoom by the zoom factor.
    pub fn zoom_out(&mut self) {
        self.zoom /= self.zoom_factor;
    }

    /// Record a new viewport size. Pan and zoom are kept.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
    }

    /// Shift the pan offset by a fixed amount.
    pub fn nudge(&mut self, dx: f64, dy: f64) {
        self.pan += Vec2::new(dx, dy);
    }

    /// Scene to viewport transform.
    pub fn view(&self) -> Affine {
        Affine::scale(self.zoom) * Affine::translate(self.pan)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/camera.rs"]
mod tests;

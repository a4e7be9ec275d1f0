//! Rendering engine seam.
//!
//! The compositor talks to a [`RenderSurface`]; [`CpuSurface`] is the shipped implementation,
//! rasterizing with `vello_cpu` and shaping text with `parley`. [`RecordingSurface`] draws nothing
//! and is meant for headless runs.

pub(crate) mod cpu;
pub(crate) mod recording;
pub(crate) mod text;

use crate::foundation::core::Affine;
use crate::foundation::error::StageResult;
use crate::scene::{RenderObject, TextNode};

pub use cpu::CpuSurface;
pub use recording::{RecordingSurface, SurfaceLog};
pub use text::TextEngine;

/// A rendered viewport.
#[derive(Clone, Debug)]
pub struct FrameRgba {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRgba {
    /// Convert premultiplied data to straight alpha (what PNG encoders expect).
    pub fn into_straight(mut self) -> Self {
        if self.premultiplied {
            for px in self.data.chunks_exact_mut(4) {
                let a = u32::from(px[3]);
                if a == 0 || a == 255 {
                    continue;
                }
                for c in &mut px[..3] {
                    *c = ((u32::from(*c) * 255 + a / 2) / a).min(255) as u8;
                }
            }
            self.premultiplied = false;
        }
        self
    }
}

/// Something that can draw the stage and measure text for it.
pub trait RenderSurface {
    /// Reset the viewport bounds.
    fn resize(&mut self, width: u32, height: u32) -> StageResult<()>;

    /// Redraw every visible object, in order, through the `view` transform.
    fn redraw(&mut self, view: Affine, objects: &[RenderObject]) -> StageResult<()>;

    /// Unscaled advance width of a text node's run, in scene pixels.
    fn measure_text(&mut self, node: &TextNode) -> f64;

    /// Make font bytes available under `family`.
    fn register_font(&mut self, family: &str, bytes: Vec<u8>) -> StageResult<()>;

    /// Drop resources cached for objects that are no longer attached.
    fn release(&mut self) {}

    /// Last redrawn frame, for surfaces that keep one.
    fn frame(&self) -> Option<&FrameRgba> {
        None
    }
}

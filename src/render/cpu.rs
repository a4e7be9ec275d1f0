use std::collections::HashMap;
use std::sync::Arc;

use crate::foundation::core::{Affine, Rect};
use crate::foundation::error::{StageError, StageResult};
use crate::foundation::math::{mul_div255_u8, premultiply_rgba8_in_place};
use crate::render::text::TextEngine;
use crate::render::{FrameRgba, RenderSurface};
use crate::scene::{BitmapNode, Mask, RenderObject, TextNode};

/// CPU raster surface backed by `vello_cpu`.
///
/// Each object is drawn to a scratch pixmap, multiplied by the alpha of its mask and composited
/// premultiplied-over the frame with the object's opacity.
pub struct CpuSurface {
    width: u16,
    height: u16,
    clear_rgba: [u8; 4],
    text: TextEngine,
    image_cache: HashMap<String, vello_cpu::Image>,
    frame: Option<FrameRgba>,
}

impl std::fmt::Debug for CpuSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuSurface")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl CpuSurface {
    pub fn new(width: u32, height: u32) -> StageResult<Self> {
        let (width, height) = surface_dims(width, height)?;
        Ok(Self {
            width,
            height,
            clear_rgba: [0, 0, 0, 0],
            text: TextEngine::new(),
            image_cache: HashMap::new(),
            frame: None,
        })
    }

    /// Straight RGBA the frame is cleared to before drawing.
    pub fn with_clear_rgba(mut self, rgba: [u8; 4]) -> Self {
        self.clear_rgba = rgba;
        self
    }

    pub fn text_engine_mut(&mut self) -> &mut TextEngine {
        &mut self.text
    }

    fn image_paint_for(&mut self, node: &BitmapNode) -> StageResult<vello_cpu::Image> {
        if let Some(paint) = self.image_cache.get(&node.id) {
            return Ok(paint.clone());
        }
        let mut premul = node.pixels.clone();
        premultiply_rgba8_in_place(&mut premul);
        let pixmap = premul_bytes_to_pixmap(&premul, node.width, node.height)?;
        let paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };
        self.image_cache.insert(node.id.clone(), paint.clone());
        Ok(paint)
    }

    fn draw_bitmap(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        node: &BitmapNode,
    ) -> StageResult<()> {
        if node.width == 0 || node.height == 0 {
            return Ok(());
        }
        let paint = self.image_paint_for(node)?;
        ctx.set_paint(paint);
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(node.width),
            f64::from(node.height),
        ));
        Ok(())
    }

    fn draw_text(&mut self, ctx: &mut vello_cpu::RenderContext, node: &TextNode) {
        let Some(shaped) = self.text.shape(node) else {
            tracing::debug!(family = %node.font.family, "no font available; text not drawn");
            return;
        };
        for line in shaped.layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let brush = run.style().brush;
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    brush.r, brush.g, brush.b, brush.a,
                ));
                let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                ctx.glyph_run(&shaped.font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
    }

    fn mask_pixels(&self, view: Affine, mask: Mask) -> Vec<u8> {
        let mut pixmap = vello_cpu::Pixmap::new(self.width, self.height);
        let mut ctx = vello_cpu::RenderContext::new(self.width, self.height);
        ctx.set_transform(affine_to_cpu(view));
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(255, 255, 255, 255));
        ctx.fill_rect(&rect_to_cpu(mask.rect));
        ctx.flush();
        ctx.render_to_pixmap(&mut pixmap);
        pixmap.data_as_u8_slice().to_vec()
    }
}

impl RenderSurface for CpuSurface {
    fn resize(&mut self, width: u32, height: u32) -> StageResult<()> {
        let (w, h) = surface_dims(width, height)?;
        self.width = w;
        self.height = h;
        self.frame = None;
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(objects = objects.len()))]
    fn redraw(&mut self, view: Affine, objects: &[RenderObject]) -> StageResult<()> {
        self.image_cache
            .retain(|id, _| objects.iter().any(|o| o.id() == id));

        let mut frame = vello_cpu::Pixmap::new(self.width, self.height);
        clear_pixmap(&mut frame, premul_rgba8(self.clear_rgba));

        let mut mask_cache: Option<(Mask, Vec<u8>)> = None;
        for object in objects.iter().filter(|o| o.visible()) {
            let mut scratch = vello_cpu::Pixmap::new(self.width, self.height);
            let mut ctx = vello_cpu::RenderContext::new(self.width, self.height);
            ctx.set_transform(affine_to_cpu(view * object.transform()));
            match object {
                RenderObject::Bitmap(b) => {
                    if let Err(err) = self.draw_bitmap(&mut ctx, b) {
                        tracing::warn!(id = %b.id, %err, "object not drawn");
                        continue;
                    }
                }
                RenderObject::Text(t) => self.draw_text(&mut ctx, t),
            }
            ctx.flush();
            ctx.render_to_pixmap(&mut scratch);

            if let Some(mask) = object.mask() {
                if mask_cache.as_ref().is_none_or(|(m, _)| *m != mask) {
                    mask_cache = Some((mask, self.mask_pixels(view, mask)));
                }
                if let Some((_, alpha)) = &mask_cache {
                    mask_apply_alpha_in_place(scratch.data_as_u8_slice_mut(), alpha);
                }
            }

            premul_over_in_place_opacity(
                frame.data_as_u8_slice_mut(),
                scratch.data_as_u8_slice(),
                object.opacity() as f32,
            )?;
        }

        self.frame = Some(FrameRgba {
            width: u32::from(self.width),
            height: u32::from(self.height),
            data: frame.data_as_u8_slice().to_vec(),
            premultiplied: true,
        });
        Ok(())
    }

    fn release(&mut self) {
        self.image_cache.clear();
    }

    fn measure_text(&mut self, node: &TextNode) -> f64 {
        self.text.measure(node)
    }

    fn register_font(&mut self, family: &str, bytes: Vec<u8>) -> StageResult<()> {
        self.text.register(family, bytes)
    }

    fn frame(&self) -> Option<&FrameRgba> {
        self.frame.as_ref()
    }
}

fn surface_dims(width: u32, height: u32) -> StageResult<(u16, u16)> {
    if width == 0 || height == 0 {
        return Err(StageError::validation("viewport width and height must be > 0"));
    }
    let w: u16 = width
        .try_into()
        .map_err(|_| StageError::validation("viewport width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| StageError::validation("viewport height exceeds u16"))?;
    Ok((w, h))
}

fn premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> StageResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| StageError::render("layer width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| StageError::render("layer height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(StageError::render("layer pixel byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

fn clear_pixmap(pixmap: &mut vello_cpu::Pixmap, rgba: [u8; 4]) {
    for px in pixmap.data_as_u8_slice_mut().chunks_exact_mut(4) {
        px.copy_from_slice(&rgba);
    }
}

fn premul_rgba8(rgba: [u8; 4]) -> [u8; 4] {
    let [r, g, b, a] = rgba;
    let a16 = u16::from(a);
    [
        mul_div255_u8(u16::from(r), a16),
        mul_div255_u8(u16::from(g), a16),
        mul_div255_u8(u16::from(b), a16),
        a,
    ]
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn rect_to_cpu(r: Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}

/// Scale every premultiplied channel of `dst` by the mask's alpha.
pub(crate) fn mask_apply_alpha_in_place(dst: &mut [u8], mask: &[u8]) {
    debug_assert_eq!(dst.len(), mask.len());
    for (d, m) in dst.chunks_exact_mut(4).zip(mask.chunks_exact(4)) {
        let w = u16::from(m[3]);
        if w == 255 {
            continue;
        }
        for c in d.iter_mut() {
            *c = mul_div255_u8(u16::from(*c), w);
        }
    }
}

pub(crate) fn premul_over_in_place_opacity(
    dst: &mut [u8],
    src: &[u8],
    opacity: f32,
) -> StageResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(StageError::render(
            "premul_over_in_place_opacity expects equal-length rgba8 buffers",
        ));
    }
    let op = ((opacity.clamp(0.0, 1.0) * 255.0).round() as i32).clamp(0, 255) as u16;
    if op == 0 {
        return Ok(());
    }

    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let sa = mul_div255_u8(u16::from(s[3]), op);
        if sa == 0 {
            continue;
        }
        let inv = 255u16 - u16::from(sa);

        d[3] = sa.saturating_add(mul_div255_u8(u16::from(d[3]), inv));
        for c in 0..3 {
            let sc = mul_div255_u8(u16::from(s[c]), op);
            let dc = mul_div255_u8(u16::from(d[c]), inv);
            d[c] = sc.saturating_add(dc);
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;

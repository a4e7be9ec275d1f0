use std::collections::HashMap;

use crate::foundation::error::{StageError, StageResult};
use crate::scene::TextNode;

/// Width of one character, in ems, when no font bytes are known at all.
const ESTIMATED_ADVANCE_EM: f64 = 0.6;

/// RGBA8 brush color used by Parley text layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct TextBrushRgba8 {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

#[derive(Clone)]
struct RegisteredFont {
    /// Family name as the font itself reports it.
    family_name: String,
    data: vello_cpu::peniko::FontData,
}

/// Shaped text ready to draw.
pub(crate) struct ShapedText {
    pub(crate) layout: parley::Layout<TextBrushRgba8>,
    pub(crate) font: vello_cpu::peniko::FontData,
}

/// Parley contexts plus the font bytes registered per requested family.
///
/// A family nobody registered resolves to the default family, if one is set. With no font at
/// all, measurement falls back to a fixed per-character estimate and nothing is drawn.
pub struct TextEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    fonts: HashMap<String, RegisteredFont>,
    default_family: Option<String>,
}

impl Default for TextEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextEngine {
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            fonts: HashMap::new(),
            default_family: None,
        }
    }

    /// Register font bytes under `family`. The first registration becomes the default.
    pub fn register(&mut self, family: &str, bytes: Vec<u8>) -> StageResult<()> {
        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(bytes.clone()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            StageError::font_load(format!("no font families found in bytes for '{family}'"))
        })?;
        let family_name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| StageError::font_load(format!("font for '{family}' has no name")))?
            .to_string();

        tracing::debug!(family, %family_name, "registered font");
        let data = vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(bytes), 0);
        self.fonts.insert(
            family.to_owned(),
            RegisteredFont { family_name, data },
        );
        if self.default_family.is_none() {
            self.default_family = Some(family.to_owned());
        }
        Ok(())
    }

    /// Use an already registered family for every unknown family.
    pub fn set_default_family(&mut self, family: &str) -> StageResult<()> {
        if !self.fonts.contains_key(family) {
            return Err(StageError::font_load(format!(
                "default family '{family}' is not registered"
            )));
        }
        self.default_family = Some(family.to_owned());
        Ok(())
    }

    pub fn has_family(&self, family: &str) -> bool {
        self.fonts.contains_key(family)
    }

    fn resolve(&self, family: &str) -> Option<&RegisteredFont> {
        self.fonts.get(family).or_else(|| {
            self.default_family
                .as_deref()
                .and_then(|d| self.fonts.get(d))
        })
    }

    /// Shape a node's text on a single line, or `None` when no font can serve it.
    pub(crate) fn shape(&mut self, node: &TextNode) -> Option<ShapedText> {
        let font = self.resolve(&node.font.family)?.clone();
        let brush = TextBrushRgba8 {
            r: node.color.r,
            g: node.color.g,
            b: node.color.b,
            a: 255,
        };

        let mut builder =
            self.layout_ctx
                .ranged_builder(&mut self.font_ctx, &node.text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(font.family_name)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(
            node.font.size_px as f32,
        ));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(&node.text);
        layout.break_all_lines(None);
        Some(ShapedText {
            layout,
            font: font.data,
        })
    }

    /// Advance width of the node's text at its font size, before node scaling.
    pub fn measure(&mut self, node: &TextNode) -> f64 {
        match self.shape(node) {
            Some(shaped) => f64::from(shaped.layout.width()),
            None => estimate_width(&node.text, node.font.size_px),
        }
    }
}

fn estimate_width(text: &str, size_px: u32) -> f64 {
    text.chars().count() as f64 * f64::from(size_px) * ESTIMATED_ADVANCE_EM
}

#[cfg(test)]
#[path = "../../tests/unit/render/text.rs"]
mod tests;

//! Text styling derived from type-layer metadata.

use crate::decode::FillColor;
use crate::foundation::core::Rgb8;
use crate::foundation::error::{StageError, StageResult};

/// Font size used when a style run carries none, in points.
pub const FALLBACK_FONT_PT: f64 = 12.0;
/// Resolution type layers are authored at.
pub const DOCUMENT_DPI: f64 = 300.0;
/// Points per inch.
pub const POINTS_PER_INCH: f64 = 72.0;
/// Family used when a type layer names no font.
pub const FALLBACK_FAMILY: &str = "sans-serif";

/// Text fill color from the engine's color components.
///
/// Five components are `[unused, C, M, Y, K]` in 0..=1. Four are `[unused, R, G, B]` in 0..=255.
/// Anything else is opaque black.
pub fn fill_color(fill: Option<&FillColor>) -> Rgb8 {
    let Some(fill) = fill else {
        return Rgb8::BLACK;
    };
    match fill.values.as_slice() {
        &[_, c, m, y, k] => cmyk_to_rgb(c, m, y, k),
        &[_, r, g, b] => Rgb8::new(channel(r), channel(g), channel(b)),
        _ => Rgb8::BLACK,
    }
}

/// `R = 255(1-C)(1-K)`, likewise for G from M and B from Y.
pub fn cmyk_to_rgb(c: f64, m: f64, y: f64, k: f64) -> Rgb8 {
    let conv = |v: f64| channel(255.0 * (1.0 - v) * (1.0 - k));
    Rgb8::new(conv(c), conv(m), conv(y))
}

fn channel(v: f64) -> u8 {
    if v.is_nan() {
        return 0;
    }
    v.round().clamp(0.0, 255.0) as u8
}

/// Pixel font size of a type layer.
///
/// Without an explicit size the 12pt default is converted from document DPI to CSS pixels.
pub fn font_size(explicit: Option<f64>, transform_scale: f64) -> u32 {
    let raw = match explicit {
        Some(size) => size * transform_scale,
        None => FALLBACK_FONT_PT * transform_scale * DOCUMENT_DPI / POINTS_PER_INCH,
    };
    if !raw.is_finite() {
        return 1;
    }
    raw.round().max(1.0) as u32
}

/// Upper-case `text` when the caps mode is set.
pub fn apply_caps(text: &str, font_caps: Option<i64>) -> String {
    match font_caps {
        Some(mode) if mode > 0 => text.to_uppercase(),
        _ => text.to_owned(),
    }
}

/// Left edge that centers `measured_width` in the document.
pub fn align_center(doc_width: f64, measured_width: f64) -> f64 {
    (doc_width - measured_width) / 2.0
}

/// Family part of a PostScript font name: `Arial-BoldMT` is `Arial`.
pub fn font_family_base(name: &str) -> &str {
    name.split('-').next().unwrap_or(name).trim()
}

/// Composite CSS-like font string, `"<size>px <family>"`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FontDescriptor {
    pub size_px: u32,
    pub family: String,
}

impl FontDescriptor {
    pub fn new(size_px: u32, family: impl Into<String>) -> Self {
        Self {
            size_px,
            family: family.into(),
        }
    }

    /// Parse `"50px Arial"`. The family may contain spaces.
    pub fn parse(s: &str) -> StageResult<Self> {
        let bad = || StageError::validation(format!("invalid font descriptor '{s}'"));
        let (size, family) = s.trim().split_once(' ').ok_or_else(bad)?;
        let size_px = size
            .strip_suffix("px")
            .and_then(|n| n.parse::<u32>().ok())
            .filter(|&n| n > 0)
            .ok_or_else(bad)?;
        let family = family.trim();
        if family.is_empty() {
            return Err(bad());
        }
        Ok(Self::new(size_px, family))
    }

    /// Replace only the size token.
    pub fn with_size(&self, size_px: u32) -> Self {
        Self::new(size_px, self.family.clone())
    }

    /// Replace only the family.
    pub fn with_family(&self, family: impl Into<String>) -> Self {
        Self::new(self.size_px, family)
    }
}

impl std::fmt::Display for FontDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}px {}", self.size_px, self.family)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/reconstruct/style.rs"]
mod tests;

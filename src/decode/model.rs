use crate::foundation::core::{DocSize, LayerBounds};
use crate::foundation::error::StageResult;

/// Flattens one layer's pixel content to a straight-alpha RGBA8 raster.
pub trait LayerRaster: Send {
    /// Composite the layer.
    ///
    /// `clip` honours the layer's clipping mask; `visible` honours its hidden flag (a hidden
    /// layer composites to a fully transparent raster). The result is `width * height * 4`
    /// bytes, row-major.
    fn composite(&self, clip: bool, visible: bool) -> StageResult<Vec<u8>>;
}

/// Result of decoding a whole document.
#[derive(Debug)]
pub struct DecodedDocument {
    /// File header dimensions.
    pub size: DocSize,
    /// Layers in storage order (front-most first).
    pub layers: Vec<DecodedLayer>,
}

/// One decoded layer. Read-only to this crate apart from compositing.
pub struct DecodedLayer {
    /// Layer name as authored.
    pub name: String,
    /// Bounding box in document pixels.
    pub bounds: LayerBounds,
    /// Layer record properties.
    pub properties: LayerProperties,
    /// Pixel source.
    pub raster: Box<dyn LayerRaster>,
}

impl std::fmt::Debug for DecodedLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodedLayer")
            .field("name", &self.name)
            .field("bounds", &self.bounds)
            .field("properties", &self.properties)
            .finish_non_exhaustive()
    }
}

/// Layer record properties relevant to reconstruction.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerProperties {
    /// Opacity, 0..=255.
    pub opacity: u8,
    /// Hidden in the source document.
    pub hidden: bool,
    /// Text content of a type layer.
    pub text: Option<String>,
    /// Typographic metadata from the text engine.
    pub text_meta: TextMetadata,
}

impl Default for LayerProperties {
    fn default() -> Self {
        Self {
            opacity: 255,
            hidden: false,
            text: None,
            text_meta: TextMetadata::NoText,
        }
    }
}

/// Text-engine metadata of a layer.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum TextMetadata {
    /// Pixel layer, or a type layer without engine data.
    #[default]
    NoText,
    /// Type layer with engine data.
    TextLayer(TextLayerMeta),
}

/// Engine data of a type layer, reduced to what reconstruction reads.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TextLayerMeta {
    /// Style sheet of the first style run, when the run array is non-empty.
    pub style_sheet: Option<StyleSheet>,
    /// Document font resources.
    pub font_set: Vec<FontResource>,
    /// Justification code of the first paragraph run.
    pub paragraph_justification: Option<i64>,
    /// Type layer transform.
    pub transform: TextTransform,
}

impl TextLayerMeta {
    /// Paragraph justification code that means "centered".
    pub const JUSTIFY_CENTER: i64 = 2;

    /// First font resource name, if any.
    pub fn first_font(&self) -> Option<&str> {
        self.font_set.first().map(|f| f.name.as_str())
    }

    /// Whether the first paragraph is centered.
    pub fn is_centered(&self) -> bool {
        self.paragraph_justification == Some(Self::JUSTIFY_CENTER)
    }
}

/// Style sheet data of a style run (text-engine field names).
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StyleSheet {
    /// Font size in points, before the layer transform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    /// Synthetic bold.
    #[serde(default)]
    pub faux_bold: bool,
    /// Synthetic italic.
    #[serde(default)]
    pub faux_italic: bool,
    /// Fill color components.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<FillColor>,
    /// Caps mode; values > 0 mean all caps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_caps: Option<i64>,
}

/// Fill color as stored by the text engine: 4 components (alpha + RGB) or 5 (unused + CMYK).
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FillColor {
    /// Raw components.
    #[serde(rename = "Values")]
    pub values: Vec<f64>,
}

/// Font resource entry.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FontResource {
    /// PostScript-style font name, e.g. `Arial-BoldMT`.
    pub name: String,
}

/// Scale components of a type layer's 2D transform.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TextTransform {
    /// Horizontal scale.
    pub xx: f64,
    /// Vertical scale.
    pub yy: f64,
}

impl Default for TextTransform {
    fn default() -> Self {
        Self { xx: 1.0, yy: 1.0 }
    }
}

impl TextTransform {
    /// Mean of the horizontal and vertical scale; used to scale font sizes.
    pub fn average_scale(self) -> f64 {
        (self.xx + self.yy) / 2.0
    }
}

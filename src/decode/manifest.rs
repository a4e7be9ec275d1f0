use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::decode::DocumentDecoder;
use crate::decode::model::{
    DecodedDocument, DecodedLayer, FontResource, LayerProperties, LayerRaster, StyleSheet,
    TextLayerMeta, TextMetadata, TextTransform,
};
use crate::foundation::core::{DocSize, LayerBounds};
use crate::foundation::error::{StageError, StageResult};

/// Decoder for JSON layered-document manifests.
///
/// ```json
/// {
///   "width": 200, "height": 100,
///   "layers": [
///     { "name": "Title", "left": 20, "top": 10, "width": 160, "height": 30,
///       "fill": [0, 0, 0, 0],
///       "text": { "content": "Hello", "fonts": ["Arial-BoldMT"], "justification": 2,
///                 "style": { "FontSize": 24, "FillColor": { "Values": [1, 255, 0, 0] } } } },
///     { "name": "Background", "left": 0, "top": 0, "image": "bg.png" }
///   ]
/// }
/// ```
///
/// Layers are listed front-most first, the way layered documents store them. `image` paths are
/// relative to the decoder's assets root.
#[derive(Clone, Debug)]
pub struct ManifestDecoder {
    assets_root: PathBuf,
}

impl ManifestDecoder {
    /// Create a decoder resolving image paths against `assets_root`.
    pub fn new(assets_root: impl Into<PathBuf>) -> Self {
        Self {
            assets_root: assets_root.into(),
        }
    }
}

impl DocumentDecoder for ManifestDecoder {
    fn parse(&self, bytes: &[u8]) -> StageResult<DecodedDocument> {
        let def: DocumentDef = serde_json::from_slice(bytes)
            .map_err(|e| StageError::decode(format!("unreadable document manifest: {e}")))?;
        let size = DocSize::new(def.width, def.height)
            .map_err(|e| StageError::decode(e.to_string()))?;

        let mut layers = Vec::with_capacity(def.layers.len());
        for layer in def.layers {
            layers.push(self.decode_layer(layer)?);
        }
        Ok(DecodedDocument { size, layers })
    }
}

impl ManifestDecoder {
    fn decode_layer(&self, def: LayerDef) -> StageResult<DecodedLayer> {
        let (bounds, pixels) = match (&def.fill, &def.image) {
            (Some(_), Some(_)) => {
                return Err(StageError::decode(format!(
                    "layer '{}' sets both fill and image",
                    def.name
                )));
            }
            (_, Some(rel)) => {
                let bytes = self.read_bytes(rel)?;
                let (w, h, rgba) = decode_image_rgba8(&bytes)
                    .map_err(|e| StageError::decode(format!("layer '{}': {e:#}", def.name)))?;
                let bounds = LayerBounds {
                    left: def.left,
                    top: def.top,
                    width: w,
                    height: h,
                };
                (bounds, rgba)
            }
            (fill, None) => {
                let (Some(width), Some(height)) = (def.width, def.height) else {
                    return Err(StageError::decode(format!(
                        "layer '{}' needs width and height",
                        def.name
                    )));
                };
                let bounds = LayerBounds {
                    left: def.left,
                    top: def.top,
                    width,
                    height,
                };
                let px = fill.unwrap_or([0, 0, 0, 0]);
                let mut rgba = vec![0u8; bounds.rgba_len()];
                for c in rgba.chunks_exact_mut(4) {
                    c.copy_from_slice(&px);
                }
                (bounds, rgba)
            }
        };

        let (text, text_meta) = match def.text {
            None => (None, TextMetadata::NoText),
            Some(t) => {
                let meta = TextLayerMeta {
                    style_sheet: t.style,
                    font_set: t
                        .fonts
                        .into_iter()
                        .map(|name| FontResource { name })
                        .collect(),
                    paragraph_justification: t.justification,
                    transform: t.transform,
                };
                (Some(t.content), TextMetadata::TextLayer(meta))
            }
        };

        Ok(DecodedLayer {
            name: def.name,
            bounds,
            properties: LayerProperties {
                opacity: def.opacity,
                hidden: def.hidden,
                text,
                text_meta,
            },
            raster: Box::new(BufferRaster {
                bounds,
                pixels,
                mask: def.mask,
                hidden: def.hidden,
            }),
        })
    }

    fn read_bytes(&self, rel: &str) -> StageResult<Vec<u8>> {
        let norm = normalize_rel_path(rel)?;
        let p = self.assets_root.join(Path::new(&norm));
        let bytes = std::fs::read(&p)
            .with_context(|| format!("read layer image '{}'", p.display()))?;
        Ok(bytes)
    }
}

/// In-memory straight RGBA8 layer raster.
struct BufferRaster {
    bounds: LayerBounds,
    pixels: Vec<u8>,
    mask: Option<LayerBounds>,
    hidden: bool,
}

impl LayerRaster for BufferRaster {
    fn composite(&self, clip: bool, visible: bool) -> StageResult<Vec<u8>> {
        if self.pixels.len() != self.bounds.rgba_len() {
            return Err(StageError::compositing(format!(
                "raster holds {} bytes, expected {}",
                self.pixels.len(),
                self.bounds.rgba_len()
            )));
        }
        if visible && self.hidden {
            return Ok(vec![0u8; self.pixels.len()]);
        }

        let mut out = self.pixels.clone();
        if let (true, Some(mask)) = (clip, self.mask) {
            let w = self.bounds.width as usize;
            for (i, px) in out.chunks_exact_mut(4).enumerate() {
                let x = self.bounds.left + (i % w) as i32;
                let y = self.bounds.top + (i / w) as i32;
                let inside = x >= mask.left
                    && y >= mask.top
                    && x < mask.left + mask.width as i32
                    && y < mask.top + mask.height as i32;
                if !inside {
                    px.fill(0);
                }
            }
        }
        Ok(out)
    }
}

fn decode_image_rgba8(bytes: &[u8]) -> anyhow::Result<(u32, u32, Vec<u8>)> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok((width, height, rgba.into_raw()))
}

/// Normalize and validate manifest-relative image paths.
///
/// The normalized result uses `/` separators, removes `.` segments, and rejects absolute paths or
/// parent traversals (`..`).
pub(crate) fn normalize_rel_path(source: &str) -> StageResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(StageError::decode("layer image paths must be relative"));
    }
    if s.is_empty() {
        return Err(StageError::decode("layer image path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(StageError::decode(
                "layer image paths must not contain '..'",
            ));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(StageError::decode(
            "layer image path must contain a file name",
        ));
    }

    Ok(out.join("/"))
}

#[derive(Debug, Clone, serde::Deserialize)]
struct DocumentDef {
    width: u32,
    height: u32,
    #[serde(default)]
    layers: Vec<LayerDef>,
}

#[derive(Debug, Clone, serde::Deserialize)]
struct LayerDef {
    name: String,
    #[serde(default)]
    left: i32,
    #[serde(default)]
    top: i32,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default = "default_opacity")]
    opacity: u8,
    #[serde(default)]
    hidden: bool,
    #[serde(default)]
    fill: Option<[u8; 4]>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    mask: Option<LayerBounds>,
    #[serde(default)]
    text: Option<TextDef>,
}

fn default_opacity() -> u8 {
    255
}

#[derive(Debug, Clone, serde::Deserialize)]
struct TextDef {
    content: String,
    #[serde(default)]
    style: Option<StyleSheet>,
    #[serde(default)]
    fonts: Vec<String>,
    #[serde(default)]
    justification: Option<i64>,
    #[serde(default)]
    transform: TextTransform,
}

#[cfg(test)]
#[path = "../../tests/unit/decode/manifest.rs"]
mod tests;

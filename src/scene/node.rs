use crate::foundation::core::{Affine, DocSize, Point, Rect, Rgb8, Vec2};
use crate::reconstruct::FontDescriptor;

/// Clip shared by every node on the stage: the document rectangle in scene space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mask {
    pub rect: Rect,
}

impl Mask {
    pub fn document(doc: DocSize) -> Self {
        Self { rect: doc.rect() }
    }
}

/// Layer pixels at native size, anchored at the layer's top-left document coordinate.
#[derive(Clone, Debug, PartialEq)]
pub struct BitmapNode {
    pub id: String,
    pub width: u32,
    pub height: u32,
    /// Straight RGBA8, `width * height * 4` bytes.
    pub pixels: Vec<u8>,
    pub position: Point,
    pub scale: Vec2,
    pub opacity: f64,
    pub visible: bool,
    pub mask: Option<Mask>,
}

/// Single-line text run. `position` is the top-left of the run's box.
#[derive(Clone, Debug, PartialEq)]
pub struct TextNode {
    pub id: String,
    pub text: String,
    pub font: FontDescriptor,
    pub color: Rgb8,
    pub bold: bool,
    pub italic: bool,
    pub position: Point,
    pub scale: Vec2,
    pub opacity: f64,
    pub visible: bool,
    pub mask: Option<Mask>,
}

/// Anything the compositor can draw.
#[derive(Clone, Debug, PartialEq)]
pub enum RenderObject {
    Bitmap(BitmapNode),
    Text(TextNode),
}

impl RenderObject {
    pub fn id(&self) -> &str {
        match self {
            Self::Bitmap(b) => &b.id,
            Self::Text(t) => &t.id,
        }
    }

    pub fn position(&self) -> Point {
        match self {
            Self::Bitmap(b) => b.position,
            Self::Text(t) => t.position,
        }
    }

    pub fn set_position(&mut self, p: Point) {
        match self {
            Self::Bitmap(b) => b.position = p,
            Self::Text(t) => t.position = p,
        }
    }

    pub fn scale(&self) -> Vec2 {
        match self {
            Self::Bitmap(b) => b.scale,
            Self::Text(t) => t.scale,
        }
    }

    pub fn set_scale(&mut self, s: Vec2) {
        match self {
            Self::Bitmap(b) => b.scale = s,
            Self::Text(t) => t.scale = s,
        }
    }

    pub fn opacity(&self) -> f64 {
        match self {
            Self::Bitmap(b) => b.opacity,
            Self::Text(t) => t.opacity,
        }
    }

    pub fn visible(&self) -> bool {
        match self {
            Self::Bitmap(b) => b.visible,
            Self::Text(t) => t.visible,
        }
    }

    pub fn mask(&self) -> Option<Mask> {
        match self {
            Self::Bitmap(b) => b.mask,
            Self::Text(t) => t.mask,
        }
    }

    /// Object-to-scene transform: scale about the top-left corner, then translate.
    pub fn transform(&self) -> Affine {
        let p = self.position();
        let s = self.scale();
        Affine::translate((p.x, p.y)) * Affine::scale_non_uniform(s.x, s.y)
    }

    pub fn as_text(&self) -> Option<&TextNode> {
        match self {
            Self::Text(t) => Some(t),
            Self::Bitmap(_) => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut TextNode> {
        match self {
            Self::Text(t) => Some(t),
            Self::Bitmap(_) => None,
        }
    }
}

use crate::foundation::core::{DocSize, LayerBounds};

/// What a layer turns into on the stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameKind {
    /// Pixel layer drawn as a bitmap.
    Image,
    /// Type layer drawn as a text run.
    Text,
}

/// Immutable layout record of one layer.
///
/// Position is the layer's center as an integer percentage of the document size.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Frame {
    /// `F_` identifier, shared with the layer's render object.
    pub id: String,
    /// Layer name from the document.
    pub name: String,
    pub kind: FrameKind,
    /// Center X, percent of document width.
    pub x: i32,
    /// Center Y, percent of document height.
    pub y: i32,
    /// Native layer width in document pixels.
    pub width: u32,
    /// Native layer height in document pixels.
    pub height: u32,
    /// Reserved; always 0.
    pub rotation: f64,
    /// Reserved; always false.
    pub flip_x: bool,
    /// Reserved; always false.
    pub flip_y: bool,
}

impl Frame {
    /// Build the record for a layer occupying `bounds` in a `doc`-sized document.
    pub fn new(
        id: String,
        name: impl Into<String>,
        kind: FrameKind,
        bounds: LayerBounds,
        doc: DocSize,
    ) -> Self {
        let (x, y) = percent_position(bounds, doc);
        Self {
            id,
            name: name.into(),
            kind,
            x,
            y,
            width: bounds.width,
            height: bounds.height,
            rotation: 0.0,
            flip_x: false,
            flip_y: false,
        }
    }
}

/// `floor(center / doc * 100)` per axis.
pub fn percent_position(bounds: LayerBounds, doc: DocSize) -> (i32, i32) {
    let c = bounds.center();
    let px = (c.x / f64::from(doc.width) * 100.0).floor();
    let py = (c.y / f64::from(doc.height) * 100.0).floor();
    (px as i32, py as i32)
}

#[cfg(test)]
#[path = "../../tests/unit/reconstruct/frame.rs"]
mod tests;

use crate::foundation::core::Rgb8;

/// Live, editable projection of one layer.
///
/// Only the edit reducer mutates an instance after reconstruction.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Instance {
    pub id: String,
    /// Frame (and render object) this instance mirrors.
    pub frame_id: String,
    pub name: String,
    /// Local X, percent of the instance's own box; starts at its center.
    pub x: f64,
    /// Local Y, percent of the instance's own box.
    pub y: f64,
    /// Current width: native width times `scale_x`.
    pub width: f64,
    /// Current height: native height times `scale_y`.
    pub height: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub rotation: f64,
    pub visible: bool,
    /// Opacity in 0.0..=1.0.
    pub opacity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<TextInstance>,
}

/// Text state of a type layer instance.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct TextInstance {
    pub text: String,
    pub font_family: String,
    pub font_size: u32,
    pub bold: bool,
    pub italic: bool,
    pub color: Rgb8,
}

impl Instance {
    pub fn new(
        id: String,
        frame_id: String,
        name: impl Into<String>,
        width: u32,
        height: u32,
        opacity: u8,
        visible: bool,
    ) -> Self {
        Self {
            id,
            frame_id,
            name: name.into(),
            x: 50.0,
            y: 50.0,
            width: f64::from(width),
            height: f64::from(height),
            scale_x: 1.0,
            scale_y: 1.0,
            rotation: 0.0,
            visible,
            opacity: f64::from(opacity) / 255.0,
            text: None,
        }
    }

    pub fn with_text(mut self, text: TextInstance) -> Self {
        self.text = Some(text);
        self
    }

    pub fn is_text(&self) -> bool {
        self.text.is_some()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/reconstruct/instance.rs"]
mod tests;

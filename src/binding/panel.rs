use crate::foundation::core::Rgb8;
use crate::foundation::error::{StageError, StageResult};
use crate::reconstruct::FrameKind;
use crate::scene::{LayerBinding, RenderObject};

/// Current value shown by a control.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    Color(Rgb8),
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Field {
    pub name: &'static str,
    pub value: FieldValue,
}

impl Field {
    fn number(name: &'static str, v: f64) -> Self {
        Self {
            name,
            value: FieldValue::Number(v),
        }
    }
}

/// Control section of one layer.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Section {
    /// `<layerName>-<frameId>`.
    pub key: String,
    pub kind: FrameKind,
    pub fields: Vec<Field>,
}

impl Section {
    /// Section mirroring the object's current values.
    pub fn mirror(binding: &LayerBinding, object: &RenderObject) -> Self {
        Self {
            key: binding.key.clone(),
            kind: binding.kind,
            fields: fields_for(binding, object),
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.value)
    }
}

/// Section key of a layer.
pub fn section_key(layer_name: &str, frame_id: &str) -> String {
    format!("{layer_name}-{frame_id}")
}

fn fields_for(binding: &LayerBinding, object: &RenderObject) -> Vec<Field> {
    let scale = object.scale();
    match object {
        RenderObject::Bitmap(_) => vec![
            Field::number("percent_x", binding.percent.x),
            Field::number("percent_y", binding.percent.y),
            Field::number("scale_x", scale.x),
            Field::number("scale_y", scale.y),
        ],
        RenderObject::Text(t) => vec![
            Field::number("x", t.position.x),
            Field::number("y", t.position.y),
            Field::number("scale_x", scale.x),
            Field::number("scale_y", scale.y),
            Field {
                name: "text",
                value: FieldValue::Text(t.text.clone()),
            },
            Field {
                name: "color",
                value: FieldValue::Color(t.color),
            },
            Field::number("font_size", f64::from(t.font.size_px)),
            Field {
                name: "font_family",
                value: FieldValue::Text(t.font.family.clone()),
            },
        ],
    }
}

/// Generated property panel: one section per reconstructed layer.
#[derive(Clone, Debug, Default, serde::Serialize)]
pub struct ControlPanel {
    sections: Vec<Section>,
}

impl ControlPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, section: Section) -> StageResult<()> {
        if self.section(&section.key).is_some() {
            return Err(StageError::validation(format!(
                "control section '{}' already exists",
                section.key
            )));
        }
        self.sections.push(section);
        Ok(())
    }

    /// Replace a section's fields with fresh values.
    pub fn refresh(&mut self, binding: &LayerBinding, object: &RenderObject) {
        if let Some(s) = self.sections.iter_mut().find(|s| s.key == binding.key) {
            s.fields = fields_for(binding, object);
        }
    }

    pub fn section(&self, key: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.key == key)
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|s| s.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Remove every section.
    pub fn clear(&mut self) {
        self.sections.clear();
    }
}

use serde_json::Value as JsonValue;

use crate::foundation::core::Rgb8;
use crate::foundation::error::{StageError, StageResult};
use crate::reconstruct::FrameKind;

/// A typed change coming from one control.
#[derive(Clone, Debug, PartialEq)]
pub enum Edit {
    /// Image center X as percent of document width.
    PercentX(f64),
    /// Image center Y as percent of document height.
    PercentY(f64),
    /// Text left edge, document pixels.
    X(f64),
    /// Text top edge, document pixels.
    Y(f64),
    ScaleX(f64),
    ScaleY(f64),
    Text(String),
    Color(Rgb8),
    FontSize(u32),
    FontFamily(String),
}

impl Edit {
    /// Control name the edit comes from.
    pub fn field_name(&self) -> &'static str {
        match self {
            Self::PercentX(_) => "percent_x",
            Self::PercentY(_) => "percent_y",
            Self::X(_) => "x",
            Self::Y(_) => "y",
            Self::ScaleX(_) => "scale_x",
            Self::ScaleY(_) => "scale_y",
            Self::Text(_) => "text",
            Self::Color(_) => "color",
            Self::FontSize(_) => "font_size",
            Self::FontFamily(_) => "font_family",
        }
    }

    /// Whether a section of `kind` exposes this control.
    pub fn applies_to(&self, kind: FrameKind) -> bool {
        match self {
            Self::ScaleX(_) | Self::ScaleY(_) => true,
            Self::PercentX(_) | Self::PercentY(_) => kind == FrameKind::Image,
            _ => kind == FrameKind::Text,
        }
    }

    /// Parse a control change notification.
    pub fn from_field(name: &str, value: &JsonValue) -> StageResult<Self> {
        let number = || {
            value
                .as_f64()
                .filter(|v| v.is_finite())
                .ok_or_else(|| StageError::validation(format!("'{name}' expects a number")))
        };
        let string = || {
            value
                .as_str()
                .ok_or_else(|| StageError::validation(format!("'{name}' expects a string")))
        };
        Ok(match name {
            "percent_x" => Self::PercentX(number()?),
            "percent_y" => Self::PercentY(number()?),
            "x" => Self::X(number()?),
            "y" => Self::Y(number()?),
            "scale_x" => Self::ScaleX(number()?),
            "scale_y" => Self::ScaleY(number()?),
            "text" => Self::Text(string()?.to_owned()),
            "color" => Self::Color(Rgb8::parse_hex(string()?)?),
            "font_size" => {
                let v = number()?.round();
                if !(1.0..=f64::from(u16::MAX)).contains(&v) {
                    return Err(StageError::validation("'font_size' must be between 1 and 65535"));
                }
                Self::FontSize(v as u32)
            }
            "font_family" => {
                let family = string()?.trim();
                if family.is_empty() {
                    return Err(StageError::validation("'font_family' must not be empty"));
                }
                Self::FontFamily(family.to_owned())
            }
            other => {
                return Err(StageError::validation(format!("unknown control '{other}'")));
            }
        })
    }
}

/// One recorded control change, as stored in an edits file.
#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
pub struct EditRecord {
    pub section: String,
    pub field: String,
    pub value: JsonValue,
}

impl EditRecord {
    pub fn to_edit(&self) -> StageResult<Edit> {
        Edit::from_field(&self.field, &self.value)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/binding/edit.rs"]
mod tests;

use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value as JsonValue;

use crate::decode::StyleSheet;
use crate::foundation::core::{DocSize, LayerBounds};
use crate::foundation::error::{StageError, StageResult};

/// Fixed signature every message must carry.
pub const SIGNATURE: &str = "this-is-a-message";

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Message type tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum MessageKind {
    /// Main → worker: raw document bytes.
    ParseData,
    /// Worker → main: one decoded, composited layer.
    Layer,
    /// Worker → main: flattened document preview.
    MainImageData,
    /// Worker → main: all layers have been sent.
    EndParsing,
}

impl MessageKind {
    /// All known kinds.
    pub const ALL: [Self; 4] = [
        Self::ParseData,
        Self::Layer,
        Self::MainImageData,
        Self::EndParsing,
    ];

    /// Wire name of the kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ParseData => "ParseData",
            Self::Layer => "Layer",
            Self::MainImageData => "MainImageData",
            Self::EndParsing => "EndParsing",
        }
    }

    /// Look a kind up by wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flattened whole-document raster.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DocumentPreview {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Straight RGBA8 pixels.
    pub pixels: Vec<u8>,
}

/// Normalized per-layer metadata sent from the worker, one per decoded layer.
///
/// Field names on the wire follow the camel-case layer record (`pixelData`, `psdWidth`, ...).
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerPayload {
    /// Composited straight RGBA8 pixels, `width * height * 4` bytes.
    pub pixel_data: Vec<u8>,
    /// Layer name.
    pub layer_name: String,
    /// Left edge in document pixels.
    pub left: i32,
    /// Top edge in document pixels.
    pub top: i32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Opacity, 0..=255.
    pub opacity: u8,
    /// Text content; present only for non-empty type layers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Hidden in the source document.
    pub hidden: bool,
    /// First style run's style sheet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_style: Option<StyleSheet>,
    /// First font resource name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    /// Paragraph justification is centered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_center: Option<bool>,
    /// Averaged horizontal/vertical scale of the type transform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_transform: Option<f64>,
    /// Caps mode of the first style run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_caps: Option<i64>,
    /// Document width.
    pub psd_width: u32,
    /// Document height.
    pub psd_height: u32,
}

impl LayerPayload {
    /// Layer bounding box.
    pub fn bounds(&self) -> LayerBounds {
        LayerBounds {
            left: self.left,
            top: self.top,
            width: self.width,
            height: self.height,
        }
    }

    /// Document dimensions.
    pub fn doc_size(&self) -> StageResult<DocSize> {
        DocSize::new(self.psd_width, self.psd_height)
    }
}

/// Typed message body.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    /// Whole-file buffer.
    ParseData(Vec<u8>),
    /// One layer.
    Layer(Box<LayerPayload>),
    /// Optional flattened preview.
    MainImageData(Option<DocumentPreview>),
    /// Empty completion marker.
    EndParsing,
}

impl Payload {
    /// The message kind this payload belongs to.
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::ParseData(_) => MessageKind::ParseData,
            Self::Layer(_) => MessageKind::Layer,
            Self::MainImageData(_) => MessageKind::MainImageData,
            Self::EndParsing => MessageKind::EndParsing,
        }
    }

    fn to_json(&self) -> StageResult<JsonValue> {
        let v = match self {
            Self::ParseData(bytes) => serde_json::to_value(bytes),
            Self::Layer(layer) => serde_json::to_value(layer.as_ref()),
            Self::MainImageData(preview) => serde_json::to_value(preview),
            Self::EndParsing => Ok(JsonValue::Object(serde_json::Map::new())),
        };
        v.map_err(|e| StageError::protocol(format!("payload is not serializable: {e}")))
    }

    fn from_json(kind: MessageKind, v: JsonValue) -> StageResult<Self> {
        let bad =
            |e: serde_json::Error| StageError::protocol(format!("malformed {kind} payload: {e}"));
        Ok(match kind {
            MessageKind::ParseData => Self::ParseData(serde_json::from_value(v).map_err(bad)?),
            MessageKind::Layer => Self::Layer(Box::new(serde_json::from_value(v).map_err(bad)?)),
            MessageKind::MainImageData => {
                Self::MainImageData(serde_json::from_value(v).map_err(bad)?)
            }
            MessageKind::EndParsing => Self::EndParsing,
        })
    }
}

/// Cross-thread message. Created by the sender, consumed once by the receiver.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    /// Type tag.
    pub kind: MessageKind,
    /// Body. Layer pixel buffers move with the message.
    pub value: Payload,
    /// Must equal [`SIGNATURE`].
    pub signature: String,
    /// Creation time, ms since the Unix epoch.
    pub timestamp: u64,
}

impl Message {
    /// Stamp a new message with the signature and the current time.
    pub fn create(kind: MessageKind, value: Payload) -> Self {
        Self {
            kind,
            value,
            signature: SIGNATURE.to_owned(),
            timestamp: now_millis(),
        }
    }

    /// `ParseData` carrying a whole-file buffer.
    pub fn parse_data(bytes: Vec<u8>) -> Self {
        Self::create(MessageKind::ParseData, Payload::ParseData(bytes))
    }

    /// `Layer` carrying one layer.
    pub fn layer(layer: LayerPayload) -> Self {
        Self::create(MessageKind::Layer, Payload::Layer(Box::new(layer)))
    }

    /// Empty `EndParsing`.
    pub fn end_parsing() -> Self {
        Self::create(MessageKind::EndParsing, Payload::EndParsing)
    }

    /// Time spent in transit, measured against the local clock.
    pub fn latency_ms(&self) -> u64 {
        now_millis().saturating_sub(self.timestamp)
    }

    /// Untyped wire form: `{ type, value, signature, timestamp }`.
    pub fn to_wire(&self) -> StageResult<JsonValue> {
        Ok(serde_json::json!({
            "type": self.kind.as_str(),
            "value": self.value.to_json()?,
            "signature": self.signature,
            "timestamp": self.timestamp,
        }))
    }

    /// Validate and decode the untyped wire form.
    pub fn from_wire(candidate: JsonValue) -> StageResult<Self> {
        validate_wire(&candidate)?;
        let JsonValue::Object(mut obj) = candidate else {
            return Err(StageError::protocol("data is not a message"));
        };
        let kind = obj
            .get("type")
            .and_then(JsonValue::as_str)
            .and_then(MessageKind::from_name)
            .ok_or_else(|| StageError::protocol("message type is not known"))?;
        let timestamp = obj
            .get("timestamp")
            .and_then(JsonValue::as_u64)
            .unwrap_or(0);
        let value = obj.remove("value").unwrap_or(JsonValue::Null);
        Ok(Self {
            kind,
            value: Payload::from_json(kind, value)?,
            signature: SIGNATURE.to_owned(),
            timestamp,
        })
    }
}

/// Check a typed message before any field is read.
pub fn validate(candidate: &Message) -> StageResult<()> {
    if candidate.signature != SIGNATURE {
        return Err(StageError::protocol(format!(
            "data is not a message (bad signature {:?})",
            candidate.signature
        )));
    }
    if candidate.value.kind() != candidate.kind {
        return Err(StageError::protocol(format!(
            "message type {} carries a {} payload",
            candidate.kind,
            candidate.value.kind()
        )));
    }
    Ok(())
}

/// Check the untyped wire form: a mapping with `type` and `value`, the known signature, and a
/// known `type`.
pub fn validate_wire(candidate: &JsonValue) -> StageResult<()> {
    let Some(obj) = candidate.as_object() else {
        return Err(StageError::protocol(format!(
            "data is not a message (got {})",
            json_type_name(candidate)
        )));
    };
    if !obj.contains_key("type") || !obj.contains_key("value") {
        return Err(StageError::protocol(
            "data is not a message (missing type or value)",
        ));
    }
    if obj.get("signature").and_then(JsonValue::as_str) != Some(SIGNATURE) {
        return Err(StageError::protocol(
            "data is not a message (missing or wrong signature)",
        ));
    }
    match obj.get("type").and_then(JsonValue::as_str) {
        Some(name) if MessageKind::from_name(name).is_some() => Ok(()),
        Some(name) => Err(StageError::protocol(format!(
            "unexpected message type: {name}"
        ))),
        None => Err(StageError::protocol("unexpected message type: not a string")),
    }
}

fn json_type_name(v: &JsonValue) -> &'static str {
    match v {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

#[cfg(test)]
#[path = "../../tests/unit/protocol/message.rs"]
mod tests;

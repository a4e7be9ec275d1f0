use crate::binding::{ControlPanel, Section, section_key};
use crate::foundation::core::{Point, Vec2};
use crate::foundation::error::{StageError, StageResult};
use crate::protocol::LayerPayload;
use crate::reconstruct::frame::{Frame, FrameKind};
use crate::reconstruct::instance::{Instance, TextInstance};
use crate::reconstruct::style::{
    FALLBACK_FAMILY, FontDescriptor, align_center, apply_caps, fill_color, font_family_base,
    font_size,
};
use crate::scene::{BitmapNode, Compositor, LayerBinding, Mask, RenderObject, SceneState, TextNode};

/// Frame prefix of generated identifiers.
pub const FRAME_PREFIX: &str = "F";
/// Instance prefix of generated identifiers.
pub const INSTANCE_PREFIX: &str = "I";

/// What one layer turned into.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reconstructed {
    pub frame_id: String,
    pub instance_id: String,
    pub section_key: String,
    pub kind: FrameKind,
    /// Family the text node asks for; the caller decides whether it must be fetched.
    pub font_family: Option<String>,
}

/// Build the frame, instance, render object and control section for one decoded layer.
///
/// The render object is attached to the compositor; redrawing is left to the caller. Text layers
/// attach only their text node, positioned at the layer's top-left corner, or horizontally
/// centered in the document when the paragraph is centered.
#[tracing::instrument(skip_all, fields(layer = %layer.layer_name))]
pub fn reconstruct_layer(
    layer: LayerPayload,
    scene: &mut SceneState,
    compositor: &mut Compositor,
    panel: &mut ControlPanel,
) -> StageResult<Reconstructed> {
    let doc = layer.doc_size()?;
    let bounds = layer.bounds();
    if layer.pixel_data.len() != bounds.rgba_len() {
        return Err(StageError::validation(format!(
            "layer '{}' carries {} pixel bytes, expected {}",
            layer.layer_name,
            layer.pixel_data.len(),
            bounds.rgba_len()
        )));
    }

    let kind = if layer.text.is_some() {
        FrameKind::Text
    } else {
        FrameKind::Image
    };
    let frame_id = scene.ids_mut().generate(FRAME_PREFIX)?;
    let instance_id = scene.ids_mut().generate(INSTANCE_PREFIX)?;
    let frame = Frame::new(frame_id.clone(), &layer.layer_name, kind, bounds, doc);
    let key = section_key(&layer.layer_name, &frame_id);

    let mask = Some(Mask::document(doc));
    let opacity = f64::from(layer.opacity) / 255.0;
    let visible = !layer.hidden;
    let anchor = Point::new(f64::from(bounds.left), f64::from(bounds.top));
    let mut instance = Instance::new(
        instance_id.clone(),
        frame_id.clone(),
        &layer.layer_name,
        bounds.width,
        bounds.height,
        layer.opacity,
        visible,
    );
    let binding = LayerBinding {
        key: key.clone(),
        frame_id: frame_id.clone(),
        instance_id: instance_id.clone(),
        kind,
        doc,
        width: bounds.width,
        height: bounds.height,
        centered: layer.is_center == Some(true),
        percent: Point::new(f64::from(frame.x), f64::from(frame.y)),
    };

    let (object, font_family) = match layer.text.as_deref() {
        None => {
            let node = BitmapNode {
                id: frame_id.clone(),
                width: bounds.width,
                height: bounds.height,
                pixels: layer.pixel_data,
                position: anchor,
                scale: Vec2::new(1.0, 1.0),
                opacity,
                visible,
                mask,
            };
            (RenderObject::Bitmap(node), None)
        }
        Some(raw_text) => {
            let style = layer.font_style.clone().unwrap_or_default();
            let family = layer
                .font_family
                .as_deref()
                .map(font_family_base)
                .filter(|f| !f.is_empty())
                .unwrap_or(FALLBACK_FAMILY)
                .to_owned();
            let size = font_size(style.font_size, layer.font_transform.unwrap_or(1.0));
            let color = fill_color(style.fill_color.as_ref());
            let text = apply_caps(raw_text, layer.font_caps);

            let mut node = TextNode {
                id: frame_id.clone(),
                text: text.clone(),
                font: FontDescriptor::new(size, family.clone()),
                color,
                bold: style.faux_bold,
                italic: style.faux_italic,
                position: anchor,
                scale: Vec2::new(1.0, 1.0),
                opacity,
                visible,
                mask,
            };
            if binding.centered {
                let measured = compositor.measure_text(&node);
                node.position.x = align_center(f64::from(doc.width), measured * node.scale.x);
            }
            tracing::debug!(x = node.position.x, font = %node.font, %color, "text node");

            instance = instance.with_text(TextInstance {
                text,
                font_family: family.clone(),
                font_size: size,
                bold: style.faux_bold,
                italic: style.faux_italic,
                color,
            });
            (RenderObject::Text(node), Some(family))
        }
    };

    panel.add(Section::mirror(&binding, &object))?;
    compositor.attach(object);
    scene.push_layer(frame, instance, binding);

    Ok(Reconstructed {
        frame_id,
        instance_id,
        section_key: key,
        kind,
        font_family,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/reconstruct/pipeline.rs"]
mod tests;

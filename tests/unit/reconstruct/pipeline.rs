use super::*;
use crate::binding::FieldValue;
use crate::decode::{FillColor, StyleSheet};
use crate::foundation::core::Rgb8;
use crate::reconstruct::IdRegistry;
use crate::render::RecordingSurface;

fn image_layer(name: &str) -> LayerPayload {
    LayerPayload {
        pixel_data: vec![9; 20 * 20 * 4],
        layer_name: name.to_owned(),
        left: 10,
        top: 10,
        width: 20,
        height: 20,
        opacity: 255,
        text: None,
        hidden: false,
        font_style: None,
        font_family: None,
        is_center: None,
        font_transform: None,
        font_caps: None,
        psd_width: 100,
        psd_height: 100,
    }
}

fn text_layer() -> LayerPayload {
    LayerPayload {
        pixel_data: vec![0; 4],
        width: 1,
        height: 1,
        text: Some("hello".to_owned()),
        font_style: Some(StyleSheet {
            font_size: Some(10.0),
            fill_color: Some(FillColor {
                values: vec![1.0, 0.0, 0.0, 0.0, 0.0],
            }),
            ..StyleSheet::default()
        }),
        font_family: Some("Roboto-Bold".to_owned()),
        is_center: Some(true),
        font_transform: Some(2.0),
        font_caps: Some(1),
        psd_width: 200,
        ..image_layer("title")
    }
}

struct Fixture {
    scene: SceneState,
    compositor: Compositor,
    panel: ControlPanel,
}

impl Fixture {
    fn new() -> Self {
        Self {
            scene: SceneState::new(IdRegistry::new(7, 16)),
            compositor: Compositor::new(Box::new(RecordingSurface::new(0.5))),
            panel: ControlPanel::new(),
        }
    }

    fn run(&mut self, layer: LayerPayload) -> StageResult<Reconstructed> {
        reconstruct_layer(layer, &mut self.scene, &mut self.compositor, &mut self.panel)
    }
}

#[test]
fn image_layer_becomes_frame_instance_bitmap_and_section() {
    let mut fx = Fixture::new();
    let out = fx.run(image_layer("bg")).unwrap();

    assert_eq!(out.kind, FrameKind::Image);
    assert!(out.frame_id.starts_with("F_"));
    assert!(out.instance_id.starts_with("I_"));
    assert_eq!(out.section_key, format!("bg-{}", out.frame_id));
    assert_eq!(out.font_family, None);

    let frame = fx.scene.frame(&out.frame_id).unwrap();
    assert_eq!((frame.x, frame.y), (20, 20));
    let instance = fx.scene.instance(&out.instance_id).unwrap();
    assert_eq!(instance.frame_id, out.frame_id);
    assert!(instance.text.is_none());

    let obj = fx.compositor.get(&out.frame_id).unwrap();
    assert_eq!(obj.position(), Point::new(10.0, 10.0));
    assert_eq!(obj.mask().map(|m| m.rect.width()), Some(100.0));

    let section = fx.panel.section(&out.section_key).unwrap();
    assert_eq!(section.field("percent_x"), Some(&FieldValue::Number(20.0)));
    assert_eq!(fx.compositor.render_count(), 0);
}

#[test]
fn text_layer_is_styled_and_centered() {
    let mut fx = Fixture::new();
    let out = fx.run(text_layer()).unwrap();
    assert_eq!(out.kind, FrameKind::Text);
    assert_eq!(out.font_family.as_deref(), Some("Roboto"));

    let node = fx.compositor.get(&out.frame_id).unwrap().as_text().unwrap();
    assert_eq!(node.text, "HELLO");
    assert_eq!(node.font.to_string(), "20px Roboto");
    assert_eq!(node.color, Rgb8::new(255, 255, 255));
    // 5 chars * 20px * 0.5em = 50px wide in a 200px document.
    assert_eq!(node.position, Point::new(75.0, 10.0));

    let text = fx.scene.instance(&out.instance_id).unwrap().text.clone().unwrap();
    assert_eq!(text.font_size, 20);
    assert_eq!(text.color.to_hex(), "#ffffff");
    assert!(fx.scene.binding(&out.section_key).unwrap().centered);
}

#[test]
fn text_without_font_resource_uses_the_fallback_family() {
    let mut fx = Fixture::new();
    let layer = LayerPayload {
        font_family: None,
        is_center: Some(false),
        ..text_layer()
    };
    let out = fx.run(layer).unwrap();
    let node = fx.compositor.get(&out.frame_id).unwrap().as_text().unwrap();
    assert_eq!(node.font.family, FALLBACK_FAMILY);
    assert_eq!(node.position, Point::new(10.0, 10.0));
}

#[test]
fn pixel_length_mismatch_is_rejected_before_anything_is_created() {
    let mut fx = Fixture::new();
    let mut layer = image_layer("bad");
    layer.pixel_data.truncate(3);
    assert!(matches!(fx.run(layer), Err(StageError::Validation(_))));
    assert!(fx.scene.is_empty());
    assert!(fx.compositor.is_empty());
    assert!(fx.panel.is_empty());
}

#[test]
fn zero_document_size_is_rejected() {
    let mut fx = Fixture::new();
    let layer = LayerPayload {
        psd_width: 0,
        ..image_layer("bg")
    };
    assert!(fx.run(layer).is_err());
}

#[test]
fn repeated_layer_names_get_distinct_sections() {
    let mut fx = Fixture::new();
    let a = fx.run(image_layer("dup")).unwrap();
    let b = fx.run(image_layer("dup")).unwrap();
    assert_ne!(a.section_key, b.section_key);
    assert_eq!(fx.panel.len(), 2);
    assert_eq!(fx.scene.frames().len(), 2);
}

use super::*;
use crate::binding::{FieldValue, FontOutcome, FontRequest};
use crate::decode::ManifestDecoder;
use crate::foundation::core::Vec2;
use crate::reconstruct::FrameKind;
use crate::render::RecordingSurface;

const WAIT: Duration = Duration::from_secs(10);

struct InstantFonts;

impl FontService for InstantFonts {
    fn load(&self, request: FontRequest, done: mpsc::Sender<FontEvent>) {
        let _ = done.send(FontEvent {
            family: request.family,
            token: request.token,
            outcome: FontOutcome::Active(vec![0; 8]),
        });
    }
}

fn session() -> (StageSession, RecordingSurface) {
    let surface = RecordingSurface::new(0.5);
    let opts = StageOpts::default().with_viewport(400, 300).with_id_seed(5);
    let s = StageSession::new(
        opts,
        Arc::new(ManifestDecoder::new(".")),
        Box::new(surface.clone()),
    )
    .unwrap()
    .with_font_service(Box::new(InstantFonts));
    (s, surface)
}

fn two_layer_doc() -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "width": 200, "height": 100,
        "layers": [
            { "name": "Title", "left": 20, "top": 10, "width": 160, "height": 30,
              "text": { "content": "Hi", "fonts": ["Arial-BoldMT"], "justification": 2,
                        "style": { "FontSize": 20 } } },
            { "name": "Background", "width": 200, "height": 100, "fill": [10, 20, 30, 255] }
        ]
    }))
    .unwrap()
}

#[test]
fn a_document_streams_into_the_stage_back_to_front() {
    let (mut s, surface) = session();
    s.open_document(two_layer_doc()).unwrap();
    assert!(s.is_busy());
    assert_eq!(s.wait_idle(WAIT).unwrap(), &StageStatus::Ready);

    let kinds: Vec<FrameKind> = s.scene().frames().iter().map(|f| f.kind).collect();
    assert_eq!(kinds, vec![FrameKind::Image, FrameKind::Text]);
    let names: Vec<&str> = s.scene().frames().iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["Background", "Title"]);
    assert_eq!(s.panel().len(), 2);
    assert_eq!(s.compositor().len(), 2);

    assert_eq!(s.camera().pan(), Vec2::new(0.1, 0.1));
    assert!(s.fonts().is_loaded("Arial"));
    let log = surface.log();
    assert_eq!(log.fonts, vec!["Arial".to_owned()]);
    assert_eq!(log.viewport, (400, 300));
    // One render per layer, one at the end, one after the font settled.
    assert_eq!(log.redraws, 4);
}

#[test]
fn opening_while_parsing_is_refused() {
    let (mut s, _) = session();
    s.open_document(two_layer_doc()).unwrap();
    assert!(matches!(
        s.open_document(two_layer_doc()),
        Err(StageError::Busy(_))
    ));
    s.wait_idle(WAIT).unwrap();
    s.open_document(two_layer_doc()).unwrap();
    s.wait_idle(WAIT).unwrap();
    assert_eq!(s.compositor().len(), 2);
    assert_eq!(s.scene().frames().len(), 2);
}

#[test]
fn decode_failure_leaves_an_empty_stage_and_accepts_the_next_file() {
    let (mut s, _) = session();
    s.open_document(b"{".to_vec()).unwrap();
    let status = s.wait_idle(WAIT).unwrap().clone();
    assert!(matches!(status, StageStatus::Failed(_)));
    assert!(s.compositor().is_empty());
    assert!(s.scene().is_empty());

    s.open_document(two_layer_doc()).unwrap();
    assert_eq!(s.wait_idle(WAIT).unwrap(), &StageStatus::Ready);
}

#[test]
fn clear_forgets_everything() {
    let (mut s, surface) = session();
    s.open_document(two_layer_doc()).unwrap();
    s.wait_idle(WAIT).unwrap();
    let before = surface.log().releases;
    s.clear();
    assert!(s.scene().is_empty());
    assert!(s.panel().is_empty());
    assert!(s.compositor().is_empty());
    assert_eq!(s.status(), &StageStatus::Empty);
    assert_eq!(surface.log().releases, before + 1);
}

#[test]
fn clear_on_an_empty_stage_is_a_no_op() {
    let (mut s, _) = session();
    s.clear();
    s.clear();
    assert_eq!(s.compositor().len(), 0);
    assert_eq!(s.panel().len(), 0);
    assert!(s.scene().is_empty());
    assert!(s.scene().frames().is_empty());
    assert_eq!(s.status(), &StageStatus::Empty);

    s.open_document(two_layer_doc()).unwrap();
    assert_eq!(s.wait_idle(WAIT).unwrap(), &StageStatus::Ready);
    assert_eq!(s.compositor().len(), 2);
}

#[test]
fn wheel_and_resize_drive_the_camera() {
    let (mut s, surface) = session();
    s.wheel(-3.0).unwrap();
    assert!((s.camera().zoom() - 0.55).abs() < 1e-9);
    s.wheel(5.0).unwrap();
    assert!((s.camera().zoom() - 0.5).abs() < 1e-9);
    s.wheel(0.0).unwrap();
    assert_eq!(surface.log().redraws, 2);

    s.continue_pan(Point::new(10.0, 10.0)).unwrap();
    assert_eq!(surface.log().redraws, 2);
    s.start_pan(Point::new(0.0, 0.0));
    s.continue_pan(Point::new(10.0, 5.0)).unwrap();
    s.end_pan();
    assert_eq!(s.camera().pan(), Vec2::new(20.0, 10.0));

    s.resize(640, 480).unwrap();
    assert_eq!(s.camera().viewport(), (640, 480));
    assert_eq!(surface.log().viewport, (640, 480));
}

#[test]
fn panel_changes_reach_the_scene() {
    let (mut s, _) = session();
    s.open_document(two_layer_doc()).unwrap();
    s.wait_idle(WAIT).unwrap();
    let key = s.panel().keys().find(|k| k.starts_with("Title-")).unwrap().to_owned();

    s.edit_field(&key, "text", &serde_json::json!("Hello")).unwrap();
    assert_eq!(
        s.panel().section(&key).unwrap().field("text"),
        Some(&FieldValue::Text("Hello".into()))
    );

    let records: Vec<EditRecord> = serde_json::from_value(serde_json::json!([
        { "section": key, "field": "font_size", "value": 12 },
        { "section": "nope", "field": "x", "value": 1 }
    ]))
    .unwrap();
    assert!(s.replay(&records).is_err());
    assert_eq!(
        s.panel().section(&key).unwrap().field("font_size"),
        Some(&FieldValue::Number(12.0))
    );
}

use super::*;
use crate::decode::{
    DecodedDocument, LayerProperties, LayerRaster, ManifestDecoder, StyleSheet, TextLayerMeta,
    TextTransform,
};
use crate::foundation::core::LayerBounds;
use crate::protocol::MessageKind;

struct Solid(Vec<u8>);

impl LayerRaster for Solid {
    fn composite(&self, _clip: bool, _visible: bool) -> StageResult<Vec<u8>> {
        Ok(self.0.clone())
    }
}

struct Broken;

impl LayerRaster for Broken {
    fn composite(&self, _clip: bool, _visible: bool) -> StageResult<Vec<u8>> {
        Err(StageError::compositing("corrupt channel data"))
    }
}

fn layer(name: &str, raster: Box<dyn LayerRaster>) -> DecodedLayer {
    DecodedLayer {
        name: name.to_owned(),
        bounds: LayerBounds {
            left: 0,
            top: 0,
            width: 1,
            height: 1,
        },
        properties: LayerProperties::default(),
        raster,
    }
}

struct FixedDecoder {
    names: Vec<&'static str>,
    broken: Option<&'static str>,
}

impl DocumentDecoder for FixedDecoder {
    fn parse(&self, bytes: &[u8]) -> StageResult<DecodedDocument> {
        if bytes == b"garbage" {
            return Err(StageError::decode("not a layered document"));
        }
        let layers = self
            .names
            .iter()
            .map(|&n| {
                let raster: Box<dyn LayerRaster> = if Some(n) == self.broken {
                    Box::new(Broken)
                } else {
                    Box::new(Solid(vec![1, 2, 3, 255]))
                };
                layer(n, raster)
            })
            .collect();
        Ok(DecodedDocument {
            size: DocSize::new(4, 4).unwrap(),
            layers,
        })
    }
}

fn collect(
    decoder: &dyn DocumentDecoder,
    bytes: &[u8],
) -> (StageResult<ParseSummary>, Vec<Message>) {
    let mut out = Vec::new();
    let res = run_parse(decoder, bytes, &mut |m| {
        out.push(m);
        true
    });
    (res, out)
}

fn layer_names(msgs: &[Message]) -> Vec<String> {
    msgs.iter()
        .filter_map(|m| match &m.value {
            Payload::Layer(l) => Some(l.layer_name.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn layers_are_emitted_in_paint_order_then_end_parsing() {
    let dec = FixedDecoder {
        names: vec!["top", "middle", "bottom"],
        broken: None,
    };
    let (res, msgs) = collect(&dec, b"doc");
    let summary = res.unwrap();
    assert_eq!(summary.emitted, 3);
    assert_eq!(layer_names(&msgs), vec!["bottom", "middle", "top"]);
    assert_eq!(msgs.len(), 4);
    assert_eq!(msgs[3].kind, MessageKind::EndParsing);
    for m in &msgs {
        validate(m).unwrap();
    }
}

#[test]
fn decode_failure_emits_nothing() {
    let dec = FixedDecoder {
        names: vec!["a"],
        broken: None,
    };
    let (res, msgs) = collect(&dec, b"garbage");
    assert!(matches!(res, Err(StageError::Decode(_))));
    assert!(msgs.is_empty());
}

#[test]
fn one_broken_layer_does_not_abort_the_document() {
    let dec = FixedDecoder {
        names: vec!["a", "b", "c"],
        broken: Some("b"),
    };
    let (res, msgs) = collect(&dec, b"doc");
    let summary = res.unwrap();
    assert_eq!(summary.skipped, vec!["b".to_owned()]);
    assert_eq!(layer_names(&msgs), vec!["c", "a"]);
    assert_eq!(msgs.last().unwrap().kind, MessageKind::EndParsing);
}

#[test]
fn hung_up_receiver_stops_the_run() {
    let dec = FixedDecoder {
        names: vec!["a", "b", "c"],
        broken: None,
    };
    let mut sent = 0;
    let summary = run_parse(&dec, b"doc", &mut |_m| {
        sent += 1;
        sent < 2
    })
    .unwrap();
    assert!(summary.cancelled);
    assert_eq!(summary.emitted, 1);
}

#[test]
fn text_metadata_is_normalized_into_the_payload() {
    let mut l = layer("title", Box::new(Solid(vec![0; 4])));
    l.properties.text = Some("Hello".to_owned());
    l.properties.text_meta = TextMetadata::TextLayer(TextLayerMeta {
        style_sheet: Some(StyleSheet {
            font_size: Some(10.0),
            font_caps: Some(1),
            ..Default::default()
        }),
        font_set: vec![crate::decode::FontResource {
            name: "Arial-BoldMT".to_owned(),
        }],
        paragraph_justification: Some(2),
        transform: TextTransform { xx: 1.0, yy: 3.0 },
    });
    let p = layer_payload(&l, vec![0; 4], DocSize::new(8, 9).unwrap());
    assert_eq!(p.text.as_deref(), Some("Hello"));
    assert_eq!(p.font_family.as_deref(), Some("Arial-BoldMT"));
    assert_eq!(p.is_center, Some(true));
    assert_eq!(p.font_transform, Some(2.0));
    assert_eq!(p.font_caps, Some(1));
    assert_eq!(p.font_style.unwrap().font_size, Some(10.0));
    assert_eq!((p.psd_width, p.psd_height), (8, 9));
}

#[test]
fn empty_text_is_treated_as_a_pixel_layer() {
    let mut l = layer("blank", Box::new(Solid(vec![0; 4])));
    l.properties.text = Some(String::new());
    let p = layer_payload(&l, vec![0; 4], DocSize::new(1, 1).unwrap());
    assert_eq!(p.text, None);
    assert_eq!(p.is_center, None);
}

#[test]
fn spawned_worker_streams_layers_over_the_channel() {
    let worker = ParsingWorker::spawn(Arc::new(ManifestDecoder::new("."))).unwrap();
    let doc = serde_json::json!({
        "width": 2, "height": 2,
        "layers": [ { "name": "only", "width": 1, "height": 1, "fill": [5, 6, 7, 255] } ]
    });
    worker
        .post(Message::parse_data(serde_json::to_vec(&doc).unwrap()))
        .unwrap();

    let mut kinds = Vec::new();
    while kinds.last() != Some(&MessageKind::EndParsing) {
        match worker.next_timeout(Duration::from_secs(10)).unwrap() {
            WorkerEvent::Message(m) => {
                validate(&m).unwrap();
                if let Payload::Layer(l) = &m.value {
                    assert_eq!(l.pixel_data, vec![5, 6, 7, 255]);
                }
                kinds.push(m.kind);
            }
            WorkerEvent::Failed(err) => panic!("unexpected failure: {err}"),
        }
    }
    assert_eq!(kinds, vec![MessageKind::Layer, MessageKind::EndParsing]);
}

#[test]
fn spawned_worker_reports_decode_failures() {
    let worker = ParsingWorker::spawn(Arc::new(ManifestDecoder::new("."))).unwrap();
    worker.post(Message::parse_data(b"{".to_vec())).unwrap();
    match worker.next_timeout(Duration::from_secs(10)).unwrap() {
        WorkerEvent::Failed(StageError::Decode(_)) => {}
        other => panic!("expected decode failure, got {other:?}"),
    }
}

#[test]
fn spawned_worker_ignores_unsigned_messages() {
    let worker = ParsingWorker::spawn(Arc::new(ManifestDecoder::new("."))).unwrap();
    let mut forged = Message::parse_data(b"{".to_vec());
    forged.signature = "forged".to_owned();
    worker.post(forged).unwrap();
    assert!(worker.next_timeout(Duration::from_millis(200)).is_err());
}

use std::io::Cursor;

use super::*;

fn decode(json: serde_json::Value) -> StageResult<DecodedDocument> {
    ManifestDecoder::new(".").parse(&serde_json::to_vec(&json).unwrap())
}

#[test]
fn parses_fill_and_text_layers_in_storage_order() {
    let doc = decode(serde_json::json!({
        "width": 100, "height": 50,
        "layers": [
            { "name": "title", "left": 10, "top": 5, "width": 4, "height": 2,
              "text": { "content": "Hi", "fonts": ["Arial-BoldMT"], "justification": 2,
                        "style": { "FontSize": 12.0, "FauxBold": true },
                        "transform": { "xx": 2.0, "yy": 2.0 } } },
            { "name": "bg", "width": 2, "height": 2, "fill": [255, 0, 0, 255], "opacity": 128 }
        ]
    }))
    .unwrap();

    assert_eq!(doc.size, DocSize::new(100, 50).unwrap());
    assert_eq!(doc.layers.len(), 2);
    assert_eq!(doc.layers[0].name, "title");
    assert_eq!(doc.layers[1].properties.opacity, 128);

    let TextMetadata::TextLayer(meta) = &doc.layers[0].properties.text_meta else {
        panic!("expected text metadata");
    };
    assert!(meta.is_centered());
    assert_eq!(meta.first_font(), Some("Arial-BoldMT"));
    assert_eq!(meta.transform.average_scale(), 2.0);
    let sheet = meta.style_sheet.as_ref().unwrap();
    assert_eq!(sheet.font_size, Some(12.0));
    assert!(sheet.faux_bold);

    let px = doc.layers[1].raster.composite(true, true).unwrap();
    assert_eq!(px, [255, 0, 0, 255].repeat(4));
}

#[test]
fn malformed_manifest_is_a_decode_error() {
    let err = ManifestDecoder::new(".").parse(b"not json").unwrap_err();
    assert!(matches!(err, StageError::Decode(_)));

    let err = decode(serde_json::json!({ "width": 0, "height": 5 })).unwrap_err();
    assert!(matches!(err, StageError::Decode(_)));

    let err = decode(serde_json::json!({
        "width": 5, "height": 5, "layers": [ { "name": "x" } ]
    }))
    .unwrap_err();
    assert!(matches!(err, StageError::Decode(_)));
}

#[test]
fn hidden_layer_composites_transparent_only_when_visibility_honoured() {
    let doc = decode(serde_json::json!({
        "width": 10, "height": 10,
        "layers": [
            { "name": "h", "width": 1, "height": 1, "fill": [9, 9, 9, 255], "hidden": true }
        ]
    }))
    .unwrap();
    let raster = &doc.layers[0].raster;
    assert_eq!(raster.composite(true, true).unwrap(), vec![0, 0, 0, 0]);
    assert_eq!(raster.composite(true, false).unwrap(), vec![9, 9, 9, 255]);
}

#[test]
fn clip_mask_zeroes_pixels_outside_mask() {
    let doc = decode(serde_json::json!({
        "width": 10, "height": 10,
        "layers": [ {
            "name": "m", "left": 0, "top": 0, "width": 2, "height": 1,
            "fill": [1, 2, 3, 255],
            "mask": { "left": 1, "top": 0, "width": 1, "height": 1 }
        } ]
    }))
    .unwrap();
    let raster = &doc.layers[0].raster;
    assert_eq!(
        raster.composite(true, true).unwrap(),
        vec![0, 0, 0, 0, 1, 2, 3, 255]
    );
    assert_eq!(
        raster.composite(false, true).unwrap(),
        vec![1, 2, 3, 255, 1, 2, 3, 255]
    );
}

#[test]
fn image_layers_take_bounds_from_the_file() {
    let dir = std::env::temp_dir().join(format!("layerstage-manifest-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();

    let img = image::RgbaImage::from_raw(2, 1, vec![10, 20, 30, 255, 40, 50, 60, 128]).unwrap();
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    std::fs::write(dir.join("layer.png"), &buf).unwrap();

    let manifest = serde_json::json!({
        "width": 10, "height": 10,
        "layers": [ { "name": "img", "left": 3, "top": 4, "image": "./layer.png" } ]
    });
    let doc = ManifestDecoder::new(&dir)
        .parse(&serde_json::to_vec(&manifest).unwrap())
        .unwrap();
    assert_eq!(
        doc.layers[0].bounds,
        LayerBounds {
            left: 3,
            top: 4,
            width: 2,
            height: 1
        }
    );
    assert_eq!(
        doc.layers[0].raster.composite(true, true).unwrap(),
        vec![10, 20, 30, 255, 40, 50, 60, 128]
    );

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn rel_paths_are_normalized_and_traversal_rejected() {
    assert_eq!(normalize_rel_path("./a//b.png").unwrap(), "a/b.png");
    assert_eq!(normalize_rel_path("a\\b.png").unwrap(), "a/b.png");
    assert!(normalize_rel_path("/abs.png").is_err());
    assert!(normalize_rel_path("../up.png").is_err());
    assert!(normalize_rel_path("./").is_err());
}

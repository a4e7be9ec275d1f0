use super::*;

#[test]
fn new_instance_starts_centered_and_unscaled() {
    let inst = Instance::new("I_aaaaa".into(), "F_bbbbb".into(), "Logo", 40, 20, 51, true);
    assert_eq!((inst.x, inst.y), (50.0, 50.0));
    assert_eq!((inst.scale_x, inst.scale_y), (1.0, 1.0));
    assert_eq!((inst.width, inst.height), (40.0, 20.0));
    assert!((inst.opacity - 0.2).abs() < 1e-9);
    assert!(!inst.is_text());
}

#[test]
fn text_state_is_attached_on_request() {
    let inst = Instance::new("I_a".into(), "F_a".into(), "Title", 1, 1, 255, false).with_text(
        TextInstance {
            text: "HI".into(),
            font_family: "Arial".into(),
            font_size: 50,
            bold: true,
            italic: false,
            color: Rgb8::new(1, 2, 3),
        },
    );
    assert!(inst.is_text());
    assert!(!inst.visible);
    assert_eq!(inst.opacity, 1.0);
    let json = serde_json::to_value(&inst).unwrap();
    assert_eq!(json["text"]["color"], "#010203");
}

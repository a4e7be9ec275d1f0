use super::*;

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn zoom_multiplies_and_divides_by_the_factor() {
    let mut cam = Camera::new((800, 600), 0.5, 1.1);
    cam.zoom_in();
    assert!(approx(cam.zoom(), 0.55));
    cam.zoom_out();
    cam.zoom_out();
    assert!(approx(cam.zoom(), 0.5 / 1.1));
}

#[test]
fn pan_delta_is_divided_by_zoom() {
    let mut cam = Camera::new((800, 600), 0.5, 1.1);
    assert!(!cam.continue_pan(Point::new(5.0, 5.0)));

    cam.start_pan(Point::new(10.0, 10.0));
    assert!(cam.continue_pan(Point::new(20.0, 15.0)));
    assert_eq!(cam.pan(), Vec2::new(20.0, 10.0));
    assert!(cam.continue_pan(Point::new(21.0, 15.0)));
    assert_eq!(cam.pan(), Vec2::new(22.0, 10.0));

    cam.end_pan();
    assert!(!cam.is_panning());
    assert!(!cam.continue_pan(Point::new(100.0, 100.0)));
    assert_eq!(cam.pan(), Vec2::new(22.0, 10.0));
}

#[test]
fn view_scales_after_translating() {
    let mut cam = Camera::new((100, 100), 2.0, 1.1);
    cam.nudge(3.0, -1.0);
    let p = cam.view() * Point::new(1.0, 1.0);
    assert_eq!(p, Point::new(8.0, 0.0));
}

#[test]
fn resize_only_touches_the_viewport() {
    let mut cam = Camera::new((100, 100), 0.5, 1.1);
    cam.nudge(0.1, 0.1);
    cam.resize(640, 480);
    assert_eq!(cam.viewport(), (640, 480));
    assert_eq!(cam.zoom(), 0.5);
    assert_eq!(cam.pan(), Vec2::new(0.1, 0.1));
}

use super::*;

#[test]
fn fnv_is_deterministic_and_seed_sensitive() {
    let mut a = Fnv1a64::new(Fnv1a64::OFFSET_BASIS);
    a.write_bytes(b"layer");
    let mut b = Fnv1a64::new(Fnv1a64::OFFSET_BASIS);
    b.write_bytes(b"layer");
    assert_eq!(a.finish(), b.finish());

    assert_ne!(mix3(1, 0, 0), mix3(2, 0, 0));
    assert_ne!(mix3(1, 0, 0), mix3(1, 1, 0));
}

#[test]
fn premultiply_scales_color_by_alpha() {
    let mut px = vec![200u8, 100, 50, 128, 10, 20, 30, 0, 1, 2, 3, 255];
    premultiply_rgba8_in_place(&mut px);
    assert_eq!(
        px,
        vec![
            mul_div255_u8(200, 128),
            mul_div255_u8(100, 128),
            mul_div255_u8(50, 128),
            128,
            0,
            0,
            0,
            0,
            1,
            2,
            3,
            255
        ]
    );
}

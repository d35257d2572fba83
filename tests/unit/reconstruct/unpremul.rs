use super::*;

#[test]
fn table_agrees_with_scalar_formula() {
    let t = UnpremulTable::new();
    for a in 0..=255u8 {
        for c in 0..=255u8 {
            assert_eq!(t.channel(c, a), unpremul_channel(c, a));
        }
    }
}

#[test]
fn opaque_pixels_pass_through() {
    let t = UnpremulTable::new();
    assert_eq!(t.pixel([12, 34, 56], 255), [12, 34, 56, 255]);
    assert_eq!(unpremultiply([12, 34, 56, 255], [255, 255, 255, 255]), [12, 34, 56, 255]);
}

#[test]
fn transparent_pixels_are_black() {
    let t = UnpremulTable::new();
    assert_eq!(t.pixel([200, 100, 50], 0), [0, 0, 0, 0]);
    assert_eq!(unpremultiply([200, 100, 50, 255], [0, 9, 9, 255]), [0, 0, 0, 0]);
}

#[test]
fn half_alpha_doubles_color() {
    let t = UnpremulTable::new();
    assert_eq!(t.pixel([64, 64, 64], 128), [128, 128, 128, 128]);
}

#[test]
fn overbright_premultiplied_values_clamp() {
    let t = UnpremulTable::new();
    assert_eq!(t.pixel([250, 10, 0], 100), [255, 26, 0, 100]);
}

#[test]
fn only_mask_channel_zero_is_used() {
    assert_eq!(
        unpremultiply([64, 64, 64, 0], [128, 0, 0, 0]),
        [128, 128, 128, 128]
    );
}

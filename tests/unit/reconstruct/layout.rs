use super::*;

#[test]
fn right_alpha_puts_color_first() {
    let l = compute_layout(8, AlphaSide::Right);
    assert_eq!(
        l,
        ChannelLayout {
            half_width: 4,
            color_offset_x: 0,
            alpha_offset_x: 4,
        }
    );
}

#[test]
fn left_alpha_mirrors_offsets() {
    let l = compute_layout(8, AlphaSide::Left);
    assert_eq!(l.color_offset_x, 4);
    assert_eq!(l.alpha_offset_x, 0);
}

#[test]
fn offsets_always_differ_for_usable_widths() {
    for width in 2..64 {
        for side in [AlphaSide::Left, AlphaSide::Right] {
            let l = compute_layout(width, side);
            assert_ne!(l.color_offset_x, l.alpha_offset_x, "width={width}");
        }
    }
}

#[test]
fn odd_width_drops_last_column() {
    let l = compute_layout(7, AlphaSide::Right);
    assert_eq!(l.half_width, 3);
    assert_eq!(l.alpha_offset_x, 3);
}

#[test]
fn source_offsets_follow_row_major_rgba() {
    let l = compute_layout(4, AlphaSide::Right);
    assert_eq!(l.source_offsets(4, 0, 0), (0, 8));
    assert_eq!(l.source_offsets(4, 1, 1), ((4 + 1) * 4, (4 + 2 + 1) * 4));
}

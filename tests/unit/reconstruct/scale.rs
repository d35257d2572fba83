use super::*;

#[test]
fn same_size_is_identity() {
    let m = ScaleMap::new(5, 3, 5, 3);
    assert!(m.is_identity());
    assert_eq!(m.target_offset(4, 2), Some((2 * 5 + 4) * 4));
}

#[test]
fn upscale_spreads_targets() {
    let m = ScaleMap::new(2, 1, 4, 1);
    assert_eq!(m.target_x(0), Some(0));
    assert_eq!(m.target_x(1), Some(2));
    assert!(!m.is_identity());
}

#[test]
fn downscale_rounds_half_up_and_drops_overflow() {
    // 3 -> 2: 0 -> 0, 1 -> round(0.667) = 1, 2 -> round(1.333) = 1
    let m = ScaleMap::new(3, 1, 2, 1);
    assert_eq!(m.target_x(0), Some(0));
    assert_eq!(m.target_x(1), Some(1));
    assert_eq!(m.target_x(2), Some(1));

    // 4 -> 3: 3 -> round(2.25) = 2; 2 -> round(1.5) = 2
    let m = ScaleMap::new(4, 1, 3, 1);
    assert_eq!(m.target_x(2), Some(2));
    assert_eq!(m.target_x(3), Some(2));

    // 2 -> 3: 1 -> round(1.5) = 2, in range
    let m = ScaleMap::new(2, 1, 3, 1);
    assert_eq!(m.target_x(1), Some(2));

    // 4 -> 7: 3 -> round(5.25) = 5
    let m = ScaleMap::new(4, 1, 7, 1);
    assert_eq!(m.target_x(3), Some(5));
}

#[test]
fn targets_past_the_edge_are_none() {
    // 2 -> 1: 1 -> round(0.5) = 1, which is out of range.
    let m = ScaleMap::new(2, 2, 1, 1);
    assert_eq!(m.target_x(0), Some(0));
    assert_eq!(m.target_x(1), None);
    assert_eq!(m.target_offset(1, 0), None);
    assert_eq!(m.target_offset(0, 1), None);
}

#[test]
fn out_of_map_source_coordinates_are_none() {
    let m = ScaleMap::new(2, 2, 2, 2);
    assert_eq!(m.target_x(2), None);
    assert_eq!(m.target_y(9), None);
}

#[test]
fn taller_output_is_not_identity() {
    let m = ScaleMap::new(1, 1, 1, 5);
    assert!(!m.is_identity());
}

#[test]
fn source_ranges_invert_the_forward_map() {
    // 4 -> 3: 0 -> 0, 1 -> 1, 2 -> 2, 3 -> 2
    let m = ScaleMap::new(4, 1, 3, 1);
    assert_eq!(m.source_cols(0), Some(0..=0));
    assert_eq!(m.source_cols(2), Some(2..=3));
    assert_eq!(m.source_cols(3), None);

    // 2 -> 4: output columns 1 and 3 have no source.
    let m = ScaleMap::new(2, 2, 4, 4);
    assert_eq!(m.source_cols(1), None);
    assert_eq!(m.source_cols(2), Some(1..=1));
    assert_eq!(m.source_rows(3), None);
}

#[test]
fn off_grid_sources_are_not_in_any_preimage() {
    // 2 -> 1: source 1 rounds past the edge.
    let m = ScaleMap::new(2, 1, 1, 1);
    assert_eq!(m.source_cols(0), Some(0..=0));
}

use super::*;

fn coverage(width: u32, height: u32, blocks: &[Block]) -> Vec<u32> {
    let mut hits = vec![0u32; (width as usize) * (height as usize)];
    for b in blocks {
        for (x, y) in b.coords() {
            hits[(y as usize) * (width as usize) + x as usize] += 1;
        }
    }
    hits
}

#[test]
fn exact_multiple_produces_full_blocks() {
    let blocks = partition(256, 128, 128);
    assert_eq!(blocks.len(), 2);
    assert!(blocks.iter().all(|b| b.width == 128 && b.height == 128));
}

#[test]
fn edges_are_clipped() {
    let blocks = partition(130, 5, 128);
    assert_eq!(
        blocks,
        vec![
            Block {
                x: 0,
                y: 0,
                width: 128,
                height: 5,
            },
            Block {
                x: 128,
                y: 0,
                width: 2,
                height: 5,
            },
        ]
    );
}

#[test]
fn partition_covers_every_pixel_exactly_once() {
    for (w, h, size) in [(1, 1, 128), (7, 3, 2), (300, 129, 128), (33, 65, 16), (5, 9, 1)] {
        let blocks = partition(w, h, size);
        let hits = coverage(w, h, &blocks);
        assert!(hits.iter().all(|&n| n == 1), "w={w} h={h} size={size}");
        assert!(
            blocks
                .iter()
                .all(|b| b.width <= size && b.height <= size && b.width > 0 && b.height > 0)
        );
    }
}

#[test]
fn blocks_are_in_raster_order() {
    let blocks = partition(10, 10, 4);
    let origins: Vec<_> = blocks.iter().map(|b| (b.y, b.x)).collect();
    let mut sorted = origins.clone();
    sorted.sort();
    assert_eq!(origins, sorted);
}

#[test]
fn empty_area_has_no_blocks() {
    assert!(partition(0, 10, 8).is_empty());
    assert!(partition(10, 0, 8).is_empty());
}

#[test]
fn zero_block_size_is_treated_as_one() {
    assert_eq!(partition(2, 2, 0).len(), 4);
}

#[test]
fn contains_matches_coords() {
    let b = Block {
        x: 2,
        y: 3,
        width: 2,
        height: 1,
    };
    assert!(b.contains(3, 3));
    assert!(!b.contains(4, 3));
    assert!(!b.contains(1, 3));
    assert_eq!(b.coords().collect::<Vec<_>>(), vec![(2, 3), (3, 3)]);
    assert_eq!(b.byte_len(), 8);
}

#[test]
fn stage_offsets_follow_block_major_layout() {
    for (w, h, size) in [(10u32, 7u32, 4u32), (5, 5, 8), (9, 2, 1), (130, 3, 64)] {
        let grid = BlockGrid::new(w, h, size);
        let mut expected = 0usize;
        for block in grid.blocks() {
            for (x, y) in block.coords() {
                assert_eq!(grid.stage_offset(x, y), expected, "({x}, {y}) in {w}x{h}/{size}");
                expected += 4;
            }
        }
        assert_eq!(expected, grid.stage_len());
    }
}

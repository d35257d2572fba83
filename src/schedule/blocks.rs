/// Default edge length of a square reconstruction block.
pub const DEFAULT_BLOCK_SIZE: u32 = 128;

/// A rectangular unit of reconstruction work in half-frame coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Block {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels (clipped at the half-frame's right edge).
    pub width: u32,
    /// Height in pixels (clipped at the half-frame's bottom edge).
    pub height: u32,
}

impl Block {
    /// Number of pixels covered.
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Bytes needed to stage this block as RGBA8.
    pub fn byte_len(&self) -> usize {
        self.pixel_count() * 4
    }

    /// `true` when `(x, y)` lies inside the block.
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x - self.x < self.width && y >= self.y && y - self.y < self.height
    }

    /// Half-frame coordinates covered by the block, row-major.
    pub fn coords(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        (self.y..self.y + self.height)
            .flat_map(move |y| (self.x..self.x + self.width).map(move |x| (x, y)))
    }
}

/// Partition `[0, width) × [0, height)` into blocks of at most `block_size × block_size`.
///
/// Blocks are returned in raster order (left to right, then top to bottom). They are
/// pairwise disjoint and cover every pixel exactly once. A `block_size` of 0 is treated as 1.
pub fn partition(width: u32, height: u32, block_size: u32) -> Vec<Block> {
    let size = block_size.max(1);
    let cols = width.div_ceil(size) as usize;
    let rows = height.div_ceil(size) as usize;
    let mut out = Vec::with_capacity(cols * rows);

    let mut y = 0u32;
    while y < height {
        let h = size.min(height - y);
        let mut x = 0u32;
        while x < width {
            let w = size.min(width - x);
            out.push(Block {
                x,
                y,
                width: w,
                height: h,
            });
            x += w;
        }
        y += h;
    }
    out
}

/// Block geometry of a half-frame.
///
/// Addresses staging memory that holds every block back to back in [`partition`] order, each
/// block row-major.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct BlockGrid {
    width: u32,
    height: u32,
    size: u32,
}

impl BlockGrid {
    pub(crate) fn new(width: u32, height: u32, block_size: u32) -> Self {
        Self {
            width,
            height,
            size: block_size.max(1),
        }
    }

    pub(crate) fn blocks(&self) -> Vec<Block> {
        partition(self.width, self.height, self.size)
    }

    /// Total staging bytes for the half-frame.
    pub(crate) fn stage_len(&self) -> usize {
        (self.width as usize) * (self.height as usize) * 4
    }

    /// Byte offset of half-frame pixel `(x, y)` in block-major staging memory.
    pub(crate) fn stage_offset(&self, x: u32, y: u32) -> usize {
        let (x, y) = (x as usize, y as usize);
        let (w, h, size) = (
            self.width as usize,
            self.height as usize,
            self.size as usize,
        );
        let by = y - y % size;
        let bx = x - x % size;
        let bh = size.min(h - by);
        let bw = size.min(w - bx);
        // Full block rows above, then the blocks to the left in this block row.
        let pixels = by * w + bx * bh + (y - by) * bw + (x - bx);
        pixels * 4
    }
}

#[cfg(test)]
#[path = "../../tests/unit/schedule/blocks.rs"]
mod tests;

use crate::reconstruct::layout::ChannelLayout;
use crate::reconstruct::scale::ScaleMap;
use crate::reconstruct::unpremul::UnpremulTable;
use crate::schedule::blocks::{Block, BlockGrid};

/// Read-only per-frame state shared by every block task.
pub(crate) struct FrameContext<'a> {
    pub(crate) frame: &'a [u8],
    pub(crate) width: u32,
    pub(crate) layout: ChannelLayout,
    pub(crate) scale: &'a ScaleMap,
    pub(crate) table: &'a UnpremulTable,
}

/// Per-block pixel counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct BlockReport {
    pub(crate) written: u64,
    pub(crate) skipped_source: u64,
    pub(crate) skipped_target: u64,
}

impl FrameContext<'_> {
    /// Color and alpha byte offsets for `(x, y)`, or `None` when either pixel runs past the
    /// end of the frame buffer.
    #[inline]
    fn source(&self, x: u32, y: u32) -> Option<(usize, usize)> {
        let (ci, ai) = self.layout.source_offsets(self.width, x, y);
        let len = self.frame.len();
        (ci + 3 < len && ai + 3 < len).then_some((ci, ai))
    }

    /// Straight-alpha pixel for half-frame `(x, y)`, or `None` when the source is out of range.
    #[inline]
    pub(crate) fn reconstruct_pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let (ci, ai) = self.source(x, y)?;
        let rgb = [self.frame[ci], self.frame[ci + 1], self.frame[ci + 2]];
        Some(self.table.pixel(rgb, self.frame[ai]))
    }

    #[inline]
    fn readable(&self, x: u32, y: u32) -> bool {
        self.source(x, y).is_some()
    }
}

/// Reconstruct every pixel of `block` into `stage` (block-local, row-major RGBA8).
///
/// `stage` must be zeroed and `block.byte_len()` long. Skipped pixels stay zero.
pub(crate) fn reconstruct_block(
    ctx: &FrameContext<'_>,
    block: &Block,
    stage: &mut [u8],
) -> BlockReport {
    let mut report = BlockReport::default();
    for (i, (x, y)) in block.coords().enumerate() {
        let Some(px) = ctx.reconstruct_pixel(x, y) else {
            report.skipped_source += 1;
            continue;
        };
        if ctx.scale.target_offset(x, y).is_none() {
            report.skipped_target += 1;
            continue;
        }
        let Some(dst) = stage.get_mut(i * 4..i * 4 + 4) else {
            report.skipped_target += 1;
            continue;
        };
        dst.copy_from_slice(&px);
        report.written += 1;
    }
    report
}

/// Fill output row `ty` from block-major staging memory.
///
/// Each output pixel takes the last readable source pixel, in raster order, among those that
/// map onto it. Rows are independent, so they can be filled in any order or in parallel.
pub(crate) fn merge_row(
    ctx: &FrameContext<'_>,
    grid: &BlockGrid,
    stage: &[u8],
    ty: u32,
    row: &mut [u8],
) {
    let Some(rows) = ctx.scale.source_rows(ty) else {
        return;
    };
    for (tx, dst) in row.chunks_exact_mut(4).enumerate() {
        let Some(cols) = ctx.scale.source_cols(tx as u32) else {
            continue;
        };
        let owner = rows.clone().rev().find_map(|y| {
            cols.clone()
                .rev()
                .find(|&x| ctx.readable(x, y))
                .map(|x| (x, y))
        });
        let Some((x, y)) = owner else {
            continue;
        };
        let at = grid.stage_offset(x, y);
        if let Some(src) = stage.get(at..at + 4) {
            dst.copy_from_slice(src);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/reconstruct/pixel.rs"]
mod tests;

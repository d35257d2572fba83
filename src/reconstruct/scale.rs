use std::ops::RangeInclusive;

use crate::foundation::math::div_round_half_up;

/// Nearest-pixel mapping from half-frame coordinates to output coordinates.
///
/// Each axis is mapped independently with `target = round(src * dst_len / src_len)`.
/// Targets that round past the last output pixel map to `None`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScaleMap {
    x: Vec<Option<u32>>,
    y: Vec<Option<u32>>,
    // Inverse per axis: first and last source coordinate landing on each output coordinate.
    inv_x: Vec<Option<(u32, u32)>>,
    inv_y: Vec<Option<(u32, u32)>>,
    out_width: u32,
    out_height: u32,
}

impl ScaleMap {
    /// Build maps for a `src_width × src_height` half-frame onto a `dst_width × dst_height`
    /// output.
    pub fn new(src_width: u32, src_height: u32, dst_width: u32, dst_height: u32) -> Self {
        let x = axis_map(src_width, dst_width);
        let y = axis_map(src_height, dst_height);
        Self {
            inv_x: invert(&x, dst_width),
            inv_y: invert(&y, dst_height),
            x,
            y,
            out_width: dst_width,
            out_height: dst_height,
        }
    }

    /// Source columns that land on output column `tx`, or `None` when nothing does.
    ///
    /// The mapping is monotonic, so every preimage is a contiguous range.
    #[inline]
    pub fn source_cols(&self, tx: u32) -> Option<RangeInclusive<u32>> {
        let (first, last) = self.inv_x.get(tx as usize).copied().flatten()?;
        Some(first..=last)
    }

    /// Source rows that land on output row `ty`, or `None` when nothing does.
    #[inline]
    pub fn source_rows(&self, ty: u32) -> Option<RangeInclusive<u32>> {
        let (first, last) = self.inv_y.get(ty as usize).copied().flatten()?;
        Some(first..=last)
    }

    /// Output x for source x.
    #[inline]
    pub fn target_x(&self, x: u32) -> Option<u32> {
        self.x.get(x as usize).copied().flatten()
    }

    /// Output y for source y.
    #[inline]
    pub fn target_y(&self, y: u32) -> Option<u32> {
        self.y.get(y as usize).copied().flatten()
    }

    /// Byte offset of the output pixel that source `(x, y)` lands on.
    #[inline]
    pub fn target_offset(&self, x: u32, y: u32) -> Option<usize> {
        let tx = self.target_x(x)?;
        let ty = self.target_y(y)?;
        Some(((ty as usize) * (self.out_width as usize) + tx as usize) * 4)
    }

    /// `true` when every source pixel maps onto itself.
    pub fn is_identity(&self) -> bool {
        fn identity(axis: &[Option<u32>]) -> bool {
            axis.iter()
                .enumerate()
                .all(|(i, t)| *t == Some(i as u32))
        }
        self.x.len() == self.out_width as usize
            && self.y.len() == self.out_height as usize
            && identity(&self.x)
            && identity(&self.y)
    }
}

fn axis_map(src_len: u32, dst_len: u32) -> Vec<Option<u32>> {
    if src_len == 0 {
        return Vec::new();
    }
    (0..src_len)
        .map(|i| {
            let t = div_round_half_up(u64::from(i) * u64::from(dst_len), u64::from(src_len));
            (t < u64::from(dst_len)).then_some(t as u32)
        })
        .collect()
}

fn invert(axis: &[Option<u32>], dst_len: u32) -> Vec<Option<(u32, u32)>> {
    let mut inv: Vec<Option<(u32, u32)>> = vec![None; dst_len as usize];
    for (src, t) in axis.iter().enumerate() {
        let Some(t) = *t else {
            continue;
        };
        let src = src as u32;
        if let Some(slot) = inv.get_mut(t as usize) {
            *slot = Some(match *slot {
                Some((first, _)) => (first, src),
                None => (src, src),
            });
        }
    }
    inv
}

#[cfg(test)]
#[path = "../../tests/unit/reconstruct/scale.rs"]
mod tests;

use crate::foundation::math::unpremul_channel;

/// Precomputed un-premultiply lookup: `lut[a * 256 + c] = min(255, round(c * 255 / a))`.
///
/// Built once per engine and shared by reference with block tasks.
pub struct UnpremulTable {
    lut: Box<[u8]>,
}

impl UnpremulTable {
    /// Build the 256×256 table.
    pub fn new() -> Self {
        let mut lut = vec![0u8; 256 * 256].into_boxed_slice();
        for a in 0..=255u8 {
            let row = usize::from(a) << 8;
            for c in 0..=255u8 {
                lut[row | usize::from(c)] = unpremul_channel(c, a);
            }
        }
        Self { lut }
    }

    /// Un-premultiply one channel value.
    #[inline]
    pub fn channel(&self, c: u8, a: u8) -> u8 {
        self.lut[(usize::from(a) << 8) | usize::from(c)]
    }

    /// Straight-alpha pixel from premultiplied `rgb` and scalar `alpha`.
    ///
    /// `alpha == 0` yields transparent black; `alpha == 255` passes color through.
    #[inline]
    pub fn pixel(&self, rgb: [u8; 3], alpha: u8) -> [u8; 4] {
        match alpha {
            0 => [0, 0, 0, 0],
            255 => [rgb[0], rgb[1], rgb[2], 255],
            a => [
                self.channel(rgb[0], a),
                self.channel(rgb[1], a),
                self.channel(rgb[2], a),
                a,
            ],
        }
    }
}

impl Default for UnpremulTable {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for UnpremulTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnpremulTable").finish_non_exhaustive()
    }
}

/// Reconstruct one straight-alpha pixel from a color pixel and an alpha-mask pixel.
///
/// Alpha is read from channel 0 of the mask pixel.
pub fn unpremultiply(color: [u8; 4], alpha_mask: [u8; 4]) -> [u8; 4] {
    let a = alpha_mask[0];
    if a == 0 {
        return [0, 0, 0, 0];
    }
    [
        unpremul_channel(color[0], a),
        unpremul_channel(color[1], a),
        unpremul_channel(color[2], a),
        a,
    ]
}

#[cfg(test)]
#[path = "../../tests/unit/reconstruct/unpremul.rs"]
mod tests;

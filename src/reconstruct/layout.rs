use crate::foundation::core::AlphaSide;

/// Where the color and alpha halves start inside a side-by-side frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChannelLayout {
    /// Width of one half (`floor(width / 2)`).
    pub half_width: u32,
    /// X offset of the color half.
    pub color_offset_x: u32,
    /// X offset of the alpha half.
    pub alpha_offset_x: u32,
}

/// Split a frame of `width` pixels into color and alpha halves.
///
/// Odd widths drop the last column. For any `width >= 2` the two offsets differ.
pub fn compute_layout(width: u32, alpha_side: AlphaSide) -> ChannelLayout {
    let half_width = width / 2;
    let (color_offset_x, alpha_offset_x) = match alpha_side {
        AlphaSide::Right => (0, half_width),
        AlphaSide::Left => (half_width, 0),
    };
    ChannelLayout {
        half_width,
        color_offset_x,
        alpha_offset_x,
    }
}

impl ChannelLayout {
    /// Byte offsets of the color and alpha pixels for half-frame coordinate `(x, y)`.
    ///
    /// `width` is the full source frame width. Offsets are not bounds-checked.
    pub fn source_offsets(&self, width: u32, x: u32, y: u32) -> (usize, usize) {
        let row = (y as usize) * (width as usize);
        let color = (row + self.color_offset_x as usize + x as usize) * 4;
        let alpha = (row + self.alpha_offset_x as usize + x as usize) * 4;
        (color, alpha)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/reconstruct/layout.rs"]
mod tests;

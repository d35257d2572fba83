use crate::foundation::error::{DualAlphaError, DualAlphaResult};

/// Which half of a side-by-side frame carries the alpha mask.
///
/// The other half carries premultiplied color.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AlphaSide {
    /// Alpha mask on the left half, color on the right.
    Left,
    /// Alpha mask on the right half, color on the left.
    #[default]
    Right,
}

impl AlphaSide {
    /// Lowercase name, matching the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    /// The opposite side.
    pub fn flipped(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

impl std::fmt::Display for AlphaSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AlphaSide {
    type Err = DualAlphaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            other => Err(DualAlphaError::validation(format!(
                "alpha side must be 'left' or 'right', got '{other}'"
            ))),
        }
    }
}

/// Source geometry, alpha side and target size for one reconstruction call.
///
/// `width`/`height` describe the full side-by-side source frame. The output is always
/// `scaled_width × scaled_height`, independent of the source size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ReconstructParams {
    /// Which half carries the alpha mask.
    #[serde(default)]
    pub alpha_side: AlphaSide,
    /// Full source frame width (both halves).
    pub width: u32,
    /// Source frame height.
    pub height: u32,
    /// Output width.
    pub scaled_width: u32,
    /// Output height.
    pub scaled_height: u32,
}

impl ReconstructParams {
    /// Params that output at the native half-frame resolution (no rescale).
    pub fn native(width: u32, height: u32, alpha_side: AlphaSide) -> Self {
        Self {
            alpha_side,
            width,
            height,
            scaled_width: width / 2,
            scaled_height: height,
        }
    }

    /// Replace the output size.
    pub fn with_scaled_size(mut self, scaled_width: u32, scaled_height: u32) -> Self {
        self.scaled_width = scaled_width;
        self.scaled_height = scaled_height;
        self
    }

    /// Width of one half. Odd widths drop the last column.
    pub fn half_width(&self) -> u32 {
        self.width / 2
    }

    /// Expected source buffer length in bytes (`width * height * 4`).
    pub fn frame_len(&self) -> usize {
        (self.width as usize)
            .saturating_mul(self.height as usize)
            .saturating_mul(4)
    }

    /// Output buffer length in bytes (`scaled_width * scaled_height * 4`).
    pub fn output_len(&self) -> DualAlphaResult<usize> {
        (self.scaled_width as usize)
            .checked_mul(self.scaled_height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| DualAlphaError::validation("output buffer size overflow"))
    }

    /// Reject geometry that cannot produce a single output pixel.
    pub fn validate(&self) -> DualAlphaResult<()> {
        if self.width < 2 {
            return Err(DualAlphaError::validation(
                "frame width must be >= 2 (two side-by-side halves)",
            ));
        }
        if self.height == 0 {
            return Err(DualAlphaError::validation("frame height must be > 0"));
        }
        if self.scaled_width == 0 || self.scaled_height == 0 {
            return Err(DualAlphaError::validation(
                "scaled width and height must be > 0",
            ));
        }
        self.output_len()?;
        Ok(())
    }

    /// Validate geometry plus the presence of frame bytes.
    ///
    /// A buffer shorter than [`Self::frame_len`] is accepted: pixels past its end are skipped.
    pub fn validate_frame(&self, data: &[u8]) -> DualAlphaResult<()> {
        if data.is_empty() {
            return Err(DualAlphaError::validation("frame data must be non-empty"));
        }
        self.validate()
    }
}

/// A decoded side-by-side source frame (RGBA8, row-major, tightly packed).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Full frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes.
    pub data: Vec<u8>,
}

impl Frame {
    /// Wrap RGBA8 bytes, checking that the length matches `width * height * 4`.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> DualAlphaResult<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| DualAlphaError::validation("frame size overflow"))?;
        if data.len() != expected {
            return Err(DualAlphaError::validation(format!(
                "frame data length {} does not match {width}x{height}x4 = {expected}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Params for reconstructing this frame at `scaled_width × scaled_height`.
    pub fn params(
        &self,
        alpha_side: AlphaSide,
        scaled_width: u32,
        scaled_height: u32,
    ) -> ReconstructParams {
        ReconstructParams::native(self.width, self.height, alpha_side)
            .with_scaled_size(scaled_width, scaled_height)
    }

    /// Build a frame from an `image` RGBA buffer without copying.
    #[cfg(feature = "image")]
    pub fn from_rgba_image(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            data: img.into_raw(),
        }
    }
}

/// A reconstructed frame: straight (non-premultiplied) RGBA8 at the target size.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconstructedFrame {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Straight-alpha RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
}

impl ReconstructedFrame {
    /// Read one pixel, or `None` when outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let px = self.data.get(idx..idx + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Convert into an `image` RGBA buffer without copying.
    #[cfg(feature = "image")]
    pub fn into_rgba_image(self) -> DualAlphaResult<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.data).ok_or_else(|| {
            DualAlphaError::validation("reconstructed frame data does not match its dimensions")
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;

use crate::foundation::core::ReconstructedFrame;
use crate::foundation::error::{DualAlphaError, DualAlphaResult};

/// Configuration provided to a [`FrameSink`] at the start of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    /// Number of frames that will be pushed.
    pub frame_count: usize,
    /// Output width of every frame.
    pub width: u32,
    /// Output height of every frame.
    pub height: u32,
}

/// Consumer of reconstructed frames in input order.
///
/// Ordering contract: `push_frame` is called with strictly increasing indices starting at 0.
/// Frames are moved into the sink.
///
/// `end` is only called after every frame was pushed. When a batch fails part-way, the error
/// is returned to the caller and the sink is left as it was after the last successful push.
pub trait FrameSink {
    /// Called once before the first frame.
    fn begin(&mut self, cfg: BatchConfig) -> DualAlphaResult<()>;
    /// Receive frame `idx`.
    fn push_frame(&mut self, idx: usize, frame: ReconstructedFrame) -> DualAlphaResult<()>;
    /// Called once after the last frame.
    fn end(&mut self) -> DualAlphaResult<()>;
}

/// In-memory sink that collects frames in order.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<BatchConfig>,
    /// Frames in input order.
    pub frames: Vec<ReconstructedFrame>,
}

impl InMemorySink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Config received by the last `begin`.
    pub fn config(&self) -> Option<BatchConfig> {
        self.cfg
    }

    /// Take the collected frames.
    pub fn into_frames(self) -> Vec<ReconstructedFrame> {
        self.frames
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: BatchConfig) -> DualAlphaResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.frames.reserve(cfg.frame_count);
        Ok(())
    }

    fn push_frame(&mut self, idx: usize, frame: ReconstructedFrame) -> DualAlphaResult<()> {
        if idx != self.frames.len() {
            return Err(DualAlphaError::validation(format!(
                "frame {idx} pushed out of order (expected {})",
                self.frames.len()
            )));
        }
        self.frames.push(frame);
        Ok(())
    }

    fn end(&mut self) -> DualAlphaResult<()> {
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/engine/sink.rs"]
mod tests;

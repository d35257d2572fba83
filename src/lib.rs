//! dualalpha reconstructs straight-alpha RGBA frames from dual-channel alpha video.
//!
//! A dual-channel frame carries premultiplied color in one half and an alpha mask in the
//! other, side by side. The crate turns such frames into straight RGBA at a target size:
//!
//! - Reconstruct single frames or ordered batches with an [`Engine`]
//! - Stream batch output into a [`FrameSink`]
//! - Dispatch frames and batches across OS threads with a [`WorkerPool`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod dispatch;
mod engine;
mod foundation;
mod pool;
mod reconstruct;
mod schedule;

pub use crate::foundation::core::{AlphaSide, Frame, ReconstructParams, ReconstructedFrame};
pub use crate::foundation::error::{DualAlphaError, DualAlphaResult};

pub use crate::dispatch::job::{
    DEFAULT_PRIORITY, JobHandle, JobId, JobOptions, ProgressCallback,
};
pub use crate::dispatch::worker_pool::{
    WorkerPool, WorkerPoolOpts, WorkerPoolStats, WorkerPoolStatus,
};
pub use crate::engine::reconstructor::{BatchStats, Engine, EngineOpts, FrameStats};
pub use crate::engine::sink::{BatchConfig, FrameSink, InMemorySink};
pub use crate::pool::buffer_pool::{BufferPool, BufferPoolOpts, BufferPoolStats};
pub use crate::reconstruct::layout::{ChannelLayout, compute_layout};
pub use crate::reconstruct::scale::ScaleMap;
pub use crate::reconstruct::unpremul::{UnpremulTable, unpremultiply};
pub use crate::schedule::blocks::{Block, DEFAULT_BLOCK_SIZE, partition};
pub use crate::schedule::progress::{BATCH_PROGRESS_STEP, FRAME_PROGRESS_STEP, ProgressFn};

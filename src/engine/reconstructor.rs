use std::sync::Arc;

use rayon::prelude::*;

use crate::engine::sink::{BatchConfig, FrameSink, InMemorySink};
use crate::foundation::core::{ReconstructParams, ReconstructedFrame};
use crate::foundation::error::{DualAlphaError, DualAlphaResult};
use crate::pool::buffer_pool::{BufferPool, BufferPoolOpts, BufferPoolStats};
use crate::reconstruct::layout::compute_layout;
use crate::reconstruct::pixel::{BlockReport, FrameContext, merge_row, reconstruct_block};
use crate::reconstruct::scale::ScaleMap;
use crate::reconstruct::unpremul::UnpremulTable;
use crate::schedule::blocks::{Block, BlockGrid, DEFAULT_BLOCK_SIZE};
use crate::schedule::progress::{
    BATCH_PROGRESS_STEP, FRAME_PROGRESS_STEP, ProgressFn, ProgressTracker,
};

/// Options controlling block decomposition, threading and scratch reuse.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EngineOpts {
    /// Edge length of square reconstruction blocks.
    pub block_size: u32,
    /// Reconstruct blocks in parallel on a rayon pool. `false` runs them in order on the
    /// calling thread.
    pub parallel: bool,
    /// Override the number of rayon threads. `None` uses rayon defaults.
    pub threads: Option<usize>,
    /// Frames per batch in [`Engine::reconstruct_batch`]. 0 is treated as 1.
    pub batch_size: usize,
    /// Scratch buffer pool options.
    pub buffer_pool: BufferPoolOpts,
}

impl Default for EngineOpts {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            parallel: true,
            threads: None,
            batch_size: 10,
            buffer_pool: BufferPoolOpts::default(),
        }
    }
}

impl EngineOpts {
    /// Sequential options, useful for in-process testing.
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }

    /// Reject unusable options.
    pub fn validate(&self) -> DualAlphaResult<()> {
        if self.block_size == 0 {
            return Err(DualAlphaError::validation("engine block_size must be >= 1"));
        }
        if let Some(n) = self.threads
            && n == 0
        {
            return Err(DualAlphaError::validation(
                "engine 'threads' must be >= 1 when set",
            ));
        }
        Ok(())
    }
}

/// Pixel counts for one reconstructed frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Blocks the half-frame was split into.
    pub blocks: u64,
    /// Pixels written to the output.
    pub pixels_written: u64,
    /// Pixels skipped because the color or alpha source ran past the frame buffer.
    pub pixels_skipped_source: u64,
    /// Pixels skipped because their scaled position fell off the output grid.
    pub pixels_skipped_target: u64,
}

impl FrameStats {
    fn absorb(&mut self, r: BlockReport) {
        self.blocks += 1;
        self.pixels_written += r.written;
        self.pixels_skipped_source += r.skipped_source;
        self.pixels_skipped_target += r.skipped_target;
    }

    fn add(&mut self, o: FrameStats) {
        self.blocks += o.blocks;
        self.pixels_written += o.pixels_written;
        self.pixels_skipped_source += o.pixels_skipped_source;
        self.pixels_skipped_target += o.pixels_skipped_target;
    }
}

/// Aggregated counters for a batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// Frames reconstructed.
    pub frames: u64,
    /// Batches the frames were grouped into.
    pub batches: u64,
    /// Summed per-frame counters.
    pub pixels: FrameStats,
}

/// Dual-channel alpha reconstruction engine.
///
/// An engine owns its un-premultiply table and scratch buffer pool. One frame fans out into
/// blocks that run concurrently and join before the call returns. The buffer pool is only
/// touched from the calling thread; block tasks receive pre-allocated scratch.
pub struct Engine {
    opts: EngineOpts,
    table: UnpremulTable,
    buffers: BufferPool,
    thread_pool: Option<Arc<rayon::ThreadPool>>,
}

impl Engine {
    /// Create an engine with its own rayon pool (when `opts.parallel`).
    pub fn new(opts: EngineOpts) -> DualAlphaResult<Self> {
        opts.validate()?;
        let thread_pool = if opts.parallel {
            Some(Arc::new(build_thread_pool(opts.threads)?))
        } else {
            None
        };
        Ok(Self::assemble(opts, thread_pool))
    }

    /// Create an engine that runs its blocks on a shared rayon pool.
    ///
    /// The pool is ignored when `opts.parallel` is `false`.
    pub fn with_thread_pool(
        opts: EngineOpts,
        pool: Arc<rayon::ThreadPool>,
    ) -> DualAlphaResult<Self> {
        opts.validate()?;
        let thread_pool = opts.parallel.then_some(pool);
        Ok(Self::assemble(opts, thread_pool))
    }

    fn assemble(opts: EngineOpts, thread_pool: Option<Arc<rayon::ThreadPool>>) -> Self {
        Self {
            buffers: BufferPool::new(opts.buffer_pool),
            table: UnpremulTable::new(),
            thread_pool,
            opts,
        }
    }

    /// Engine options.
    pub fn opts(&self) -> &EngineOpts {
        &self.opts
    }

    /// Scratch pool counters.
    pub fn buffer_pool_stats(&self) -> BufferPoolStats {
        self.buffers.stats()
    }

    /// Zero the scratch pool counters.
    pub fn reset_stats(&mut self) {
        self.buffers.reset_stats();
    }

    /// Drop every pooled scratch buffer.
    pub fn clear_memory(&mut self) {
        self.buffers.clear();
    }

    /// Hand a buffer the caller no longer needs back to the scratch pool.
    pub fn recycle_buffer(&mut self, buf: Vec<u8>) {
        self.buffers.recycle_buffer(buf);
    }

    /// Hand a consumed output frame back to the scratch pool.
    pub fn recycle_output(&mut self, frame: ReconstructedFrame) {
        self.buffers.recycle_buffer(frame.data);
    }

    /// Reconstruct one frame.
    pub fn reconstruct_frame(
        &mut self,
        data: &[u8],
        params: &ReconstructParams,
    ) -> DualAlphaResult<ReconstructedFrame> {
        self.reconstruct_frame_with_stats(data, params, None)
            .map(|(frame, _)| frame)
    }

    /// Reconstruct one frame, reporting block progress every 10% and returning pixel counts.
    #[tracing::instrument(skip(self, data, progress), fields(len = data.len()))]
    pub fn reconstruct_frame_with_stats(
        &mut self,
        data: &[u8],
        params: &ReconstructParams,
        progress: Option<ProgressFn<'_>>,
    ) -> DualAlphaResult<(ReconstructedFrame, FrameStats)> {
        params.validate_frame(data)?;
        self.run_frame(data, params, progress)
    }

    /// Reconstruct an ordered list of frames sharing one geometry.
    pub fn reconstruct_batch<F: AsRef<[u8]>>(
        &mut self,
        frames: &[F],
        params: &ReconstructParams,
        progress: Option<ProgressFn<'_>>,
    ) -> DualAlphaResult<Vec<ReconstructedFrame>> {
        let mut sink = InMemorySink::new();
        self.reconstruct_batch_into(frames, params, &mut sink, progress)?;
        Ok(sink.into_frames())
    }

    /// Reconstruct frames in groups of `batch_size`, streaming each group into `sink` once it
    /// completes. Progress is reported every 20% of frames.
    ///
    /// On error the sink has received the frames of every completed group, and `end` is not
    /// called.
    #[tracing::instrument(skip(self, frames, sink, progress), fields(frames = frames.len()))]
    pub fn reconstruct_batch_into<F: AsRef<[u8]>>(
        &mut self,
        frames: &[F],
        params: &ReconstructParams,
        sink: &mut dyn FrameSink,
        progress: Option<ProgressFn<'_>>,
    ) -> DualAlphaResult<BatchStats> {
        if frames.is_empty() {
            return Err(DualAlphaError::validation(
                "batch must contain at least one frame",
            ));
        }
        params.validate()?;
        for (i, f) in frames.iter().enumerate() {
            if f.as_ref().is_empty() {
                return Err(DualAlphaError::validation(format!(
                    "frame {i} of batch has no data"
                )));
            }
        }

        let batch_size = normalized_batch_size(self.opts.batch_size);
        let tracker = ProgressTracker::new(frames.len(), BATCH_PROGRESS_STEP, progress);
        let mut stats = BatchStats::default();

        sink.begin(BatchConfig {
            frame_count: frames.len(),
            width: params.scaled_width,
            height: params.scaled_height,
        })?;

        for (batch_idx, chunk) in frames.chunks(batch_size).enumerate() {
            let mut done = Vec::with_capacity(chunk.len());
            for f in chunk {
                done.push(self.run_frame(f.as_ref(), params, None)?);
            }
            let base = batch_idx * batch_size;
            for (i, (frame, frame_stats)) in done.into_iter().enumerate() {
                sink.push_frame(base + i, frame)?;
                stats.pixels.add(frame_stats);
                stats.frames += 1;
            }
            stats.batches += 1;
            tracker.advance(chunk.len());
        }

        sink.end()?;
        tracing::debug!(frames = stats.frames, batches = stats.batches, "batch reconstructed");
        Ok(stats)
    }

    fn run_frame(
        &mut self,
        data: &[u8],
        params: &ReconstructParams,
        progress: Option<ProgressFn<'_>>,
    ) -> DualAlphaResult<(ReconstructedFrame, FrameStats)> {
        let layout = compute_layout(params.width, params.alpha_side);
        let scale = ScaleMap::new(
            layout.half_width,
            params.height,
            params.scaled_width,
            params.scaled_height,
        );
        let grid = BlockGrid::new(layout.half_width, params.height, self.opts.block_size);
        let blocks = grid.blocks();
        let out_len = params.output_len()?;
        let row_len = (params.scaled_width as usize) * 4;

        // One block-major staging buffer per frame, split into disjoint per-block slices.
        let mut out = self.buffers.get_buffer(out_len);
        let mut stage = self.buffers.get_buffer(grid.stage_len());
        let mut slices: Vec<&mut [u8]> = Vec::with_capacity(blocks.len());
        let mut rest: &mut [u8] = &mut stage;
        for block in &blocks {
            let (head, tail) = std::mem::take(&mut rest).split_at_mut(block.byte_len());
            slices.push(head);
            rest = tail;
        }

        let ctx = FrameContext {
            frame: data,
            width: params.width,
            layout,
            scale: &scale,
            table: &self.table,
        };
        // The extra unit is the merge, so 100 is only reported once the output is complete.
        let tracker = ProgressTracker::new(blocks.len() + 1, FRAME_PROGRESS_STEP, progress);
        let run_block = |(block, slice): (&Block, &mut [u8])| {
            let r = reconstruct_block(&ctx, block, slice);
            tracker.advance(1);
            r
        };

        // Fan out over blocks, join, then fan out again over output rows.
        let reports: Vec<BlockReport> = match self.thread_pool.as_deref() {
            Some(pool) => {
                let reports: Vec<BlockReport> = pool.install(|| {
                    blocks
                        .par_iter()
                        .zip(slices.into_par_iter())
                        .map(run_block)
                        .collect()
                });
                let staged: &[u8] = &stage;
                pool.install(|| {
                    out.par_chunks_mut(row_len)
                        .enumerate()
                        .for_each(|(ty, row)| merge_row(&ctx, &grid, staged, ty as u32, row));
                });
                reports
            }
            None => {
                let reports: Vec<BlockReport> =
                    blocks.iter().zip(slices).map(run_block).collect();
                for (ty, row) in out.chunks_mut(row_len).enumerate() {
                    merge_row(&ctx, &grid, &stage, ty as u32, row);
                }
                reports
            }
        };
        tracker.advance(1);

        let mut stats = FrameStats::default();
        for report in reports {
            stats.absorb(report);
        }
        self.buffers.recycle_buffer(stage);

        if stats.pixels_skipped_source > 0 {
            tracing::debug!(
                skipped = stats.pixels_skipped_source,
                frame_len = data.len(),
                expected_len = params.frame_len(),
                "pixels skipped: source past end of frame buffer"
            );
        }
        tracing::debug!(
            blocks = stats.blocks,
            written = stats.pixels_written,
            "frame reconstructed"
        );

        Ok((
            ReconstructedFrame {
                width: params.scaled_width,
                height: params.scaled_height,
                data: out,
            },
            stats,
        ))
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("opts", &self.opts)
            .field("buffers", &self.buffers.stats())
            .finish_non_exhaustive()
    }
}

pub(crate) fn build_thread_pool(threads: Option<usize>) -> DualAlphaResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(DualAlphaError::validation(
            "engine 'threads' must be >= 1 when set",
        ));
    }

    let mut builder =
        rayon::ThreadPoolBuilder::new().thread_name(|i| format!("dualalpha-block-{i}"));
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder.build().map_err(|e| {
        DualAlphaError::Other(anyhow::anyhow!("failed to build rayon thread pool: {e}"))
    })
}

fn normalized_batch_size(batch_size: usize) -> usize {
    if batch_size == 0 { 1 } else { batch_size }
}

#[cfg(test)]
#[path = "../../tests/unit/engine/reconstructor.rs"]
mod tests;

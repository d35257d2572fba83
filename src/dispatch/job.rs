use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};

use crate::foundation::core::{ReconstructParams, ReconstructedFrame};
use crate::foundation::error::{DualAlphaError, DualAlphaResult};

/// Identifier assigned to a submitted job, unique per [`WorkerPool`](crate::WorkerPool).
pub type JobId = u64;

/// Shared progress callback for dispatched jobs.
pub type ProgressCallback = Arc<dyn Fn(u8) + Send + Sync>;

/// Priority given to jobs that don't ask for one.
pub const DEFAULT_PRIORITY: u8 = 5;

/// Per-job submission options.
#[derive(Clone)]
pub struct JobOptions {
    /// Higher runs first. Jobs with equal priority run in submission order.
    pub priority: u8,
    /// Receives coarse completion percentages while the job runs.
    pub on_progress: Option<ProgressCallback>,
}

impl Default for JobOptions {
    fn default() -> Self {
        Self {
            priority: DEFAULT_PRIORITY,
            on_progress: None,
        }
    }
}

impl JobOptions {
    /// Default options with the given priority.
    pub fn with_priority(priority: u8) -> Self {
        Self {
            priority,
            ..Self::default()
        }
    }

    /// Attach a progress callback.
    pub fn on_progress(mut self, f: impl Fn(u8) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Arc::new(f));
        self
    }
}

impl std::fmt::Debug for JobOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobOptions")
            .field("priority", &self.priority)
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

pub(crate) enum JobRequest {
    Frame {
        data: Vec<u8>,
        reply: Sender<DualAlphaResult<ReconstructedFrame>>,
    },
    Batch {
        frames: Vec<Vec<u8>>,
        reply: Sender<DualAlphaResult<Vec<ReconstructedFrame>>>,
    },
}

impl JobRequest {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::Frame { .. } => "frame",
            Self::Batch { .. } => "batch",
        }
    }

    /// Deliver `err` instead of running the job.
    pub(crate) fn fail(self, err: DualAlphaError) {
        // The caller may have dropped its handle; nothing to deliver then.
        match self {
            Self::Frame { reply, .. } => {
                let _ = reply.send(Err(err));
            }
            Self::Batch { reply, .. } => {
                let _ = reply.send(Err(err));
            }
        }
    }
}

pub(crate) struct QueuedJob {
    pub(crate) id: JobId,
    pub(crate) seq: u64,
    pub(crate) priority: u8,
    pub(crate) params: ReconstructParams,
    pub(crate) on_progress: Option<ProgressCallback>,
    pub(crate) request: JobRequest,
}

// Max-heap order: higher priority first, then lower sequence number.
impl Ord for QueuedJob {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for QueuedJob {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for QueuedJob {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

impl Eq for QueuedJob {}

/// Receiving end of a submitted job.
///
/// The result is moved out of the worker, never copied. Dropping the handle doesn't cancel
/// the job; its result is discarded.
#[derive(Debug)]
pub struct JobHandle<T> {
    id: JobId,
    rx: Receiver<DualAlphaResult<T>>,
}

impl<T> JobHandle<T> {
    pub(crate) fn new(id: JobId, rx: Receiver<DualAlphaResult<T>>) -> Self {
        Self { id, rx }
    }

    /// Job identifier.
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Block until the job finishes.
    pub fn wait(self) -> DualAlphaResult<T> {
        self.rx.recv().unwrap_or_else(|_| Err(self.lost()))
    }

    /// Return the result if the job already finished.
    pub fn try_wait(&self) -> Option<DualAlphaResult<T>> {
        match self.rx.try_recv() {
            Ok(r) => Some(r),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(self.lost())),
        }
    }

    /// Wait at most `timeout` for the job to finish.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<DualAlphaResult<T>> {
        match self.rx.recv_timeout(timeout) {
            Ok(r) => Some(r),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Err(self.lost())),
        }
    }

    fn lost(&self) -> DualAlphaError {
        DualAlphaError::dispatch(format!("job {} was dropped without a result", self.id))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/dispatch/job.rs"]
mod tests;

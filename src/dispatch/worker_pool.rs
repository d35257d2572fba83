use std::collections::BinaryHeap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::thread::JoinHandle;

use parking_lot::{Condvar, Mutex};

use crate::dispatch::job::{JobHandle, JobId, JobOptions, JobRequest, QueuedJob};
use crate::engine::reconstructor::{Engine, EngineOpts, build_thread_pool};
use crate::foundation::core::{ReconstructParams, ReconstructedFrame};
use crate::foundation::error::{DualAlphaError, DualAlphaResult};
use crate::pool::buffer_pool::BufferPoolStats;

/// Worker pool configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct WorkerPoolOpts {
    /// Number of worker threads. `None` uses the available hardware parallelism.
    pub workers: Option<usize>,
    /// Options for each worker's engine.
    pub engine: EngineOpts,
}

impl WorkerPoolOpts {
    /// Parse and validate options from JSON. Missing fields take their defaults.
    pub fn from_json_str(s: &str) -> DualAlphaResult<Self> {
        let opts: Self = serde_json::from_str(s)?;
        opts.validate()?;
        Ok(opts)
    }

    /// Reject unusable options.
    pub fn validate(&self) -> DualAlphaResult<()> {
        if let Some(n) = self.workers
            && n == 0
        {
            return Err(DualAlphaError::validation(
                "worker pool 'workers' must be >= 1 when set",
            ));
        }
        self.engine.validate()
    }

    fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}

/// Snapshot of the pool's load.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorkerPoolStatus {
    /// Worker threads still serving jobs.
    pub workers: usize,
    /// Workers currently running a job.
    pub busy_workers: usize,
    /// Jobs waiting for a worker.
    pub queued_jobs: usize,
    /// Set once shutdown has begun.
    pub shutting_down: bool,
    /// Scratch buffers parked in worker pools, summed over workers.
    pub retained_buffers: usize,
    /// Capacity bytes parked in worker pools, summed over workers.
    pub retained_bytes: usize,
}

/// Job counters since creation or the last [`WorkerPool::reset_stats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorkerPoolStats {
    /// Jobs accepted by `submit_*`.
    pub jobs_submitted: u64,
    /// Jobs that returned a result.
    pub jobs_completed: u64,
    /// Jobs that returned an error, including ones failed at shutdown.
    pub jobs_failed: u64,
    /// Frames delivered by completed jobs.
    pub frames_reconstructed: u64,
}

#[derive(Default)]
struct Counters {
    submitted: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    frames: AtomicU64,
}

// Last pool snapshot published by one worker.
#[derive(Default)]
struct PoolUsage {
    buffers: AtomicUsize,
    bytes: AtomicUsize,
}

#[derive(Default)]
struct QueueState {
    heap: BinaryHeap<QueuedJob>,
    next_seq: u64,
    shutdown: bool,
}

struct Shared {
    queue: Mutex<QueueState>,
    ready: Condvar,
    busy: AtomicUsize,
    alive: AtomicUsize,
    clear_epoch: AtomicU64,
    shutting_down: AtomicBool,
    next_id: AtomicU64,
    counters: Counters,
    pools: Vec<PoolUsage>,
}

impl Shared {
    fn publish(&self, worker: usize, stats: BufferPoolStats) {
        if let Some(u) = self.pools.get(worker) {
            u.buffers.store(stats.retained_buffers, Ordering::Release);
            u.bytes.store(stats.retained_bytes, Ordering::Release);
        }
    }

    fn record(&self, ok: bool, frames: u64) {
        let c = &self.counters;
        if ok {
            c.completed.fetch_add(1, Ordering::AcqRel);
            c.frames.fetch_add(frames, Ordering::AcqRel);
        } else {
            c.failed.fetch_add(1, Ordering::AcqRel);
        }
    }
}

enum Wake {
    Job(QueuedJob),
    Clear(u64),
    Exit,
}

/// Fixed set of OS threads that reconstruct frames and batches from a priority queue.
///
/// Each worker owns an [`Engine`] (and its buffer pool). All workers share one rayon pool for
/// block fan-out. Inputs and outputs move between caller and worker without copying.
pub struct WorkerPool {
    shared: Arc<Shared>,
    threads: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn the worker threads.
    pub fn new(opts: WorkerPoolOpts) -> DualAlphaResult<Self> {
        opts.validate()?;
        let count = opts.worker_count();
        let rayon_pool = if opts.engine.parallel {
            Some(Arc::new(build_thread_pool(opts.engine.threads)?))
        } else {
            None
        };

        let shared = Arc::new(Shared {
            queue: Mutex::new(QueueState::default()),
            ready: Condvar::new(),
            busy: AtomicUsize::new(0),
            alive: AtomicUsize::new(0),
            clear_epoch: AtomicU64::new(0),
            shutting_down: AtomicBool::new(false),
            next_id: AtomicU64::new(0),
            counters: Counters::default(),
            pools: (0..count).map(|_| PoolUsage::default()).collect(),
        });

        let mut pool = Self {
            shared,
            threads: Vec::with_capacity(count),
        };
        for index in 0..count {
            let engine = make_engine(&opts.engine, rayon_pool.as_ref())?;
            let worker = Worker {
                index,
                engine,
                engine_opts: opts.engine.clone(),
                rayon_pool: rayon_pool.clone(),
                shared: Arc::clone(&pool.shared),
            };
            pool.shared.alive.fetch_add(1, Ordering::AcqRel);
            let spawned = std::thread::Builder::new()
                .name(format!("dualalpha-worker-{index}"))
                .spawn(move || worker.run());
            match spawned {
                Ok(handle) => pool.threads.push(handle),
                Err(e) => {
                    pool.shared.alive.fetch_sub(1, Ordering::AcqRel);
                    // Dropping `pool` joins the threads spawned so far.
                    return Err(DualAlphaError::Other(anyhow::anyhow!(
                        "failed to spawn worker thread: {e}"
                    )));
                }
            }
        }

        tracing::info!(
            workers = count,
            parallel = opts.engine.parallel,
            block_size = opts.engine.block_size,
            "worker pool started"
        );
        Ok(pool)
    }

    /// Queue one frame. Input errors are reported here, not through the handle.
    pub fn submit_frame(
        &self,
        data: Vec<u8>,
        params: ReconstructParams,
        opts: JobOptions,
    ) -> DualAlphaResult<JobHandle<ReconstructedFrame>> {
        params.validate_frame(&data)?;
        let (reply, rx) = crossbeam_channel::bounded(1);
        let id = self.enqueue(params, opts, JobRequest::Frame { data, reply })?;
        Ok(JobHandle::new(id, rx))
    }

    /// Queue an ordered batch of frames sharing one geometry.
    pub fn submit_batch(
        &self,
        frames: Vec<Vec<u8>>,
        params: ReconstructParams,
        opts: JobOptions,
    ) -> DualAlphaResult<JobHandle<Vec<ReconstructedFrame>>> {
        if frames.is_empty() {
            return Err(DualAlphaError::validation(
                "batch must contain at least one frame",
            ));
        }
        for f in &frames {
            params.validate_frame(f)?;
        }
        let (reply, rx) = crossbeam_channel::bounded(1);
        let id = self.enqueue(params, opts, JobRequest::Batch { frames, reply })?;
        Ok(JobHandle::new(id, rx))
    }

    /// Ask every worker to drop its pooled scratch buffers.
    ///
    /// Idle workers clear immediately. Busy workers clear before their next job.
    /// [`WorkerPool::status`] reflects each worker's pool once it has cleared.
    pub fn clear_memory(&self) {
        {
            // Bump under the queue lock so a worker about to wait can't miss it.
            let _q = self.shared.queue.lock();
            self.shared.clear_epoch.fetch_add(1, Ordering::AcqRel);
        }
        self.shared.ready.notify_all();
    }

    /// Current load.
    pub fn status(&self) -> WorkerPoolStatus {
        let queued_jobs = self.shared.queue.lock().heap.len();
        let pools = &self.shared.pools;
        WorkerPoolStatus {
            retained_buffers: pools
                .iter()
                .map(|u| u.buffers.load(Ordering::Acquire))
                .sum(),
            retained_bytes: pools.iter().map(|u| u.bytes.load(Ordering::Acquire)).sum(),
            workers: self.shared.alive.load(Ordering::Acquire),
            busy_workers: self.shared.busy.load(Ordering::Acquire),
            queued_jobs,
            shutting_down: self.shared.shutting_down.load(Ordering::Acquire),
        }
    }

    /// Job counters.
    pub fn stats(&self) -> WorkerPoolStats {
        let c = &self.shared.counters;
        WorkerPoolStats {
            jobs_submitted: c.submitted.load(Ordering::Acquire),
            jobs_completed: c.completed.load(Ordering::Acquire),
            jobs_failed: c.failed.load(Ordering::Acquire),
            frames_reconstructed: c.frames.load(Ordering::Acquire),
        }
    }

    /// Zero the job counters.
    pub fn reset_stats(&self) {
        let c = &self.shared.counters;
        c.submitted.store(0, Ordering::Release);
        c.completed.store(0, Ordering::Release);
        c.failed.store(0, Ordering::Release);
        c.frames.store(0, Ordering::Release);
    }

    /// Fail queued jobs, let running jobs finish, and join the workers.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn enqueue(
        &self,
        params: ReconstructParams,
        opts: JobOptions,
        request: JobRequest,
    ) -> DualAlphaResult<JobId> {
        if self.shared.alive.load(Ordering::Acquire) == 0 {
            return Err(DualAlphaError::dispatch("no worker threads are running"));
        }
        let id = self.shared.next_id.fetch_add(1, Ordering::AcqRel);
        {
            let mut q = self.shared.queue.lock();
            if q.shutdown {
                return Err(DualAlphaError::dispatch("worker pool is shut down"));
            }
            let seq = q.next_seq;
            q.next_seq += 1;
            tracing::trace!(id, priority = opts.priority, kind = request.kind(), "job queued");
            q.heap.push(QueuedJob {
                id,
                seq,
                priority: opts.priority,
                params,
                on_progress: opts.on_progress,
                request,
            });
        }
        self.shared.counters.submitted.fetch_add(1, Ordering::AcqRel);
        self.shared.ready.notify_one();
        Ok(id)
    }

    fn stop(&mut self) {
        if self.threads.is_empty() {
            return;
        }
        self.shared.shutting_down.store(true, Ordering::Release);
        let pending: Vec<QueuedJob> = {
            let mut q = self.shared.queue.lock();
            q.shutdown = true;
            q.heap.drain().collect()
        };
        if !pending.is_empty() {
            tracing::debug!(jobs = pending.len(), "failing queued jobs at shutdown");
        }
        for job in pending {
            self.shared.counters.failed.fetch_add(1, Ordering::AcqRel);
            job.request
                .fail(DualAlphaError::dispatch("worker pool shut down before the job ran"));
        }
        self.shared.ready.notify_all();

        for handle in self.threads.drain(..) {
            if handle.join().is_err() {
                tracing::warn!("worker thread exited by panic");
            }
        }
        tracing::info!("worker pool stopped");
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

fn make_engine(
    opts: &EngineOpts,
    rayon_pool: Option<&Arc<rayon::ThreadPool>>,
) -> DualAlphaResult<Engine> {
    match rayon_pool {
        Some(p) => Engine::with_thread_pool(opts.clone(), Arc::clone(p)),
        None => Engine::new(opts.clone()),
    }
}

struct Worker {
    index: usize,
    engine: Engine,
    engine_opts: EngineOpts,
    rayon_pool: Option<Arc<rayon::ThreadPool>>,
    shared: Arc<Shared>,
}

impl Worker {
    fn run(mut self) {
        tracing::debug!(worker = self.index, "worker started");
        let mut seen_epoch = self.shared.clear_epoch.load(Ordering::Acquire);
        loop {
            match self.next(seen_epoch) {
                Wake::Job(job) => {
                    self.shared.busy.fetch_add(1, Ordering::AcqRel);
                    let keep_going = self.execute(job);
                    self.shared.busy.fetch_sub(1, Ordering::AcqRel);
                    if !keep_going {
                        break;
                    }
                }
                Wake::Clear(epoch) => {
                    seen_epoch = epoch;
                    self.engine.clear_memory();
                    self.shared.publish(self.index, self.engine.buffer_pool_stats());
                    tracing::debug!(worker = self.index, "buffer pool cleared");
                }
                Wake::Exit => break,
            }
        }
        self.shared.publish(self.index, BufferPoolStats::default());
        self.shared.alive.fetch_sub(1, Ordering::AcqRel);
        tracing::debug!(worker = self.index, "worker stopped");
    }

    fn next(&self, seen_epoch: u64) -> Wake {
        let mut q = self.shared.queue.lock();
        loop {
            let epoch = self.shared.clear_epoch.load(Ordering::Acquire);
            if epoch != seen_epoch {
                return Wake::Clear(epoch);
            }
            if q.shutdown {
                return Wake::Exit;
            }
            if let Some(job) = q.heap.pop() {
                return Wake::Job(job);
            }
            self.shared.ready.wait(&mut q);
        }
    }

    /// Run one job. Returns `false` when the worker can no longer serve.
    fn execute(&mut self, job: QueuedJob) -> bool {
        let QueuedJob {
            id,
            params,
            on_progress,
            request,
            ..
        } = job;
        let _span = tracing::debug_span!("job", id, worker = self.index).entered();
        let progress = on_progress.as_deref().map(|f| f as &(dyn Fn(u8) + Sync));
        let index = self.index;
        let engine = &mut self.engine;
        let shared = &self.shared;

        // Counters are settled before the reply so a caller that just received its result
        // sees them.
        let panicked = match request {
            JobRequest::Frame { data, reply } => {
                let outcome = catch_unwind(AssertUnwindSafe(|| {
                    engine
                        .reconstruct_frame_with_stats(&data, &params, progress)
                        .map(|(frame, _)| frame)
                }));
                let (result, panicked) = settle(id, outcome);
                if !panicked {
                    engine.recycle_buffer(data);
                }
                shared.record(result.is_ok(), 1);
                shared.publish(index, engine.buffer_pool_stats());
                let _ = reply.send(result);
                panicked
            }
            JobRequest::Batch { frames, reply } => {
                let count = frames.len() as u64;
                let outcome = catch_unwind(AssertUnwindSafe(|| {
                    engine.reconstruct_batch(&frames, &params, progress)
                }));
                let (result, panicked) = settle(id, outcome);
                if !panicked {
                    for f in frames {
                        engine.recycle_buffer(f);
                    }
                }
                shared.record(result.is_ok(), count);
                shared.publish(index, engine.buffer_pool_stats());
                let _ = reply.send(result);
                panicked
            }
        };

        if panicked {
            match make_engine(&self.engine_opts, self.rayon_pool.as_ref()) {
                Ok(fresh) => {
                    self.engine = fresh;
                    self.shared.publish(self.index, self.engine.buffer_pool_stats());
                }
                Err(e) => {
                    tracing::error!(worker = self.index, error = %e, "failed to rebuild engine");
                    return false;
                }
            }
        }
        true
    }
}

/// Turn a caught panic into a dispatch error. The flag reports whether a panic happened.
fn settle<T>(
    id: JobId,
    outcome: std::thread::Result<DualAlphaResult<T>>,
) -> (DualAlphaResult<T>, bool) {
    match outcome {
        Ok(result) => (result, false),
        Err(payload) => {
            let msg = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            tracing::warn!(id, panic = %msg, "job panicked; rebuilding engine");
            (
                Err(DualAlphaError::dispatch(format!("job {id} panicked: {msg}"))),
                true,
            )
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/dispatch/worker_pool.rs"]
mod tests;

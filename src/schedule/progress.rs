use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

/// Progress callback receiving a percentage in `0..=100`.
pub type ProgressFn<'a> = &'a (dyn Fn(u8) + Sync);

/// Block progress granularity for single-frame reconstruction.
pub const FRAME_PROGRESS_STEP: u8 = 10;
/// Frame progress granularity for batch reconstruction.
pub const BATCH_PROGRESS_STEP: u8 = 20;

/// Coarse completion tracker shared by concurrent tasks.
///
/// Each multiple of `step` is reported at most once. Reports never go backwards, and the last
/// completed unit always reports 100.
pub(crate) struct ProgressTracker<'a> {
    total: usize,
    step: u8,
    done: AtomicUsize,
    last_reported: AtomicU8,
    sink: Option<ProgressFn<'a>>,
}

impl<'a> ProgressTracker<'a> {
    pub(crate) fn new(total: usize, step: u8, sink: Option<ProgressFn<'a>>) -> Self {
        Self {
            total,
            step: step.clamp(1, 100),
            done: AtomicUsize::new(0),
            last_reported: AtomicU8::new(0),
            sink,
        }
    }

    pub(crate) fn advance(&self, units: usize) {
        let Some(sink) = self.sink else {
            return;
        };
        if self.total == 0 {
            return;
        }
        let done = self.done.fetch_add(units, Ordering::AcqRel) + units;
        let pct = (done.min(self.total) * 100 / self.total) as u8;
        let mark = if pct == 100 {
            100
        } else {
            pct / self.step * self.step
        };
        if mark == 0 {
            return;
        }
        let prev = self.last_reported.fetch_max(mark, Ordering::AcqRel);
        if mark > prev {
            sink(mark);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/schedule/progress.rs"]
mod tests;

use crate::foundation::math::size_class;
use std::collections::HashMap;

/// Pool configuration for reusable scratch buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BufferPoolOpts {
    /// Smallest size class in bytes. Requests below it are rounded up to it.
    pub min_size: usize,
    /// Requests above this many bytes bypass the pool (allocate-and-discard).
    pub max_size: usize,
    /// Maximum number of retained buffers per size class.
    pub max_buffers_per_bucket: usize,
    /// Maximum capacity bytes retained across all buckets.
    pub max_pool_bytes: usize,
}

impl Default for BufferPoolOpts {
    fn default() -> Self {
        Self {
            min_size: 1024,
            max_size: 50 * 1024 * 1024,
            max_buffers_per_bucket: 50,
            max_pool_bytes: 256 * 1024 * 1024,
        }
    }
}

/// Counters describing pool behavior since creation (or the last [`BufferPool::reset_stats`]).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BufferPoolStats {
    /// Buffers currently parked in buckets.
    pub retained_buffers: usize,
    /// Capacity bytes currently parked in buckets.
    pub retained_bytes: usize,
    /// Fresh pooled allocations.
    pub alloc_buffers: u64,
    /// Bytes reserved by fresh pooled allocations.
    pub alloc_bytes: u64,
    /// Requests served from a bucket.
    pub reused_buffers: u64,
    /// Requests outside the poolable size range.
    pub bypassed: u64,
    /// Buffers dropped on recycle (bucket full, byte budget spent, or not poolable).
    pub dropped_on_release: u64,
}

struct Bucket {
    class: usize,
    buffers: Vec<Vec<u8>>,
}

/// Size-class pool of byte buffers.
///
/// Keyed by power-of-two capacity. Every buffer handed out by [`BufferPool::get_buffer`] has
/// exactly the requested length and contains only zero bytes.
///
/// The pool is not synchronized. It belongs to one engine and is touched only from the
/// orchestrating thread, never from block tasks.
pub struct BufferPool {
    opts: BufferPoolOpts,
    stats: BufferPoolStats,

    bucket_idx_by_class: HashMap<usize, usize>,
    buckets: Vec<Bucket>,
}

impl BufferPool {
    /// Create an empty pool.
    pub fn new(opts: BufferPoolOpts) -> Self {
        Self {
            opts,
            stats: BufferPoolStats::default(),
            bucket_idx_by_class: HashMap::new(),
            buckets: Vec::new(),
        }
    }

    /// Pool options.
    pub fn opts(&self) -> BufferPoolOpts {
        self.opts
    }

    /// Snapshot of the pool counters.
    pub fn stats(&self) -> BufferPoolStats {
        self.stats
    }

    /// Zero the cumulative counters. Retained counts keep describing the buckets.
    pub fn reset_stats(&mut self) {
        self.stats = BufferPoolStats {
            retained_buffers: self.stats.retained_buffers,
            retained_bytes: self.stats.retained_bytes,
            ..BufferPoolStats::default()
        };
    }

    /// Hand out a zero-filled buffer of exactly `size` bytes.
    pub fn get_buffer(&mut self, size: usize) -> Vec<u8> {
        let Some(class) = self.poolable_class(size) else {
            self.stats.bypassed = self.stats.bypassed.saturating_add(1);
            return vec![0u8; size];
        };

        if let Some(&bi) = self.bucket_idx_by_class.get(&class)
            && let Some(mut buf) = self.buckets[bi].buffers.pop()
        {
            self.stats.retained_buffers = self.stats.retained_buffers.saturating_sub(1);
            self.stats.retained_bytes = self.stats.retained_bytes.saturating_sub(buf.capacity());
            self.stats.reused_buffers = self.stats.reused_buffers.saturating_add(1);
            buf.resize(size, 0);
            return buf;
        }

        self.stats.alloc_buffers = self.stats.alloc_buffers.saturating_add(1);
        self.stats.alloc_bytes = self.stats.alloc_bytes.saturating_add(class as u64);
        let mut buf = Vec::with_capacity(class);
        buf.resize(size, 0);
        buf
    }

    /// Return a buffer to its size-class bucket.
    ///
    /// The buffer's length is reset to zero here and `get_buffer` re-extends it with zero
    /// bytes, so contents from a previous frame are never observable. Buffers outside the
    /// poolable range, beyond the bucket cap, or past the byte budget are dropped.
    pub fn recycle_buffer(&mut self, mut buf: Vec<u8>) {
        if self.opts.max_buffers_per_bucket == 0 || self.opts.max_pool_bytes == 0 {
            self.stats.dropped_on_release = self.stats.dropped_on_release.saturating_add(1);
            return;
        }

        let Some(class) = self.recyclable_class(buf.capacity()) else {
            self.stats.dropped_on_release = self.stats.dropped_on_release.saturating_add(1);
            return;
        };

        if self.stats.retained_bytes.saturating_add(buf.capacity()) > self.opts.max_pool_bytes {
            self.stats.dropped_on_release = self.stats.dropped_on_release.saturating_add(1);
            return;
        }

        let bi = match self.bucket_idx_by_class.get(&class).copied() {
            Some(i) => i,
            None => {
                let i = self.buckets.len();
                self.buckets.push(Bucket {
                    class,
                    buffers: Vec::new(),
                });
                self.bucket_idx_by_class.insert(class, i);
                i
            }
        };

        let bucket = &mut self.buckets[bi];
        if bucket.buffers.len() >= self.opts.max_buffers_per_bucket {
            self.stats.dropped_on_release = self.stats.dropped_on_release.saturating_add(1);
            return;
        }

        buf.clear();
        self.stats.retained_buffers = self.stats.retained_buffers.saturating_add(1);
        self.stats.retained_bytes = self.stats.retained_bytes.saturating_add(buf.capacity());
        bucket.buffers.push(buf);
    }

    /// Drop every retained buffer.
    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.buffers.clear();
        }
        self.buckets.clear();
        self.bucket_idx_by_class.clear();
        self.stats.retained_buffers = 0;
        self.stats.retained_bytes = 0;
    }

    /// Number of buffers parked for a given size class.
    pub fn retained_in_class(&self, class: usize) -> usize {
        self.buckets
            .iter()
            .find(|b| b.class == class)
            .map(|b| b.buffers.len())
            .unwrap_or(0)
    }

    fn poolable_class(&self, size: usize) -> Option<usize> {
        if size == 0 || size > self.opts.max_size {
            return None;
        }
        size_class(size, self.opts.min_size)
    }

    // A recycled buffer lands in the largest class its capacity can fully serve.
    fn recyclable_class(&self, capacity: usize) -> Option<usize> {
        if capacity == 0 {
            return None;
        }
        let class = 1usize << (usize::BITS - 1 - capacity.leading_zeros());
        let max_class = size_class(self.opts.max_size, self.opts.min_size)?;
        if class < self.opts.min_size || class > max_class {
            return None;
        }
        Some(class)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pool/buffer_pool.rs"]
mod tests;

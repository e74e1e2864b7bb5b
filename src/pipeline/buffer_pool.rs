use std::num::NonZeroUsize;

use lru::LruCache;
use tracing::trace;

/// Number of distinct buffer sizes kept by default.
pub const DEFAULT_POOL_CAPACITY: usize = 10;

/// Reusable byte buffers keyed by `(width, height)`.
///
/// At most `capacity` sizes are retained; returning a buffer of a new size
/// when full evicts the least recently used one.
#[derive(Debug)]
pub struct BufferPool {
    buffers: LruCache<(u32, u32), Vec<u8>>,
    allocations: usize,
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_CAPACITY)
    }
}

impl BufferPool {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            buffers: LruCache::new(capacity),
            allocations: 0,
        }
    }

    /// A zeroed buffer of `len` bytes for a `width x height` image, reused
    /// when one of that size was returned earlier.
    pub fn take(&mut self, width: u32, height: u32, len: usize) -> Vec<u8> {
        match self.buffers.pop(&(width, height)) {
            Some(mut buf) => {
                buf.clear();
                buf.resize(len, 0);
                buf
            }
            None => {
                self.allocations += 1;
                trace!(width, height, "allocating frame buffer");
                vec![0; len]
            }
        }
    }

    /// Hand a buffer back for reuse.
    pub fn recycle(&mut self, width: u32, height: u32, buf: Vec<u8>) {
        if let Some(((w, h), _)) = self.buffers.push((width, height), buf) {
            if (w, h) != (width, height) {
                trace!(w, h, "evicted frame buffer");
            }
        }
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Buffers created because nothing suitable was pooled.
    pub fn allocations(&self) -> usize {
        self.allocations
    }
}

//! Caching allocator for primitive scratch space.
//!
//! Blocks are rounded up to [`BLOCK_ROUNDING`] bytes and kept in a size-keyed
//! free pool when released, so repeated requests of similar size reuse memory
//! instead of allocating. A [`ScratchBlock`] hands its bytes back to the pool
//! when dropped, on every exit path.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{Result, SpmmError};

/// Allocation granularity in bytes.
pub const BLOCK_ROUNDING: usize = 512;

#[derive(Debug, Default)]
struct Pool {
    free: BTreeMap<usize, Vec<Box<[u8]>>>,
    bytes_in_use: usize,
    bytes_cached: usize,
    allocations: u64,
    cache_hits: u64,
}

/// Snapshot of allocator counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AllocatorStats {
    pub bytes_in_use: usize,
    pub bytes_cached: usize,
    pub allocations: u64,
    pub cache_hits: u64,
}

/// Thread-safe caching allocator. Clones share the same pool.
#[derive(Debug, Clone, Default)]
pub struct CachingAllocator {
    pool: Arc<Mutex<Pool>>,
    limit: Option<usize>,
}

fn lock(pool: &Mutex<Pool>) -> MutexGuard<'_, Pool> {
    // The pool only holds byte buffers and counters; a panic elsewhere
    // cannot leave it inconsistent.
    pool.lock().unwrap_or_else(PoisonError::into_inner)
}

impl CachingAllocator {
    /// Allocator without an upper bound.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocator that refuses to hold more than `limit` bytes in total.
    pub fn with_limit(limit: usize) -> Self {
        CachingAllocator {
            pool: Arc::default(),
            limit: Some(limit),
        }
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Allocate a scratch block of at least `size` bytes.
    ///
    /// A zero-byte request returns an empty block without touching the pool.
    ///
    /// # Errors
    /// Returns `AllocationFailed` if the request cannot be satisfied within
    /// the limit even after the cache has been released.
    pub fn allocate(&self, size: usize) -> Result<ScratchBlock> {
        if size == 0 {
            return Ok(ScratchBlock {
                data: Some(Box::default()),
                requested: 0,
                pool: None,
            });
        }
        let rounded = size.div_ceil(BLOCK_ROUNDING) * BLOCK_ROUNDING;
        let mut pool = lock(&self.pool);
        pool.allocations += 1;

        let cached = pool
            .free
            .range(rounded..)
            .next()
            .map(|(&capacity, _)| capacity);
        if let Some(capacity) = cached {
            let block = pool.free.get_mut(&capacity).and_then(|blocks| blocks.pop());
            if pool.free.get(&capacity).is_some_and(|blocks| blocks.is_empty()) {
                pool.free.remove(&capacity);
            }
            if let Some(block) = block {
                pool.cache_hits += 1;
                pool.bytes_cached -= capacity;
                pool.bytes_in_use += capacity;
                return Ok(ScratchBlock {
                    data: Some(block),
                    requested: size,
                    pool: Some(Arc::clone(&self.pool)),
                });
            }
        }

        if let Some(limit) = self.limit {
            if pool.bytes_in_use + pool.bytes_cached + rounded > limit {
                log::debug!(
                    "scratch request of {} bytes hits limit {}, releasing {} cached bytes",
                    rounded,
                    limit,
                    pool.bytes_cached
                );
                pool.free.clear();
                pool.bytes_cached = 0;
            }
            if pool.bytes_in_use + rounded > limit {
                return Err(SpmmError::AllocationFailed {
                    requested: size,
                    limit,
                });
            }
        }

        pool.bytes_in_use += rounded;
        Ok(ScratchBlock {
            data: Some(vec![0u8; rounded].into_boxed_slice()),
            requested: size,
            pool: Some(Arc::clone(&self.pool)),
        })
    }

    /// Drop every cached block.
    pub fn empty_cache(&self) {
        let mut pool = lock(&self.pool);
        pool.free.clear();
        pool.bytes_cached = 0;
    }

    pub fn stats(&self) -> AllocatorStats {
        let pool = lock(&self.pool);
        AllocatorStats {
            bytes_in_use: pool.bytes_in_use,
            bytes_cached: pool.bytes_cached,
            allocations: pool.allocations,
            cache_hits: pool.cache_hits,
        }
    }
}

/// Scratch memory on loan from a [`CachingAllocator`].
#[derive(Debug)]
pub struct ScratchBlock {
    data: Option<Box<[u8]>>,
    requested: usize,
    pool: Option<Arc<Mutex<Pool>>>,
}

impl ScratchBlock {
    /// Bytes requested by the caller.
    pub fn len(&self) -> usize {
        self.requested
    }

    pub fn is_empty(&self) -> bool {
        self.requested == 0
    }

    /// Bytes actually reserved (the rounded block size).
    pub fn capacity(&self) -> usize {
        self.data.as_ref().map_or(0, |d| d.len())
    }
}

impl Drop for ScratchBlock {
    fn drop(&mut self) {
        if let (Some(data), Some(pool)) = (self.data.take(), self.pool.as_ref()) {
            let capacity = data.len();
            let mut pool = lock(pool);
            pool.bytes_in_use -= capacity;
            pool.bytes_cached += capacity;
            pool.free.entry(capacity).or_default().push(data);
        }
    }
}

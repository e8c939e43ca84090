// src/pool/small.rs
//! Fixed-size block free-list backing the small pool tier.

use std::sync::Mutex;

/// Free-list of fixed-size byte blocks.
///
/// Grounded in the teacher's `pool::standard::BufferPool` (a single
/// `Mutex`-guarded `Vec` of buffers), generalized to plain `Vec<u8>`
/// blocks of a fixed runtime-configured size rather than the teacher's
/// `Buffer` wrapper, since this pool has no secure-erasure contract.
pub(crate) struct SmallPool {
    block_size: usize,
    free: Mutex<Vec<Vec<u8>>>,
}

impl SmallPool {
    pub(crate) fn new(block_size: usize) -> Self {
        Self {
            block_size,
            free: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn block_size(&self) -> usize {
        self.block_size
    }

    /// Pops a free block, or allocates a fresh one. Returns `true` in the
    /// second tuple element when a fresh allocation was needed (for event
    /// emission by the caller).
    pub(crate) fn acquire(&self) -> (Vec<u8>, bool) {
        let mut free = self.free.lock().unwrap();
        match free.pop() {
            Some(block) => (block, false),
            None => (vec![0u8; self.block_size], true),
        }
    }

    /// Pushes `block` onto the free list if `free_bytes + block_size <=
    /// cap` (or `cap == 0`, meaning unbounded). Returns `true` if the
    /// block was kept, `false` if it was discarded.
    pub(crate) fn try_release(&self, mut block: Vec<u8>, current_free_bytes: usize, cap: usize) -> bool {
        if cap == 0 || current_free_bytes + self.block_size <= cap {
            block.clear();
            block.resize(self.block_size, 0);
            let mut free = self.free.lock().unwrap();
            free.push(block);
            true
        } else {
            false
        }
    }

    pub(crate) fn free_count(&self) -> usize {
        self.free.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_allocates_when_empty() {
        let pool = SmallPool::new(16);
        let (block, fresh) = pool.acquire();
        assert_eq!(block.len(), 16);
        assert!(fresh);
    }

    #[test]
    fn test_release_then_acquire_reuses() {
        let pool = SmallPool::new(16);
        let (block, _) = pool.acquire();
        assert!(pool.try_release(block, 0, 0));
        assert_eq!(pool.free_count(), 1);
        let (_, fresh) = pool.acquire();
        assert!(!fresh);
        assert_eq!(pool.free_count(), 0);
    }

    #[test]
    fn test_release_discarded_over_cap() {
        let pool = SmallPool::new(16);
        let (block, _) = pool.acquire();
        assert!(!pool.try_release(block, 16, 16));
        assert_eq!(pool.free_count(), 0);
    }
}

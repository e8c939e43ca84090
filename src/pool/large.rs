// src/pool/large.rs
//! Size-classed free-lists backing the large-buffer pool tier.

use crate::config::PoolGeometry;
use std::sync::Mutex;

/// One free-list per large-buffer size class, indexed by
/// `PoolGeometry::size_class_index`.
///
/// Generalizes the teacher's `FastBufferPool`'s single-size lock-free
/// tier (`crossbeam::queue::SegQueue`) into `N` independent size
/// classes, since this pool must quantize arbitrary stream sizes rather
/// than serve one fixed buffer size.
pub(crate) struct LargePool {
    classes: Vec<crossbeam::queue::SegQueue<Vec<u8>>>,
    class_free_bytes: Vec<std::sync::atomic::AtomicUsize>,
}

impl LargePool {
    pub(crate) fn new(geometry: &PoolGeometry) -> Self {
        let n = geometry.large_pool_size_classes().max(1);
        let mut classes = Vec::with_capacity(n);
        let mut class_free_bytes = Vec::with_capacity(n);
        for _ in 0..n {
            classes.push(crossbeam::queue::SegQueue::new());
            class_free_bytes.push(std::sync::atomic::AtomicUsize::new(0));
        }
        Self {
            classes,
            class_free_bytes,
        }
    }

    /// Pops a buffer of exactly `size` bytes from its size class, or
    /// `None` if the class is empty. `size` must already be rounded to a
    /// multiple of `large_buffer_multiple` and `<= maximum_buffer_size`.
    pub(crate) fn acquire(&self, geometry: &PoolGeometry, size: usize) -> Option<Vec<u8>> {
        let idx = geometry.size_class_index(size);
        let buf = self.classes.get(idx)?.pop()?;
        self.class_free_bytes[idx].fetch_sub(size, std::sync::atomic::Ordering::SeqCst);
        Some(buf)
    }

    /// Pushes `buffer` onto its size class's free-list if
    /// `current_free_bytes + buffer.len() <= cap` (or `cap == 0`).
    /// Returns `true` if kept.
    pub(crate) fn try_release(
        &self,
        geometry: &PoolGeometry,
        mut buffer: Vec<u8>,
        current_free_bytes: usize,
        cap: usize,
    ) -> bool {
        let len = buffer.len();
        if cap != 0 && current_free_bytes + len > cap {
            return false;
        }
        let idx = geometry.size_class_index(len);
        let Some(queue) = self.classes.get(idx) else {
            return false;
        };
        buffer.clear();
        buffer.resize(len, 0);
        queue.push(buffer);
        self.class_free_bytes[idx].fetch_add(len, std::sync::atomic::Ordering::SeqCst);
        true
    }

    pub(crate) fn free_count(&self) -> usize {
        self.classes.iter().map(|q| q.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> PoolGeometry {
        PoolGeometry {
            block_size: 16384,
            large_buffer_multiple: 1_048_576,
            maximum_buffer_size: 8_388_608,
        }
    }

    #[test]
    fn test_acquire_empty_returns_none() {
        let g = geometry();
        let pool = LargePool::new(&g);
        assert!(pool.acquire(&g, g.large_buffer_multiple).is_none());
    }

    #[test]
    fn test_release_then_acquire_round_trips() {
        let g = geometry();
        let pool = LargePool::new(&g);
        let size = g.large_buffer_multiple * 2;
        let buf = vec![0u8; size];
        assert!(pool.try_release(&g, buf, 0, 0));
        assert_eq!(pool.free_count(), 1);
        let back = pool.acquire(&g, size).unwrap();
        assert_eq!(back.len(), size);
        assert_eq!(pool.free_count(), 0);
    }

    #[test]
    fn test_release_rejected_over_cap() {
        let g = geometry();
        let pool = LargePool::new(&g);
        let size = g.large_buffer_multiple;
        let buf = vec![0u8; size];
        assert!(!pool.try_release(&g, buf, size, size));
    }
}

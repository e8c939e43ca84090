// src/pool/manager.rs
//! The two-tier pool manager: `MemoryStreamManager`.

use super::large::LargePool;
use super::small::SmallPool;
use super::stats::Counters;
use crate::config::{Options, PoolGeometry};
use crate::error::{ConfigError, PoolError};
use crate::events::{Event, EventSink, NullEventSink};
use crate::stream::RecyclableMemoryStream;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Process-wide count of outstanding (not-yet-dropped) streams.
///
/// Debug-build-only leak-detection aid, per spec.md §9's guidance for
/// languages without finalizers: there is no leak in the GC sense (every
/// stream's `Drop` always returns its buffers), but a test suite or a
/// shutdown hook can assert this reaches zero to catch a stream that
/// outlived its expected scope.
#[cfg(debug_assertions)]
static DEBUG_OUTSTANDING_STREAMS: AtomicUsize = AtomicUsize::new(0);

/// Returns the current count of streams that have been handed out by any
/// `MemoryStreamManager` and not yet dropped. Debug builds only; always
/// `0` in release builds.
#[cfg(debug_assertions)]
pub fn debug_outstanding_streams() -> usize {
    DEBUG_OUTSTANDING_STREAMS.load(Ordering::SeqCst)
}

#[cfg(debug_assertions)]
pub(crate) fn debug_stream_created() {
    DEBUG_OUTSTANDING_STREAMS.fetch_add(1, Ordering::SeqCst);
}

#[cfg(debug_assertions)]
pub(crate) fn debug_stream_dropped() {
    DEBUG_OUTSTANDING_STREAMS.fetch_sub(1, Ordering::SeqCst);
}

/// Owns the small-block and large-buffer free-lists and hands out
/// [`RecyclableMemoryStream`]s backed by them.
///
/// `Send + Sync`: every mutable operation goes through a `Mutex`-guarded
/// free-list (small pool) or a lock-free `SegQueue` tier (large pool),
/// generalizing the teacher's `BufferPool`/`FastBufferPool` split from
/// one pool to two tiers sharing one manager.
pub struct MemoryStreamManager {
    pub(crate) geometry: PoolGeometry,
    pub(crate) options: Mutex<Options>,
    pub(crate) small: SmallPool,
    pub(crate) large: LargePool,
    pub(crate) counters: Counters,
    pub(crate) sink: Box<dyn EventSink>,
}

impl MemoryStreamManager {
    /// Constructs a manager with the three immutable geometry parameters
    /// and default [`Options`]. Fails with [`ConfigError`] per spec.md
    /// §4.1's `InvalidConfiguration` preconditions.
    pub fn new(
        block_size: usize,
        large_buffer_multiple: usize,
        maximum_buffer_size: usize,
    ) -> Result<Arc<Self>, ConfigError> {
        Self::with_options(
            PoolGeometry {
                block_size,
                large_buffer_multiple,
                maximum_buffer_size,
            },
            Options::default(),
        )
    }

    /// Constructs a manager from explicit `geometry` and `options`,
    /// sharing one validation path (`Options::validate`) with [`Self::new`].
    pub fn with_options(geometry: PoolGeometry, options: Options) -> Result<Arc<Self>, ConfigError> {
        options.validate(&geometry)?;
        Ok(Arc::new(Self {
            small: SmallPool::new(geometry.block_size),
            large: LargePool::new(&geometry),
            geometry,
            options: Mutex::new(options),
            counters: Counters::default(),
            sink: Box::new(NullEventSink),
        }))
    }

    /// Replaces the event sink used for lifecycle notifications.
    pub fn with_event_sink(mut self: Arc<Self>, sink: impl EventSink + 'static) -> Arc<Self> {
        match Arc::get_mut(&mut self) {
            Some(this) => this.sink = Box::new(sink),
            None => panic!("with_event_sink must be called before the manager is shared"),
        }
        self
    }

    /// The immutable construction geometry.
    pub fn geometry(&self) -> PoolGeometry {
        self.geometry
    }

    /// A snapshot copy of the current mutable options.
    pub fn options(&self) -> Options {
        self.options.lock().unwrap().clone()
    }

    /// Updates the mutable options in place. Fails with
    /// [`PoolError::InvalidConfiguration`] if `options` fails
    /// [`Options::validate`] against the manager's fixed geometry (e.g. a
    /// negative `maximum_stream_capacity`); the prior options are left
    /// untouched in that case.
    pub fn set_options(&self, options: Options) -> Result<(), PoolError> {
        options.validate(&self.geometry)?;
        *self.options.lock().unwrap() = options;
        Ok(())
    }

    /// Number of blocks currently idle in the small pool's free-list.
    pub fn small_blocks_free(&self) -> usize {
        self.small.free_count()
    }

    /// Number of buffers currently idle across all large-pool size classes.
    pub fn large_buffers_free(&self) -> usize {
        self.large.free_count()
    }

    pub(crate) fn counters(&self) -> &Counters {
        &self.counters
    }

    pub(crate) fn emit(&self, event: Event) {
        self.sink.emit(event);
    }

    /// Pops a free block or allocates a fresh one. Never fails (aside from
    /// host OOM), per spec.md §4.1.
    pub fn get_block(&self, tag: &str) -> Vec<u8> {
        let (block, fresh) = self.small.acquire();
        self.counters.add_small_in_use(self.geometry.block_size);
        if fresh {
            self.sink.emit(Event::BlockCreated {
                tag: tag.to_string(),
                actual_size: self.geometry.block_size,
                call_stack: self.capture_call_stack(),
            });
        } else {
            self.counters.sub_small_free(self.geometry.block_size);
        }
        block
    }

    /// Returns a sequence of blocks to the small pool.
    ///
    /// Fails [`PoolError::WrongSizedBuffer`] if any element's length
    /// differs from `block_size`. On success, processes blocks in
    /// iteration order, discarding (and emitting [`Event::BlockDiscarded`])
    /// any that would push free bytes past `maximum_free_small_pool_bytes`.
    pub fn return_blocks(&self, blocks: Vec<Vec<u8>>, tag: &str) -> Result<(), PoolError> {
        for block in &blocks {
            if block.len() != self.geometry.block_size {
                return Err(PoolError::WrongSizedBuffer {
                    expected: self.geometry.block_size,
                    actual: block.len(),
                });
            }
        }
        let count = blocks.len();
        self.counters
            .sub_small_in_use(self.geometry.block_size * count);

        let cap = self.options.lock().unwrap().maximum_free_small_pool_bytes;
        for block in blocks {
            let current_free = self.counters.small_pool_free_size();
            if self.small.try_release(block, current_free, cap) {
                self.counters.add_small_free(self.geometry.block_size);
                self.sink.emit(Event::BlockReturned {
                    tag: tag.to_string(),
                    actual_size: self.geometry.block_size,
                });
            } else {
                self.sink.emit(Event::BlockDiscarded {
                    tag: tag.to_string(),
                    actual_size: self.geometry.block_size,
                });
            }
        }
        Ok(())
    }

    /// Rounds `min_size` up to the next positive multiple of
    /// `large_buffer_multiple` and returns a buffer of that size, pooled
    /// if it fits within `maximum_buffer_size` and oversize (never
    /// pooled) otherwise.
    pub fn get_large_buffer(&self, min_size: usize, tag: &str) -> Vec<u8> {
        let min_size = min_size.max(1);
        let requested = self.geometry.round_to_large_buffer_multiple(min_size);
        let oversize = requested > self.geometry.maximum_buffer_size;

        let (buffer, fresh) = if oversize {
            (vec![0u8; requested], true)
        } else {
            match self.large.acquire(&self.geometry, requested) {
                Some(buf) => (buf, false),
                None => (vec![0u8; requested], true),
            }
        };
        self.counters.add_large_in_use(buffer.len());
        if fresh {
            self.sink.emit(Event::LargeBufferCreated {
                tag: tag.to_string(),
                requested_size: min_size,
                actual_size: buffer.len(),
                oversize,
                call_stack: self.capture_call_stack(),
            });
        } else {
            self.counters.sub_large_free(buffer.len());
        }
        buffer
    }

    /// Returns a large buffer to its size-class free-list.
    ///
    /// Fails [`PoolError::WrongSizedBuffer`] if `buffer` is empty or its
    /// length isn't a multiple of `large_buffer_multiple`. Oversize
    /// buffers are always discarded.
    pub fn return_large_buffer(&self, buffer: Vec<u8>, tag: &str) -> Result<(), PoolError> {
        if buffer.is_empty() || buffer.len() % self.geometry.large_buffer_multiple != 0 {
            return Err(PoolError::WrongSizedBuffer {
                expected: self.geometry.large_buffer_multiple,
                actual: buffer.len(),
            });
        }
        let len = buffer.len();
        self.counters.sub_large_in_use(len);

        if len > self.geometry.maximum_buffer_size {
            self.sink.emit(Event::LargeBufferDiscarded {
                tag: tag.to_string(),
                actual_size: len,
            });
            return Ok(());
        }

        let cap = self.options.lock().unwrap().maximum_free_large_pool_bytes;
        let current_free = self.counters.large_pool_free_size();
        if self
            .large
            .try_release(&self.geometry, buffer, current_free, cap)
        {
            self.counters.add_large_free(len);
            self.sink.emit(Event::LargeBufferReturned {
                tag: tag.to_string(),
                actual_size: len,
            });
        } else {
            self.sink.emit(Event::LargeBufferDiscarded {
                tag: tag.to_string(),
                actual_size: len,
            });
        }
        Ok(())
    }

    /// Allocates a stream with `capacity >= max(block_size, required_size)`.
    ///
    /// When `as_contiguous_large_buffer` is true and `required_size >
    /// block_size`, the stream is seeded with a single large buffer;
    /// otherwise it is seeded with the smallest number of blocks covering
    /// `required_size`.
    pub fn get_stream(
        self: &Arc<Self>,
        tag: impl Into<String>,
        required_size: usize,
        as_contiguous_large_buffer: bool,
    ) -> RecyclableMemoryStream {
        RecyclableMemoryStream::new(
            Arc::clone(self),
            tag.into(),
            required_size,
            as_contiguous_large_buffer,
        )
    }

    /// Returns a stream whose initial content is a copy of
    /// `source[offset..offset + count]`; the source slice is never
    /// retained. Position is 0, length is `count`.
    pub fn get_stream_from_bytes(
        self: &Arc<Self>,
        tag: impl Into<String>,
        source: &[u8],
        offset: usize,
        count: usize,
    ) -> Result<RecyclableMemoryStream, PoolError> {
        let slice = source
            .get(offset..offset + count)
            .ok_or(PoolError::ArgumentBounds {
                offset,
                count,
                buffer_len: source.len(),
            })?;
        let mut stream = self.get_stream(tag, count, false);
        stream.write_all_infallible(slice);
        stream
            .set_position(0)
            .expect("0 is always a valid position");
        Ok(stream)
    }

    pub(crate) fn capture_call_stack(&self) -> Option<String> {
        if self.options.lock().unwrap().generate_call_stacks {
            Some(std::backtrace::Backtrace::force_capture().to_string())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> Arc<MemoryStreamManager> {
        MemoryStreamManager::new(16384, 1_048_576, 8_388_608).unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_geometry() {
        assert!(MemoryStreamManager::new(0, 1024, 2048).is_err());
    }

    #[test]
    fn test_get_block_never_fails_and_tracks_in_use() {
        let mgr = manager();
        let block = mgr.get_block("t");
        assert_eq!(block.len(), 16384);
        assert_eq!(mgr.counters().small_pool_in_use_size(), 16384);
    }

    #[test]
    fn test_return_blocks_round_trip() {
        let mgr = manager();
        let block = mgr.get_block("t");
        mgr.return_blocks(vec![block], "t").unwrap();
        assert_eq!(mgr.small_blocks_free(), 1);
        assert_eq!(mgr.counters().small_pool_in_use_size(), 0);
    }

    #[test]
    fn test_reacquire_decrements_small_free_size() {
        let mgr = manager();
        let block = mgr.get_block("t");
        mgr.return_blocks(vec![block], "t").unwrap();
        assert_eq!(mgr.counters().small_pool_free_size(), 16384);

        let _reacquired = mgr.get_block("t");
        assert_eq!(
            mgr.counters().small_pool_free_size(),
            0,
            "popping the free block must shrink SmallPoolFreeSize, not just SmallPoolInUseSize grow"
        );
        assert_eq!(mgr.small_blocks_free(), 0);
    }

    #[test]
    fn test_return_blocks_wrong_size() {
        let mgr = manager();
        let err = mgr.return_blocks(vec![vec![0u8; 10]], "t").unwrap_err();
        assert!(matches!(err, PoolError::WrongSizedBuffer { .. }));
    }

    #[test]
    fn test_get_large_buffer_rounds_up() {
        let mgr = manager();
        let buf = mgr.get_large_buffer(1, "t");
        assert_eq!(buf.len(), 1_048_576);
    }

    #[test]
    fn test_get_large_buffer_oversize_never_pooled() {
        let mgr = manager();
        let buf = mgr.get_large_buffer(9_000_000, "t");
        assert_eq!(buf.len(), 9_437_184); // next multiple of 1_048_576
        mgr.return_large_buffer(buf, "t").unwrap();
        assert_eq!(mgr.large_buffers_free(), 0);
    }

    #[test]
    fn test_return_large_buffer_round_trip() {
        let mgr = manager();
        let buf = mgr.get_large_buffer(1, "t");
        mgr.return_large_buffer(buf, "t").unwrap();
        assert_eq!(mgr.large_buffers_free(), 1);
        assert_eq!(mgr.counters().large_pool_in_use_size(), 0);
    }

    #[test]
    fn test_reacquire_decrements_large_free_size() {
        let mgr = manager();
        let buf = mgr.get_large_buffer(1, "t");
        mgr.return_large_buffer(buf, "t").unwrap();
        assert_eq!(mgr.counters().large_pool_free_size(), 1_048_576);

        let _reacquired = mgr.get_large_buffer(1, "t");
        assert_eq!(
            mgr.counters().large_pool_free_size(),
            0,
            "popping the free buffer must shrink LargePoolFreeSize, not just LargePoolInUseSize grow"
        );
        assert_eq!(mgr.large_buffers_free(), 0);
    }

    #[test]
    fn test_return_large_buffer_wrong_size() {
        let mgr = manager();
        let err = mgr.return_large_buffer(vec![0u8; 3], "t").unwrap_err();
        assert!(matches!(err, PoolError::WrongSizedBuffer { .. }));
    }

    #[test]
    fn test_get_stream_from_bytes_out_of_bounds() {
        let mgr = manager();
        let err = mgr
            .get_stream_from_bytes("t", &[1, 2, 3], 1, 10)
            .unwrap_err();
        assert!(matches!(err, PoolError::ArgumentBounds { .. }));
    }
}

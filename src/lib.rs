// src/lib.rs
//! # Pooled memory-stream allocator
//!
//! A two-tier buffer pool — fixed-size blocks for small streams,
//! size-classed large buffers for bigger ones — backing a recyclable,
//! seekable `std::io::{Read, Write, Seek}` stream view. Built to avoid
//! the GC pressure of repeated large-array allocation in high-throughput
//! serialization and network I/O paths.
//!
//! Features:
//! - Thread-safe pool manager (`Send + Sync`); single-threaded stream view
//! - Two free-list tiers: fixed blocks and size-classed large buffers
//! - One-way promotion from block-chain to contiguous large-buffer backing
//! - Pluggable `EventSink` for allocation/return/discard/leak notifications
//! - Aggressive or passive buffer release policy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod events;
pub mod pool;
pub mod stream;

pub use config::{Options, PoolGeometry};
pub use error::{ConfigError, PoolError, Result};
pub use events::{Event, EventSink, NullEventSink, TracingEventSink};
pub use pool::MemoryStreamManager;
pub use stream::{RecyclableMemoryStream, SeekOrigin, MAX_STREAM_SIZE};

#[cfg(debug_assertions)]
pub use pool::debug_outstanding_streams;

/// Internal counter accessors exposed only so the integration test suite
/// under `tests/` can observe pool-internal state; not part of the
/// supported public API.
#[doc(hidden)]
pub mod test_support {
    use crate::pool::MemoryStreamManager;

    /// Current `SmallPoolInUseSize`.
    pub fn small_pool_in_use_size(manager: &MemoryStreamManager) -> usize {
        manager.counters().small_pool_in_use_size()
    }

    /// Current `SmallPoolFreeSize`.
    pub fn small_pool_free_size(manager: &MemoryStreamManager) -> usize {
        manager.counters().small_pool_free_size()
    }

    /// Current `LargePoolInUseSize`.
    pub fn large_pool_in_use_size(manager: &MemoryStreamManager) -> usize {
        manager.counters().large_pool_in_use_size()
    }

    /// Current `LargePoolFreeSize`.
    pub fn large_pool_free_size(manager: &MemoryStreamManager) -> usize {
        manager.counters().large_pool_free_size()
    }
}

/// Commonly used imports.
pub mod prelude {
    pub use crate::config::{Options, PoolGeometry};
    pub use crate::error::{ConfigError, PoolError, Result};
    pub use crate::events::{Event, EventSink, NullEventSink, TracingEventSink};
    pub use crate::pool::MemoryStreamManager;
    pub use crate::stream::{RecyclableMemoryStream, SeekOrigin, MAX_STREAM_SIZE};
}

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use std::io::{Read, Seek, SeekFrom, Write};

    #[test]
    fn test_basic_stream_round_trip() {
        let manager = MemoryStreamManager::new(16384, 1_048_576, 8_388_608).unwrap();
        let mut stream = manager.get_stream("test", 0, false);
        stream.write_all(b"hello").unwrap();
        stream.seek(SeekFrom::Start(0)).unwrap();
        let mut out = Vec::new();
        stream.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"hello");
    }

    #[test]
    fn test_manager_rejects_bad_geometry() {
        assert!(MemoryStreamManager::new(0, 1024, 2048).is_err());
    }

    #[test]
    fn test_blocks_returned_on_drop() {
        let manager = MemoryStreamManager::new(16384, 1_048_576, 8_388_608).unwrap();
        assert_eq!(manager.small_blocks_free(), 0);
        {
            let mut stream = manager.get_stream("test", 0, false);
            stream.write_all(b"x").unwrap();
        }
        assert_eq!(manager.small_blocks_free(), 1);
    }

    #[test]
    fn test_get_stream_from_bytes_copies_source() {
        let manager = MemoryStreamManager::new(16384, 1_048_576, 8_388_608).unwrap();
        let source = b"seed content".to_vec();
        let mut stream = manager
            .get_stream_from_bytes("test", &source, 0, source.len())
            .unwrap();
        assert_eq!(stream.len(), source.len() as i64);
        assert_eq!(stream.position(), 0, "position must reset to 0 after seeding");
        let mut out = vec![0u8; source.len()];
        stream.read_exact(&mut out).unwrap();
        assert_eq!(out, source);
    }
}

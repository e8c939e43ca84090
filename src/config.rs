// src/config.rs
//! Construction-time geometry and mutable runtime options for a
//! [`crate::pool::MemoryStreamManager`].

use crate::error::ConfigError;

/// The three immutable parameters that define a pool's size geometry.
///
/// Chosen once at construction and never mutated afterward: block size,
/// large-buffer size-class quantum, and the maximum size a large buffer
/// (or stream capacity) may grow to before it is no longer pooled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolGeometry {
    /// Size in bytes of each fixed-size small-pool block.
    pub block_size: usize,
    /// Quantum in bytes for large-buffer size classes.
    pub large_buffer_multiple: usize,
    /// Largest buffer size the large pool will track; buffers above this
    /// are allocated and freed directly without ever entering a free list.
    pub maximum_buffer_size: usize,
}

impl PoolGeometry {
    /// `block_size = 16384`, `large_buffer_multiple = 1048576`,
    /// `maximum_buffer_size = 8388608` — the parameters spec.md's S1-S7
    /// scenarios exercise.
    pub fn standard() -> Self {
        Self {
            block_size: 16 * 1024,
            large_buffer_multiple: 1024 * 1024,
            maximum_buffer_size: 8 * 1024 * 1024,
        }
    }

    /// The number of large-buffer size classes, `maximum_buffer_size / large_buffer_multiple`.
    pub fn large_pool_size_classes(&self) -> usize {
        self.maximum_buffer_size / self.large_buffer_multiple
    }

    /// The zero-based size-class index a buffer of `len` bytes belongs to.
    ///
    /// Panics if `len` is zero; callers are expected to have already
    /// rejected that case via [`Options::validate`].
    pub fn size_class_index(&self, len: usize) -> usize {
        debug_assert!(len > 0);
        len.div_ceil(self.large_buffer_multiple).saturating_sub(1)
    }

    /// Rounds `requested` up to the next multiple of `large_buffer_multiple`.
    pub fn round_to_large_buffer_multiple(&self, requested: usize) -> usize {
        let m = self.large_buffer_multiple;
        requested.div_ceil(m) * m
    }
}

/// Mutable, post-construction-tunable options for a `MemoryStreamManager`.
///
/// Unlike [`PoolGeometry`], these may be changed after the manager is
/// built (guarded by interior mutability on the manager side).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Ceiling on total bytes held free in the small-block pool; blocks
    /// returned past this ceiling are dropped instead of pooled.
    pub maximum_free_small_pool_bytes: usize,
    /// Ceiling on total bytes held free in the large-buffer pool.
    pub maximum_free_large_pool_bytes: usize,
    /// Ceiling on a single stream's capacity; exceeding it on write/grow
    /// returns [`ConfigError`]'s operational counterpart, `PoolError::CapacityExceeded`.
    pub maximum_stream_capacity: i64,
    /// When `true`, streams return their backing buffers to the pool as
    /// soon as they shrink below a block/large-buffer boundary rather
    /// than waiting for `dispose`.
    pub aggressive_buffer_return: bool,
    /// When `true`, allocation/acquisition events record a captured
    /// backtrace for diagnostic `Event`s (expensive; off by default).
    pub generate_call_stacks: bool,
    /// When `true`, `get_large_buffer` rounds the requested size up to
    /// the next power-of-two multiple of `large_buffer_multiple` instead
    /// of the next plain multiple.
    pub use_exponential_large_buffer_growth: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            maximum_free_small_pool_bytes: 0,
            maximum_free_large_pool_bytes: 0,
            maximum_stream_capacity: i32::MAX as i64,
            aggressive_buffer_return: false,
            generate_call_stacks: false,
            use_exponential_large_buffer_growth: false,
        }
    }
}

impl Options {
    /// Validates `geometry` against the invariants of spec.md §4.1's
    /// `InvalidConfiguration` preconditions. Centralizes the checks shared
    /// by `MemoryStreamManager::new` and `::with_options`.
    pub fn validate(&self, geometry: &PoolGeometry) -> Result<(), ConfigError> {
        if geometry.block_size == 0 {
            return Err(ConfigError::InvalidBlockSize(geometry.block_size));
        }
        if geometry.large_buffer_multiple == 0 {
            return Err(ConfigError::InvalidLargeBufferMultiple(
                geometry.large_buffer_multiple,
            ));
        }
        if geometry.maximum_buffer_size < geometry.block_size {
            return Err(ConfigError::MaximumBufferSizeTooSmall {
                maximum_buffer_size: geometry.maximum_buffer_size,
                block_size: geometry.block_size,
            });
        }
        if geometry.maximum_buffer_size % geometry.large_buffer_multiple != 0 {
            return Err(ConfigError::MaximumBufferSizeNotAMultiple {
                maximum_buffer_size: geometry.maximum_buffer_size,
                large_buffer_multiple: geometry.large_buffer_multiple,
            });
        }
        if self.maximum_stream_capacity < 0 {
            return Err(ConfigError::NegativeMaximumStreamCapacity(
                self.maximum_stream_capacity,
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_geometry_matches_scenarios() {
        let g = PoolGeometry::standard();
        assert_eq!(g.block_size, 16384);
        assert_eq!(g.large_buffer_multiple, 1_048_576);
        assert_eq!(g.maximum_buffer_size, 8_388_608);
        assert_eq!(g.large_pool_size_classes(), 8);
    }

    #[test]
    fn test_size_class_index() {
        let g = PoolGeometry::standard();
        assert_eq!(g.size_class_index(1), 0);
        assert_eq!(g.size_class_index(1_048_576), 0);
        assert_eq!(g.size_class_index(1_048_577), 1);
    }

    #[test]
    fn test_round_to_large_buffer_multiple() {
        let g = PoolGeometry::standard();
        assert_eq!(g.round_to_large_buffer_multiple(1), g.large_buffer_multiple);
        assert_eq!(
            g.round_to_large_buffer_multiple(g.large_buffer_multiple),
            g.large_buffer_multiple
        );
    }

    #[test]
    fn test_validate_rejects_zero_block_size() {
        let geometry = PoolGeometry {
            block_size: 0,
            ..PoolGeometry::standard()
        };
        let err = Options::default().validate(&geometry).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBlockSize(0)));
    }

    #[test]
    fn test_validate_rejects_max_smaller_than_block() {
        let geometry = PoolGeometry {
            maximum_buffer_size: 100,
            block_size: 16384,
            large_buffer_multiple: 1024,
        };
        let err = Options::default().validate(&geometry).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MaximumBufferSizeTooSmall { .. }
        ));
    }

    #[test]
    fn test_validate_rejects_non_multiple() {
        let geometry = PoolGeometry {
            block_size: 1024,
            large_buffer_multiple: 1000,
            maximum_buffer_size: 8192,
        };
        let err = Options::default().validate(&geometry).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MaximumBufferSizeNotAMultiple { .. }
        ));
    }

    #[test]
    fn test_validate_rejects_negative_maximum_stream_capacity() {
        let geometry = PoolGeometry::standard();
        let options = Options {
            maximum_stream_capacity: -1,
            ..Options::default()
        };
        let err = options.validate(&geometry).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::NegativeMaximumStreamCapacity(-1)
        ));
    }
}

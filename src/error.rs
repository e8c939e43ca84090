// src/error.rs
//! Error types for the pool and stream APIs.

use thiserror::Error;

/// Errors that can occur when constructing a [`crate::pool::MemoryStreamManager`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// `block_size` was zero.
    #[error("block_size must be >= 1, got {0}")]
    InvalidBlockSize(usize),
    /// `large_buffer_multiple` was zero.
    #[error("large_buffer_multiple must be >= 1, got {0}")]
    InvalidLargeBufferMultiple(usize),
    /// `maximum_buffer_size` is smaller than `block_size`.
    #[error("maximum_buffer_size ({maximum_buffer_size}) must be >= block_size ({block_size})")]
    MaximumBufferSizeTooSmall {
        /// The configured maximum buffer size.
        maximum_buffer_size: usize,
        /// The configured block size.
        block_size: usize,
    },
    /// `maximum_buffer_size` is not a multiple of `large_buffer_multiple`.
    #[error(
        "maximum_buffer_size ({maximum_buffer_size}) must be a multiple of large_buffer_multiple ({large_buffer_multiple})"
    )]
    MaximumBufferSizeNotAMultiple {
        /// The configured maximum buffer size.
        maximum_buffer_size: usize,
        /// The configured large buffer multiple.
        large_buffer_multiple: usize,
    },
    /// `maximum_stream_capacity` was negative.
    #[error("maximum_stream_capacity must be >= 0, got {0}")]
    NegativeMaximumStreamCapacity(i64),
}

/// Errors that can occur during pool or stream operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// Wraps a [`ConfigError`] surfaced through an operational call site —
    /// `MemoryStreamManager::set_options` re-validates the new options
    /// against the manager's fixed geometry before installing them.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),
    /// A negative or out-of-range length/position/count was supplied.
    #[error("out of range: {0}")]
    OutOfRange(&'static str),
    /// `offset + count` exceeds the caller-supplied buffer.
    #[error("argument bounds: offset {offset} + count {count} exceeds buffer length {buffer_len}")]
    ArgumentBounds {
        /// The requested offset into the caller's buffer.
        offset: usize,
        /// The requested count of bytes.
        count: usize,
        /// The caller's buffer length.
        buffer_len: usize,
    },
    /// An array returned to the pool has a length that isn't a valid pool size.
    #[error("wrong sized buffer: expected {expected}, got {actual}")]
    WrongSizedBuffer {
        /// The size the pool expected.
        expected: usize,
        /// The size actually supplied.
        actual: usize,
    },
    /// An unknown seek origin was supplied.
    #[error("invalid seek origin")]
    InvalidOrigin,
    /// A seek computed a target position before the start of the stream.
    #[error("seek before begin: target position {0} is negative")]
    SeekBeforeBegin(i64),
    /// A write would push `length` beyond the maximum representable stream length.
    #[error("stream overflow: write would exceed maximum stream length")]
    StreamOverflow,
    /// Setting capacity (or growing it via write) would exceed the configured ceiling.
    #[error("capacity exceeded: requested {requested}, maximum {maximum}")]
    CapacityExceeded {
        /// The capacity that was requested.
        requested: i64,
        /// The configured `maximum_stream_capacity`.
        maximum: i64,
    },
    /// The stream has already been disposed.
    #[error("stream has been disposed")]
    Disposed,
}

/// Result type alias for pool/stream operations.
pub type Result<T> = std::result::Result<T, PoolError>;

impl From<PoolError> for std::io::Error {
    fn from(err: PoolError) -> Self {
        use std::io::ErrorKind;
        match err {
            PoolError::StreamOverflow | PoolError::CapacityExceeded { .. } => {
                std::io::Error::new(ErrorKind::WriteZero, err)
            }
            PoolError::SeekBeforeBegin(_)
            | PoolError::InvalidOrigin
            | PoolError::OutOfRange(_)
            | PoolError::ArgumentBounds { .. }
            | PoolError::WrongSizedBuffer { .. } => {
                std::io::Error::new(ErrorKind::InvalidInput, err)
            }
            PoolError::Disposed | PoolError::InvalidConfiguration(_) => {
                std::io::Error::new(ErrorKind::Other, err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidBlockSize(0);
        assert!(err.to_string().contains("block_size"));
    }

    #[test]
    fn test_pool_error_to_io_error() {
        let err = PoolError::StreamOverflow;
        let io_err: std::io::Error = err.into();
        assert_eq!(io_err.kind(), std::io::ErrorKind::WriteZero);
    }

    #[test]
    fn test_seek_before_begin_to_io_error() {
        let err = PoolError::SeekBeforeBegin(-5);
        let io_err: std::io::Error = err.into();
        assert_eq!(io_err.kind(), std::io::ErrorKind::InvalidInput);
    }
}

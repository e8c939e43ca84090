// src/stream/core.rs
//! Struct definition, construction, and dispose lifecycle for
//! `RecyclableMemoryStream`.

use crate::error::PoolError;
use crate::events::Event;
use crate::pool::MemoryStreamManager;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Process-wide monotonic counter backing each stream's opaque `id`.
static NEXT_STREAM_ID: AtomicU64 = AtomicU64::new(1);

fn next_stream_id() -> u128 {
    NEXT_STREAM_ID.fetch_add(1, Ordering::SeqCst) as u128
}

/// How a stream's content is currently backed.
pub(super) enum Backing {
    /// A chain of fixed-size blocks from the small pool.
    Blocks(Vec<Vec<u8>>),
    /// A single contiguous large buffer from the large pool.
    Large(Vec<u8>),
}

/// A seekable, readable, writable byte stream backed by pooled buffers.
///
/// Not `Sync`: all methods that touch content take `&mut self`, which is
/// the idiomatic-Rust rendering of spec.md §5's "owned by a single thread
/// at a time" — no explicit negative trait impl is required.
///
/// Backing starts as a chain of [`Backing::Blocks`] and may promote
/// one-way to [`Backing::Large`] (see `growth.rs`); it never demotes.
pub struct RecyclableMemoryStream {
    pub(super) id: u128,
    pub(super) manager: Arc<MemoryStreamManager>,
    pub(super) tag: String,
    pub(super) backing: Backing,
    /// Buffers retained (not yet returned) from a promotion or large-buffer
    /// regrowth performed under passive release policy.
    pub(super) retained_blocks: Vec<Vec<u8>>,
    pub(super) old_large_buffers: Vec<Vec<u8>>,
    pub(super) length: i64,
    pub(super) position: i64,
    pub(super) disposed: bool,
}

/// Largest representable stream length/position/capacity, mirroring the
/// `2^31 - 1` bound spec.md inherits from the CLR `int` it was modeled on.
pub const MAX_STREAM_SIZE: i64 = i32::MAX as i64;

impl RecyclableMemoryStream {
    pub(crate) fn new(
        manager: Arc<MemoryStreamManager>,
        tag: String,
        required_size: usize,
        as_contiguous_large_buffer: bool,
    ) -> Self {
        let block_size = manager.geometry().block_size;
        let required_size = required_size.max(block_size);

        let backing = if as_contiguous_large_buffer && required_size > block_size {
            Backing::Large(manager.get_large_buffer(required_size, &tag))
        } else {
            let n_blocks = required_size.div_ceil(block_size);
            let mut blocks = Vec::with_capacity(n_blocks);
            for _ in 0..n_blocks {
                blocks.push(manager.get_block(&tag));
            }
            Backing::Blocks(blocks)
        };

        let requested_size = required_size;
        let actual_size = match &backing {
            Backing::Blocks(blocks) => blocks.len() * block_size,
            Backing::Large(buf) => buf.len(),
        };

        manager.emit(Event::StreamCreated {
            tag: tag.clone(),
            requested_size,
            actual_size,
            call_stack: manager.capture_call_stack(),
        });

        #[cfg(debug_assertions)]
        crate::pool::debug_stream_created();

        Self {
            id: next_stream_id(),
            manager,
            tag,
            backing,
            retained_blocks: Vec::new(),
            old_large_buffers: Vec::new(),
            length: 0,
            position: 0,
            disposed: false,
        }
    }

    /// The opaque, process-wide unique identifier assigned at construction.
    pub fn id(&self) -> u128 {
        self.id
    }

    /// The diagnostic tag this stream was created with.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Current backing capacity in bytes.
    pub fn capacity(&self) -> i64 {
        match &self.backing {
            Backing::Blocks(blocks) => (blocks.len() * self.manager.geometry().block_size) as i64,
            Backing::Large(buf) => buf.len() as i64,
        }
    }

    /// Current logical length in bytes.
    pub fn len(&self) -> i64 {
        self.length
    }

    /// Whether the stream's logical length is zero.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Current read/write cursor position.
    pub fn position(&self) -> i64 {
        self.position
    }

    /// Sets the cursor position. Fails [`PoolError::OutOfRange`] for
    /// negative values or values beyond [`MAX_STREAM_SIZE`]. Setting
    /// beyond `length` is allowed and does not grow `length`.
    pub fn set_position(&mut self, value: i64) -> Result<(), PoolError> {
        self.check_not_disposed()?;
        if !(0..=MAX_STREAM_SIZE).contains(&value) {
            return Err(PoolError::OutOfRange("position"));
        }
        self.position = value;
        Ok(())
    }

    /// Always `true` before dispose, per spec.md §4.2.
    pub fn can_read(&self) -> bool {
        !self.disposed
    }

    /// Always `true` before dispose, per spec.md §4.2.
    pub fn can_seek(&self) -> bool {
        !self.disposed
    }

    /// Always `true` before dispose, per spec.md §4.2.
    pub fn can_write(&self) -> bool {
        !self.disposed
    }

    /// Always `false`: cancellation/timeouts are not supported.
    pub fn can_timeout(&self) -> bool {
        false
    }

    pub(super) fn check_not_disposed(&self) -> Result<(), PoolError> {
        if self.disposed {
            Err(PoolError::Disposed)
        } else {
            Ok(())
        }
    }

    /// Returns an owned copy of the logical content, `[0, length)`.
    /// Does not mutate backing or trigger promotion.
    pub fn to_vec(&self) -> Result<Vec<u8>, PoolError> {
        self.check_not_disposed()?;
        let len = self.length as usize;
        let mut out = Vec::with_capacity(len);
        match &self.backing {
            Backing::Blocks(blocks) => {
                let block_size = self.manager.geometry().block_size;
                let mut remaining = len;
                for block in blocks {
                    if remaining == 0 {
                        break;
                    }
                    let take = remaining.min(block_size);
                    out.extend_from_slice(&block[..take]);
                    remaining -= take;
                }
            }
            Backing::Large(buf) => out.extend_from_slice(&buf[..len]),
        }
        Ok(out)
    }

    /// Writes the logical content, `[0, length)`, to `writer`.
    pub fn write_to<W: std::io::Write>(&self, writer: &mut W) -> std::io::Result<()> {
        if self.disposed {
            return Err(PoolError::Disposed.into());
        }
        writer.write_all(&self.to_vec().map_err(std::io::Error::from)?)
    }

    /// Idempotent explicit dispose: returns all backing buffers to the
    /// pool. A second call emits [`Event::DoubleDispose`] and is a no-op.
    pub fn close(&mut self) {
        if self.disposed {
            self.manager.emit(Event::DoubleDispose {
                tag: self.tag.clone(),
                call_stack: self.manager.capture_call_stack(),
            });
            return;
        }
        self.return_all_buffers();
        self.disposed = true;
        self.manager.emit(Event::StreamDisposed {
            tag: self.tag.clone(),
            actual_size: self.length as usize,
            call_stack: self.manager.capture_call_stack(),
        });
        #[cfg(debug_assertions)]
        crate::pool::debug_stream_dropped();
    }

    pub(super) fn return_all_buffers(&mut self) {
        let block_size = self.manager.geometry().block_size;
        let backing = std::mem::replace(&mut self.backing, Backing::Blocks(Vec::new()));
        match backing {
            Backing::Blocks(blocks) => {
                if !blocks.is_empty() {
                    debug_assert!(blocks.iter().all(|b| b.len() == block_size));
                    let _ = self.manager.return_blocks(blocks, &self.tag);
                }
            }
            Backing::Large(buf) => {
                let _ = self.manager.return_large_buffer(buf, &self.tag);
            }
        }
        if !self.retained_blocks.is_empty() {
            let blocks = std::mem::take(&mut self.retained_blocks);
            let _ = self.manager.return_blocks(blocks, &self.tag);
        }
        for buf in std::mem::take(&mut self.old_large_buffers) {
            let _ = self.manager.return_large_buffer(buf, &self.tag);
        }
    }

    pub(crate) fn write_all_infallible(&mut self, data: &[u8]) {
        use std::io::Write;
        self.write_all(data).expect("growing a fresh stream from a bounded slice cannot fail");
    }
}

impl Drop for RecyclableMemoryStream {
    fn drop(&mut self) {
        if !self.disposed {
            self.manager.emit(Event::StreamFinalizedWithoutDispose {
                tag: self.tag.clone(),
                call_stack: self.manager.capture_call_stack(),
            });
            self.return_all_buffers();
            self.disposed = true;
            #[cfg(debug_assertions)]
            crate::pool::debug_stream_dropped();
        }
    }
}

impl std::fmt::Debug for RecyclableMemoryStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecyclableMemoryStream")
            .field("id", &self.id)
            .field("tag", &self.tag)
            .field("length", &self.length)
            .field("position", &self.position)
            .field("capacity", &self.capacity())
            .field("disposed", &self.disposed)
            .finish()
    }
}

impl std::fmt::Display for RecyclableMemoryStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "RecyclableMemoryStream(id={}, tag={}, length={})",
            self.id, self.tag, self.length
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::pool::MemoryStreamManager;

    #[test]
    fn test_id_is_unique_per_stream() {
        let mgr = MemoryStreamManager::new(16384, 1_048_576, 8_388_608).unwrap();
        let a = mgr.get_stream("a", 0, false);
        let b = mgr.get_stream("b", 0, false);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_debug_and_display_contain_id_tag_length() {
        let mgr = MemoryStreamManager::new(16384, 1_048_576, 8_388_608).unwrap();
        let stream = mgr.get_stream("debugtag", 0, false);
        let debug = format!("{:?}", stream);
        let display = stream.to_string();
        for s in [debug, display] {
            assert!(s.contains(&stream.id().to_string()));
            assert!(s.contains("debugtag"));
            assert!(s.contains(&stream.len().to_string()));
        }
    }
}

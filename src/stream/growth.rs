// src/stream/growth.rs
//! Capacity growth and the one-way blocks-to-large-buffer promotion.

use super::core::{Backing, RecyclableMemoryStream, MAX_STREAM_SIZE};
use crate::error::PoolError;

impl RecyclableMemoryStream {
    /// Sets capacity. Rounds `value` up to a valid capacity (a multiple of
    /// `block_size` while block-backed, of `large_buffer_multiple` while
    /// large-backed). A request below the current capacity is a no-op.
    /// Fails [`PoolError::CapacityExceeded`] (state unchanged) if the
    /// rounded request exceeds `maximum_stream_capacity`.
    pub fn set_capacity(&mut self, value: i64) -> Result<(), PoolError> {
        self.check_not_disposed()?;
        if value < 0 {
            return Err(PoolError::OutOfRange("capacity"));
        }
        if value <= self.capacity() {
            return Ok(());
        }
        self.grow_to(value as usize)
    }

    /// Ensures backing capacity is at least `target` bytes, promoting
    /// block-backed storage to a large buffer when required by the
    /// decided promotion rule: `target` exceeds one block's capacity, or
    /// capacity is already set above one block.
    pub(super) fn grow_to(&mut self, target: usize) -> Result<(), PoolError> {
        let geometry = self.manager.geometry();
        let block_size = geometry.block_size;

        match &self.backing {
            Backing::Blocks(_) if target <= block_size && self.capacity() as usize <= block_size => {
                Ok(())
            }
            Backing::Blocks(_) => self.promote_to_large(target),
            Backing::Large(_) => self.grow_large(target),
        }
    }

    /// Adds blocks (without promoting) until capacity covers `target`.
    /// Used by `write` while still block-backed and `target` does not
    /// cross the promotion threshold.
    pub(super) fn grow_blocks(&mut self, target: usize) -> Result<(), PoolError> {
        let max_cap = self.max_capacity_bytes()?;
        if target > max_cap {
            return Err(PoolError::CapacityExceeded {
                requested: target as i64,
                maximum: max_cap as i64,
            });
        }
        let block_size = self.manager.geometry().block_size;
        let Backing::Blocks(blocks) = &mut self.backing else {
            return Ok(());
        };
        while blocks.len() * block_size < target {
            blocks.push(self.manager.get_block(&self.tag));
        }
        Ok(())
    }

    fn promote_to_large(&mut self, target: usize) -> Result<(), PoolError> {
        let requested = self.manager.geometry().round_to_large_buffer_multiple(target);
        let max_cap = self.max_capacity_bytes()?;
        if requested > max_cap {
            return Err(PoolError::CapacityExceeded {
                requested: requested as i64,
                maximum: max_cap as i64,
            });
        }

        let content = self.to_vec()?;
        let mut new_buf = self.manager.get_large_buffer(requested, &self.tag);
        new_buf[..content.len()].copy_from_slice(&content);

        let old_backing = std::mem::replace(&mut self.backing, Backing::Large(new_buf));
        let Backing::Blocks(old_blocks) = old_backing else {
            unreachable!("promote_to_large only called while block-backed")
        };

        if self.aggressive_buffer_return() {
            let _ = self.manager.return_blocks(old_blocks, &self.tag);
        } else {
            self.retained_blocks.extend(old_blocks);
        }
        Ok(())
    }

    fn grow_large(&mut self, target: usize) -> Result<(), PoolError> {
        let requested = self.manager.geometry().round_to_large_buffer_multiple(target);
        let max_cap = self.max_capacity_bytes()?;
        if requested > max_cap {
            return Err(PoolError::CapacityExceeded {
                requested: requested as i64,
                maximum: max_cap as i64,
            });
        }

        let Backing::Large(old_buf) = &self.backing else {
            return Ok(());
        };
        if old_buf.len() >= requested {
            return Ok(());
        }

        let content_len = self.length as usize;
        let mut new_buf = self.manager.get_large_buffer(requested, &self.tag);
        let old_backing = std::mem::replace(&mut self.backing, Backing::Large(Vec::new()));
        let Backing::Large(old_buf) = old_backing else {
            unreachable!()
        };
        new_buf[..content_len].copy_from_slice(&old_buf[..content_len]);
        self.backing = Backing::Large(new_buf);

        if self.aggressive_buffer_return() {
            let _ = self.manager.return_large_buffer(old_buf, &self.tag);
        } else {
            self.old_large_buffers.push(old_buf);
        }
        Ok(())
    }

    fn aggressive_buffer_return(&self) -> bool {
        self.manager.options().aggressive_buffer_return
    }

    /// The effective capacity ceiling: `maximum_stream_capacity` when set
    /// (> 0), else [`MAX_STREAM_SIZE`].
    pub(super) fn max_capacity_bytes(&self) -> Result<usize, PoolError> {
        let configured = self.manager.options().maximum_stream_capacity;
        let ceiling = if configured > 0 {
            configured.min(MAX_STREAM_SIZE)
        } else {
            MAX_STREAM_SIZE
        };
        Ok(ceiling as usize)
    }

    /// Ensures a contiguous view is possible, promoting from blocks to a
    /// large buffer when content spans more than one block (or capacity
    /// was already set above one block) — the decided resolution of
    /// spec.md §9's promotion-threshold open question.
    /// Returns the full backing array (length equal to `capacity()`, not
    /// `length()`), per the contract that the returned reference spans at
    /// least the logical content — callers read `[0, length())` of it.
    pub fn get_buffer(&mut self) -> Result<&[u8], PoolError> {
        self.check_not_disposed()?;
        let block_size = self.manager.geometry().block_size;
        let should_promote = matches!(&self.backing, Backing::Blocks(_))
            && (self.length as usize > block_size || self.capacity() as usize > block_size);
        if should_promote {
            self.promote_to_large(self.length.max(1) as usize)?;
        }
        match &self.backing {
            Backing::Blocks(blocks) => Ok(&blocks[0][..]),
            Backing::Large(buf) => Ok(&buf[..]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::MemoryStreamManager;
    use std::io::Write;

    fn manager() -> std::sync::Arc<MemoryStreamManager> {
        MemoryStreamManager::new(16384, 1_048_576, 8_388_608).unwrap()
    }

    #[test]
    fn test_single_block_get_buffer_no_promotion() {
        let mgr = manager();
        let mut stream = mgr.get_stream("t", 0, false);
        stream.write_all(&[1, 2, 3]).unwrap();
        let buf = stream.get_buffer().unwrap();
        assert_eq!(buf.len(), 16384);
        assert_eq!(&buf[..3], &[1, 2, 3]);
        assert_eq!(stream.capacity(), 16384);
    }

    #[test]
    fn test_get_buffer_promotes_past_one_block() {
        let mgr = manager();
        let mut stream = mgr.get_stream("t", 0, false);
        let data = vec![7u8; 20_000];
        stream.write_all(&data).unwrap();
        let buf = stream.get_buffer().unwrap();
        assert_eq!(buf.len(), 1_048_576);
        assert_eq!(&buf[..20_000], &data[..]);
        assert_eq!(stream.capacity(), 1_048_576);
    }

    #[test]
    fn test_set_capacity_rounds_up() {
        let mgr = manager();
        let mut stream = mgr.get_stream("t", 0, false);
        stream.set_capacity(1).unwrap();
        assert_eq!(stream.capacity(), 16384);
    }

    #[test]
    fn test_set_capacity_below_current_is_noop() {
        let mgr = manager();
        let mut stream = mgr.get_stream("t", 0, false);
        let before = stream.capacity();
        stream.set_capacity(1).unwrap();
        assert_eq!(stream.capacity(), before);
    }

    #[test]
    fn test_set_capacity_exceeds_maximum() {
        let mgr = manager();
        let mut opts = mgr.options();
        opts.maximum_stream_capacity = 16384;
        mgr.set_options(opts).unwrap();
        let mut stream = mgr.get_stream("t", 0, false);
        let err = stream.set_capacity(100_000).unwrap_err();
        assert!(matches!(err, PoolError::CapacityExceeded { .. }));
    }
}

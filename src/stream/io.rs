// src/stream/io.rs
//! Inherent read/write/seek and the `std::io::{Read,Write,Seek}` adapters.
//!
//! The inherent methods surface spec.md's exact error taxonomy
//! (`error::PoolError`); the trait impls are thin adapters converting
//! `PoolError` into `std::io::Error`, mirroring the teacher's
//! `BufferError -> std::io::Error` conversion in `error.rs`.

use super::core::{Backing, RecyclableMemoryStream, MAX_STREAM_SIZE};
use crate::error::PoolError;

/// Where a [`RecyclableMemoryStream::seek`] offset is measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekOrigin {
    /// Offset from the start of the stream.
    Begin,
    /// Offset from the current position.
    Current,
    /// Offset from the end (logical length) of the stream.
    End,
}

impl RecyclableMemoryStream {
    /// Writes `data` at the current position, growing capacity/length as
    /// needed. Fails [`PoolError::StreamOverflow`] if the write would push
    /// `length` beyond [`MAX_STREAM_SIZE`], or
    /// [`PoolError::CapacityExceeded`] if required capacity exceeds
    /// `maximum_stream_capacity`. No state is mutated before validation.
    pub fn write(&mut self, data: &[u8]) -> Result<usize, PoolError> {
        self.check_not_disposed()?;
        if data.is_empty() {
            return Ok(0);
        }
        let target_end = self
            .position
            .checked_add(data.len() as i64)
            .ok_or(PoolError::StreamOverflow)?;
        if target_end > MAX_STREAM_SIZE {
            return Err(PoolError::StreamOverflow);
        }

        let target_end_usize = target_end as usize;
        if target_end_usize > self.capacity() as usize {
            match &self.backing {
                Backing::Blocks(_) => self.grow_blocks(target_end_usize)?,
                Backing::Large(_) => self.grow_large(target_end_usize)?,
            }
        }

        self.write_bytes_at(self.position as usize, data);
        self.position = target_end;
        self.length = self.length.max(target_end);
        Ok(data.len())
    }

    /// Writes a single byte at the current position.
    pub fn write_byte(&mut self, byte: u8) -> Result<(), PoolError> {
        self.write(std::slice::from_ref(&byte)).map(|_| ())
    }

    /// Reads up to `buf.len()` bytes starting at the current position.
    /// Returns the number of bytes read (0 at end of stream).
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, PoolError> {
        self.check_not_disposed()?;
        let avail = (self.length - self.position).max(0) as usize;
        let n = buf.len().min(avail);
        if n > 0 {
            self.read_bytes_at(self.position as usize, &mut buf[..n]);
            self.position += n as i64;
        }
        Ok(n)
    }

    /// Reads a single byte, or `None` at end of stream.
    pub fn read_byte(&mut self) -> Result<Option<u8>, PoolError> {
        let mut b = [0u8; 1];
        let n = self.read(&mut b)?;
        Ok(if n == 0 { None } else { Some(b[0]) })
    }

    /// Moves the cursor. Fails [`PoolError::SeekBeforeBegin`] if the
    /// computed target is negative, [`PoolError::OutOfRange`] if it
    /// exceeds [`MAX_STREAM_SIZE`]. Returns the new position.
    pub fn seek(&mut self, origin: SeekOrigin, offset: i64) -> Result<i64, PoolError> {
        self.check_not_disposed()?;
        let target = match origin {
            SeekOrigin::Begin => offset,
            SeekOrigin::Current => self.position + offset,
            SeekOrigin::End => self.length + offset,
        };
        if target < 0 {
            return Err(PoolError::SeekBeforeBegin(target));
        }
        if target > MAX_STREAM_SIZE {
            return Err(PoolError::OutOfRange("seek target"));
        }
        self.position = target;
        Ok(target)
    }

    /// Sets the logical length. Fails [`PoolError::OutOfRange`] if `v < 0`
    /// or `v > `[`MAX_STREAM_SIZE`]. Grows capacity as needed; if
    /// `position > v`, clamps `position = v`.
    pub fn set_len(&mut self, v: i64) -> Result<(), PoolError> {
        self.check_not_disposed()?;
        if !(0..=MAX_STREAM_SIZE).contains(&v) {
            return Err(PoolError::OutOfRange("length"));
        }
        if v as usize > self.capacity() as usize {
            match &self.backing {
                Backing::Blocks(_) => self.grow_blocks(v as usize)?,
                Backing::Large(_) => self.grow_large(v as usize)?,
            }
        }
        self.length = v;
        if self.position > v {
            self.position = v;
        }
        Ok(())
    }

    fn write_bytes_at(&mut self, pos: usize, data: &[u8]) {
        match &mut self.backing {
            Backing::Blocks(blocks) => {
                let bs = self.manager_block_size();
                let mut written = 0usize;
                let mut cursor = pos;
                while written < data.len() {
                    let block_idx = cursor / bs;
                    let offset = cursor % bs;
                    let chunk_len = (bs - offset).min(data.len() - written);
                    blocks[block_idx][offset..offset + chunk_len]
                        .copy_from_slice(&data[written..written + chunk_len]);
                    written += chunk_len;
                    cursor += chunk_len;
                }
            }
            Backing::Large(buf) => {
                buf[pos..pos + data.len()].copy_from_slice(data);
            }
        }
    }

    fn read_bytes_at(&self, pos: usize, out: &mut [u8]) {
        match &self.backing {
            Backing::Blocks(blocks) => {
                let bs = self.manager_block_size();
                let mut read = 0usize;
                let mut cursor = pos;
                while read < out.len() {
                    let block_idx = cursor / bs;
                    let offset = cursor % bs;
                    let chunk_len = (bs - offset).min(out.len() - read);
                    out[read..read + chunk_len]
                        .copy_from_slice(&blocks[block_idx][offset..offset + chunk_len]);
                    read += chunk_len;
                    cursor += chunk_len;
                }
            }
            Backing::Large(buf) => {
                out.copy_from_slice(&buf[pos..pos + out.len()]);
            }
        }
    }

    fn manager_block_size(&self) -> usize {
        self.manager.geometry().block_size
    }
}

impl std::io::Read for RecyclableMemoryStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        RecyclableMemoryStream::read(self, buf).map_err(Into::into)
    }
}

impl std::io::Write for RecyclableMemoryStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        RecyclableMemoryStream::write(self, buf).map_err(Into::into)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl std::io::Seek for RecyclableMemoryStream {
    fn seek(&mut self, pos: std::io::SeekFrom) -> std::io::Result<u64> {
        let (origin, offset) = match pos {
            std::io::SeekFrom::Start(n) => (SeekOrigin::Begin, n as i64),
            std::io::SeekFrom::Current(n) => (SeekOrigin::Current, n),
            std::io::SeekFrom::End(n) => (SeekOrigin::End, n),
        };
        RecyclableMemoryStream::seek(self, origin, offset)
            .map(|p| p as u64)
            .map_err(Into::into)
    }
}

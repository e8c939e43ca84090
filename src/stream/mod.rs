// src/stream/mod.rs
//! The stream view: a seekable, readable, writable byte stream backed by
//! pooled blocks or a large buffer.

mod core;
mod growth;
mod io;

pub use self::core::{RecyclableMemoryStream, MAX_STREAM_SIZE};
pub use self::io::SeekOrigin;

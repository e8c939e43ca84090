// src/events.rs
//! Event notifications emitted by the pool and stream views, and the
//! sinks that consume them.

/// One lifecycle notification emitted by a [`crate::pool::MemoryStreamManager`]
/// or [`crate::stream::RecyclableMemoryStream`].
///
/// Every variant carries `tag`, `requested_size`, `actual_size` per
/// spec.md §4.3; `call_stack` is populated only when
/// [`crate::config::Options::generate_call_stacks`] is enabled.
#[derive(Debug, Clone)]
pub enum Event {
    /// A new stream was handed out by the pool.
    StreamCreated {
        /// The caller-supplied diagnostic tag.
        tag: String,
        /// The initial requested capacity.
        requested_size: usize,
        /// The resulting initial capacity.
        actual_size: usize,
        /// Captured call stack, if enabled.
        call_stack: Option<String>,
    },
    /// A stream was disposed (first call only).
    StreamDisposed {
        /// The stream's diagnostic tag.
        tag: String,
        /// The stream's length at time of dispose.
        actual_size: usize,
        /// Captured call stack, if enabled.
        call_stack: Option<String>,
    },
    /// A small-pool block was freshly allocated (pool had none free).
    BlockCreated {
        /// The caller-supplied diagnostic tag.
        tag: String,
        /// The configured block size.
        actual_size: usize,
        /// Captured call stack, if enabled.
        call_stack: Option<String>,
    },
    /// A block was returned to the small pool's free list.
    BlockReturned {
        /// The caller-supplied diagnostic tag.
        tag: String,
        /// The configured block size.
        actual_size: usize,
    },
    /// A block return was discarded because the free-pool byte cap was hit.
    BlockDiscarded {
        /// The caller-supplied diagnostic tag.
        tag: String,
        /// The configured block size.
        actual_size: usize,
    },
    /// A large buffer was allocated. `oversize` is true when the buffer
    /// exceeds `maximum_buffer_size` and will never be pooled.
    LargeBufferCreated {
        /// The caller-supplied diagnostic tag.
        tag: String,
        /// The size the caller asked for.
        requested_size: usize,
        /// The size actually allocated (rounded to a size-class multiple).
        actual_size: usize,
        /// Whether this buffer exceeds the pool's tracked ceiling.
        oversize: bool,
        /// Captured call stack, if enabled.
        call_stack: Option<String>,
    },
    /// A large buffer was returned to its size-class free list.
    LargeBufferReturned {
        /// The caller-supplied diagnostic tag.
        tag: String,
        /// The buffer's length.
        actual_size: usize,
    },
    /// A large buffer return was discarded (oversize, or free-pool cap hit).
    LargeBufferDiscarded {
        /// The caller-supplied diagnostic tag.
        tag: String,
        /// The buffer's length.
        actual_size: usize,
    },
    /// `dispose`/`close` was called a second time on an already-disposed stream.
    DoubleDispose {
        /// The stream's diagnostic tag.
        tag: String,
        /// Captured call stack, if enabled.
        call_stack: Option<String>,
    },
    /// A stream was dropped without ever being explicitly disposed.
    ///
    /// Rust streams always return their buffers on `Drop` regardless (see
    /// `DESIGN.md`'s leak-detection note), so this marks a *missed
    /// deterministic return*, not a true resource leak.
    StreamFinalizedWithoutDispose {
        /// The stream's diagnostic tag.
        tag: String,
        /// Captured call stack, if enabled.
        call_stack: Option<String>,
    },
}

impl Event {
    /// The diagnostic tag carried by every event variant.
    pub fn tag(&self) -> &str {
        match self {
            Event::StreamCreated { tag, .. }
            | Event::StreamDisposed { tag, .. }
            | Event::BlockCreated { tag, .. }
            | Event::BlockReturned { tag, .. }
            | Event::BlockDiscarded { tag, .. }
            | Event::LargeBufferCreated { tag, .. }
            | Event::LargeBufferReturned { tag, .. }
            | Event::LargeBufferDiscarded { tag, .. }
            | Event::DoubleDispose { tag, .. }
            | Event::StreamFinalizedWithoutDispose { tag, .. } => tag,
        }
    }
}

/// Opaque notification target for pool and stream lifecycle events.
///
/// Implementations must not block or panic; the pool calls `emit` while
/// holding no lock of its own but callers invoking this from inside a
/// hot path should keep it cheap.
pub trait EventSink: Send + Sync {
    /// Consume one lifecycle event.
    fn emit(&self, event: Event);
}

/// Zero-cost default sink: discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    #[inline]
    fn emit(&self, _event: Event) {}
}

/// Forwards each [`Event`] to `tracing`, at a level matched to severity:
/// `debug` for routine allocate/return traffic, `warn` for discards,
/// double-dispose, and finalization-without-dispose.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: Event) {
        match &event {
            Event::StreamCreated {
                tag,
                requested_size,
                actual_size,
                ..
            } => {
                tracing::debug!(tag, requested_size, actual_size, "stream created");
            }
            Event::StreamDisposed { tag, actual_size, .. } => {
                tracing::debug!(tag, actual_size, "stream disposed");
            }
            Event::BlockCreated { tag, actual_size, .. } => {
                tracing::debug!(tag, actual_size, "block created");
            }
            Event::BlockReturned { tag, actual_size } => {
                tracing::debug!(tag, actual_size, "block returned");
            }
            Event::BlockDiscarded { tag, actual_size } => {
                tracing::warn!(tag, actual_size, "block discarded");
            }
            Event::LargeBufferCreated {
                tag,
                requested_size,
                actual_size,
                oversize,
                ..
            } => {
                tracing::debug!(
                    tag,
                    requested_size,
                    actual_size,
                    oversize,
                    "large buffer created"
                );
            }
            Event::LargeBufferReturned { tag, actual_size } => {
                tracing::debug!(tag, actual_size, "large buffer returned");
            }
            Event::LargeBufferDiscarded { tag, actual_size } => {
                tracing::warn!(tag, actual_size, "large buffer discarded");
            }
            Event::DoubleDispose { tag, .. } => {
                tracing::warn!(tag, "double dispose");
            }
            Event::StreamFinalizedWithoutDispose { tag, .. } => {
                tracing::warn!(tag, "stream finalized without dispose");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingSink(Arc<AtomicUsize>);

    impl EventSink for CountingSink {
        fn emit(&self, _event: Event) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_null_sink_is_noop() {
        let sink = NullEventSink;
        sink.emit(Event::BlockCreated {
            tag: "t".into(),
            actual_size: 16384,
            call_stack: None,
        });
    }

    #[test]
    fn test_custom_sink_counts_events() {
        let counter = Arc::new(AtomicUsize::new(0));
        let sink = CountingSink(counter.clone());
        sink.emit(Event::DoubleDispose {
            tag: "t".into(),
            call_stack: None,
        });
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_tracing_sink_does_not_panic() {
        let sink = TracingEventSink;
        sink.emit(Event::LargeBufferCreated {
            tag: "t".into(),
            requested_size: 100,
            actual_size: 1_048_576,
            oversize: false,
            call_stack: None,
        });
    }

    #[test]
    fn test_event_tag_accessor() {
        let event = Event::BlockReturned {
            tag: "abc".into(),
            actual_size: 16384,
        };
        assert_eq!(event.tag(), "abc");
    }
}

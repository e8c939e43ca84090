// src/pool/stats.rs
//! Atomic counters tracked by a `MemoryStreamManager`, per spec.md §4.1's
//! concurrency requirement that the four pool counters stay observably
//! consistent with free-list/in-use membership after any single operation.

use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Default)]
pub(crate) struct Counters {
    small_pool_in_use_size: AtomicUsize,
    small_pool_free_size: AtomicUsize,
    large_pool_in_use_size: AtomicUsize,
    large_pool_free_size: AtomicUsize,
}

impl Counters {
    pub(crate) fn small_pool_in_use_size(&self) -> usize {
        self.small_pool_in_use_size.load(Ordering::SeqCst)
    }

    pub(crate) fn small_pool_free_size(&self) -> usize {
        self.small_pool_free_size.load(Ordering::SeqCst)
    }

    pub(crate) fn large_pool_in_use_size(&self) -> usize {
        self.large_pool_in_use_size.load(Ordering::SeqCst)
    }

    pub(crate) fn large_pool_free_size(&self) -> usize {
        self.large_pool_free_size.load(Ordering::SeqCst)
    }

    pub(crate) fn add_small_in_use(&self, n: usize) {
        self.small_pool_in_use_size.fetch_add(n, Ordering::SeqCst);
    }

    pub(crate) fn sub_small_in_use(&self, n: usize) {
        self.small_pool_in_use_size.fetch_sub(n, Ordering::SeqCst);
    }

    pub(crate) fn add_small_free(&self, n: usize) {
        self.small_pool_free_size.fetch_add(n, Ordering::SeqCst);
    }

    pub(crate) fn sub_small_free(&self, n: usize) {
        self.small_pool_free_size.fetch_sub(n, Ordering::SeqCst);
    }

    pub(crate) fn add_large_in_use(&self, n: usize) {
        self.large_pool_in_use_size.fetch_add(n, Ordering::SeqCst);
    }

    pub(crate) fn sub_large_in_use(&self, n: usize) {
        self.large_pool_in_use_size.fetch_sub(n, Ordering::SeqCst);
    }

    pub(crate) fn add_large_free(&self, n: usize) {
        self.large_pool_free_size.fetch_add(n, Ordering::SeqCst);
    }

    pub(crate) fn sub_large_free(&self, n: usize) {
        self.large_pool_free_size.fetch_sub(n, Ordering::SeqCst);
    }
}

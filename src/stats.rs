//! Run statistics
//!
//! Counters are bumped inside the buffer's critical section but stored as
//! atomics so they can be read at any time without taking the lock.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Shared run statistics
#[derive(Debug, Default)]
pub struct RunStats {
    pub produced: AtomicUsize,
    pub consumed: AtomicUsize,
    pub producer_waits: AtomicUsize,
    pub consumer_waits: AtomicUsize,
    pub broadcasts: AtomicUsize,
    pub peak_size: AtomicUsize,
}

impl RunStats {
    pub(crate) fn record_produced(&self, curr_size: usize) {
        self.produced.fetch_add(1, Ordering::Relaxed);
        self.peak_size.fetch_max(curr_size, Ordering::Relaxed);
    }

    pub(crate) fn record_consumed(&self) {
        self.consumed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_producer_wait(&self) {
        self.producer_waits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_consumer_wait(&self) {
        self.consumer_waits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_broadcast(&self) {
        self.broadcasts.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a point-in-time copy of the counters
    pub fn view(&self) -> RunStatsView {
        RunStatsView {
            produced: self.produced.load(Ordering::Relaxed),
            consumed: self.consumed.load(Ordering::Relaxed),
            producer_waits: self.producer_waits.load(Ordering::Relaxed),
            consumer_waits: self.consumer_waits.load(Ordering::Relaxed),
            broadcasts: self.broadcasts.load(Ordering::Relaxed),
            peak_size: self.peak_size.load(Ordering::Relaxed),
        }
    }
}

/// Run statistics view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStatsView {
    pub produced: usize,
    pub consumed: usize,
    pub producer_waits: usize,
    pub consumer_waits: usize,
    pub broadcasts: usize,
    pub peak_size: usize,
}

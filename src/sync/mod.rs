//! Lock and condition variables around the shared buffer
//!
//! `SharedState` is the only way to reach a [`SharedBuffer`]. It owns the
//! single mutex and the two condition variables the protocol needs:
//! "room available" (producers wait on it while the buffer is full) and
//! "item available" (consumers wait on it while the buffer is empty).

pub mod termination;

pub use termination::Phase;

use crate::buffer::{DrainOrder, SharedBuffer};
use crate::stats::RunStats;
use crate::Result;
use parking_lot::{Condvar, Mutex, MutexGuard};

/// Shared state handed by reference to every producer and consumer
pub struct SharedState {
    /// The buffer and its counters
    buffer: Mutex<SharedBuffer>,
    /// Signalled when a consumer frees a slot
    room_available: Condvar,
    /// Signalled when a producer inserts an item
    item_available: Condvar,
    /// Run statistics
    stats: RunStats,
}

impl SharedState {
    /// Create the shared state for one run
    pub fn new(total_items: usize, max_buf_size: usize, order: DrainOrder) -> Result<Self> {
        Ok(Self {
            buffer: Mutex::new(SharedBuffer::new(max_buf_size, total_items, order)?),
            room_available: Condvar::new(),
            item_available: Condvar::new(),
            stats: RunStats::default(),
        })
    }

    /// Acquire the buffer lock
    pub fn lock(&self) -> MutexGuard<'_, SharedBuffer> {
        self.buffer.lock()
    }

    /// Get run statistics
    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Current termination phase
    pub fn phase(&self) -> Phase {
        Phase::of(&self.lock())
    }

    /// Release the lock, sleep until "room available" is signalled, reacquire.
    ///
    /// Wakeups carry no guarantee; callers re-check their predicate.
    pub(crate) fn wait_for_room(&self, guard: &mut MutexGuard<'_, SharedBuffer>) {
        self.stats.record_producer_wait();
        self.room_available.wait(guard);
    }

    /// Release the lock, sleep until "item available" is signalled, reacquire.
    pub(crate) fn wait_for_item(&self, guard: &mut MutexGuard<'_, SharedBuffer>) {
        self.stats.record_consumer_wait();
        self.item_available.wait(guard);
    }

    pub(crate) fn signal_room_available(&self) {
        self.room_available.notify_one();
    }

    pub(crate) fn signal_item_available(&self) {
        self.item_available.notify_one();
    }

    pub(crate) fn broadcast_room_available(&self) -> usize {
        self.stats.record_broadcast();
        self.room_available.notify_all()
    }

    pub(crate) fn broadcast_item_available(&self) -> usize {
        self.stats.record_broadcast();
        self.item_available.notify_all()
    }

    /// Tear the run down early.
    ///
    /// Every loop treats an aborted state as terminal, so all blocked
    /// threads wake and exit. Only used when the pool cannot field its full
    /// set of threads.
    pub fn abort(&self) {
        self.lock().abort();
        self.broadcast_room_available();
        self.broadcast_item_available();
        log::warn!("Run aborted, waking all blocked threads");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_new_state_is_producing() {
        let state = SharedState::new(5, 2, DrainOrder::Lifo).unwrap();
        assert_eq!(state.phase(), Phase::Producing);
        assert_eq!(state.lock().curr_size(), 0);
    }

    #[test]
    fn test_empty_target_is_done() {
        let state = SharedState::new(0, 2, DrainOrder::Lifo).unwrap();
        assert_eq!(state.phase(), Phase::Done);
    }

    #[test]
    fn test_abort_wakes_waiter() {
        let state = SharedState::new(5, 1, DrainOrder::Lifo).unwrap();

        thread::scope(|s| {
            let waiter = s.spawn(|| {
                let mut guard = state.lock();
                while !guard.is_aborted() {
                    state.wait_for_item(&mut guard);
                }
            });

            thread::sleep(Duration::from_millis(20));
            state.abort();
            waiter.join().unwrap();
        });

        assert!(state.lock().is_aborted());
        assert!(state.stats().view().broadcasts >= 2);
    }
}

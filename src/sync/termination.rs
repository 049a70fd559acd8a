//! Termination handshake
//!
//! The run moves through three phases that are fully determined by the two
//! counters in [`SharedBuffer`]:
//!
//! ```text
//! Producing  next_to_produce <  total_items
//! Draining   next_to_produce == total_items, curr_size > 0
//! Done       next_to_produce == total_items, curr_size == 0
//! ```
//!
//! Once a thread observes that it may exit, it wakes every thread blocked on
//! the conditions others could still be sleeping on. Without that broadcast
//! a thread could sleep on a condition whose last signaller already left.

use super::SharedState;
use crate::buffer::SharedBuffer;

/// Termination phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Producing,
    Draining,
    Done,
}

impl Phase {
    /// Derive the phase from the buffer counters
    pub fn of(buffer: &SharedBuffer) -> Self {
        if !buffer.production_complete() {
            Phase::Producing
        } else if !buffer.is_empty() {
            Phase::Draining
        } else {
            Phase::Done
        }
    }
}

/// A producer sleeps only while the buffer is full and there is still
/// something left to produce.
#[inline]
pub(crate) fn producer_must_wait(buffer: &SharedBuffer) -> bool {
    buffer.is_full() && !buffer.production_complete() && !buffer.is_aborted()
}

#[inline]
pub(crate) fn producer_may_exit(buffer: &SharedBuffer) -> bool {
    buffer.production_complete() || buffer.is_aborted()
}

/// A consumer sleeps only while the buffer is empty and more items are coming.
#[inline]
pub(crate) fn consumer_must_wait(buffer: &SharedBuffer) -> bool {
    buffer.is_empty() && !buffer.production_complete() && !buffer.is_aborted()
}

#[inline]
pub(crate) fn consumer_may_exit(buffer: &SharedBuffer) -> bool {
    (buffer.is_empty() && buffer.production_complete()) || buffer.is_aborted()
}

/// Called by a producer after it released the lock for the last time.
///
/// Consumers blocked on an empty buffer re-check and see production is
/// complete; producers blocked on a full buffer do the same.
pub(crate) fn producer_exit(state: &SharedState, producer_id: usize) {
    let consumers = state.broadcast_item_available();
    let producers = state.broadcast_room_available();
    log::debug!(
        "master {} done producing, woke {} workers and {} masters",
        producer_id,
        consumers,
        producers
    );
}

/// Called by a consumer after it released the lock for the last time.
pub(crate) fn consumer_exit(state: &SharedState, consumer_id: usize) {
    let consumers = state.broadcast_item_available();
    log::debug!(
        "worker {} found nothing left, woke {} workers",
        consumer_id,
        consumers
    );
}

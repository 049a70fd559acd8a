//! Producer (master) loop

use crate::observer::Observer;
use crate::sync::{termination, SharedState};

/// Loop run by one producer thread
pub struct ProducerLoop<'a, O: ?Sized> {
    /// Producer ID
    id: usize,
    state: &'a SharedState,
    observer: &'a O,
}

impl<'a, O: Observer + ?Sized> ProducerLoop<'a, O> {
    /// Create a producer loop
    pub fn new(id: usize, state: &'a SharedState, observer: &'a O) -> Self {
        Self {
            id,
            state,
            observer,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Produce until every index has been claimed.
    ///
    /// Returns the number of items this producer inserted.
    pub fn run(&self) -> usize {
        let mut produced = 0;

        loop {
            let mut buffer = self.state.lock();

            while termination::producer_must_wait(&buffer) {
                log::trace!("master {} waiting for room {}", self.id, *buffer);
                self.state.wait_for_room(&mut buffer);
            }

            if termination::producer_may_exit(&buffer) {
                drop(buffer);
                termination::producer_exit(self.state, self.id);
                return produced;
            }

            let item = buffer.claim_and_push();
            self.state.stats().record_produced(buffer.curr_size());
            self.observer.on_produced(item, self.id);
            produced += 1;

            self.state.signal_item_available();
        }
    }
}

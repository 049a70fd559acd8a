//! Consumer (worker) loop

use crate::observer::Observer;
use crate::sync::{termination, SharedState};

/// Loop run by one consumer thread
pub struct ConsumerLoop<'a, O: ?Sized> {
    /// Consumer ID
    id: usize,
    state: &'a SharedState,
    observer: &'a O,
}

impl<'a, O: Observer + ?Sized> ConsumerLoop<'a, O> {
    /// Create a consumer loop
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

    /// Consume until production is complete and the buffer is drained.
    ///
    /// Returns the number of items this consumer removed.
    pub fn run(&self) -> usize {
        let mut consumed = 0;

        loop {
            let mut buffer = self.state.lock();

            while termination::consumer_must_wait(&buffer) {
                log::trace!("worker {} waiting for items {}", self.id, *buffer);
                self.state.wait_for_item(&mut buffer);
            }

            if termination::consumer_may_exit(&buffer) {
                drop(buffer);
                termination::consumer_exit(self.state, self.id);
                return consumed;
            }

            let item = buffer.take();
            self.state.stats().record_consumed();
            self.observer.on_consumed(item, self.id);
            consumed += 1;

            self.state.signal_room_available();
        }
    }
}

//! Observation callbacks for produced and consumed items
//!
//! Observers are invoked while the buffer lock is held, so the sequence of
//! callbacks matches the order of buffer operations. An observer must not
//! block for long and must not touch the shared state.

use crate::buffer::Item;
use crate::{Error, Result};
use log::Level;
use parking_lot::Mutex;

/// Receives one call per successful insertion and per successful removal
pub trait Observer: Sync {
    /// Called after `producer_id` inserted `value`
    fn on_produced(&self, value: Item, producer_id: usize);

    /// Called after `consumer_id` removed `value`
    fn on_consumed(&self, value: Item, consumer_id: usize);
}

/// Observer that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl Observer for NullObserver {
    fn on_produced(&self, _value: Item, _producer_id: usize) {}

    fn on_consumed(&self, _value: Item, _consumer_id: usize) {}
}

/// Observer printing one line per event to stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct PrintObserver;

impl Observer for PrintObserver {
    fn on_produced(&self, value: Item, producer_id: usize) {
        println!("Produced {} by master {}", value, producer_id);
    }

    fn on_consumed(&self, value: Item, consumer_id: usize) {
        println!("Consumed {} by worker {}", value, consumer_id);
    }
}

/// Observer forwarding events to the `log` facade
#[derive(Debug, Clone, Copy)]
pub struct LogObserver {
    level: Level,
}

impl LogObserver {
    pub fn new(level: Level) -> Self {
        Self { level }
    }
}

impl Default for LogObserver {
    fn default() -> Self {
        Self::new(Level::Trace)
    }
}

impl Observer for LogObserver {
    fn on_produced(&self, value: Item, producer_id: usize) {
        log::log!(self.level, "Produced {} by master {}", value, producer_id);
    }

    fn on_consumed(&self, value: Item, consumer_id: usize) {
        log::log!(self.level, "Consumed {} by worker {}", value, consumer_id);
    }
}

/// A single observed event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Produced { value: Item, producer: usize },
    Consumed { value: Item, consumer: usize },
}

/// Observer keeping every event in order, for checking a finished run
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<Event>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// All events in the order they happened
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn produced_values(&self) -> Vec<Item> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                Event::Produced { value, .. } => Some(*value),
                Event::Consumed { .. } => None,
            })
            .collect()
    }

    pub fn consumed_values(&self) -> Vec<Item> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                Event::Consumed { value, .. } => Some(*value),
                Event::Produced { .. } => None,
            })
            .collect()
    }

    /// Check that both produced and consumed values are exactly
    /// `0..total_items`, each once.
    pub fn verify_complete(&self, total_items: usize) -> Result<()> {
        let produced = self.produced_values();
        let consumed = self.consumed_values();

        if produced.len() != total_items || consumed.len() != total_items {
            return Err(Error::Incomplete {
                expected: total_items,
                produced: produced.len(),
                consumed: consumed.len(),
            });
        }

        for (what, values) in [("produced", produced), ("consumed", consumed)] {
            if !is_sequence(values) {
                return Err(Error::PoolError(format!(
                    "{} values are not a permutation of 0..{}",
                    what, total_items
                )));
            }
        }

        Ok(())
    }
}

fn is_sequence(mut values: Vec<Item>) -> bool {
    values.sort_unstable();
    values.iter().enumerate().all(|(i, v)| i == *v)
}

impl Observer for RecordingObserver {
    fn on_produced(&self, value: Item, producer_id: usize) {
        self.events.lock().push(Event::Produced {
            value,
            producer: producer_id,
        });
    }

    fn on_consumed(&self, value: Item, consumer_id: usize) {
        self.events.lock().push(Event::Consumed {
            value,
            consumer: consumer_id,
        });
    }
}

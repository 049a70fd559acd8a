//! Bounded item storage shared between producers and consumers
//!
//! `SharedBuffer` has no synchronization of its own. It is only ever reached
//! through the lock held by [`crate::SharedState`], so every method here runs
//! inside a critical section.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

/// An item is its production sequence number
pub type Item = usize;

/// End of the buffer consumers take from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrainOrder {
    /// Most recently produced first
    #[default]
    Lifo,
    /// Oldest first
    Fifo,
}

impl fmt::Display for DrainOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrainOrder::Lifo => write!(f, "lifo"),
            DrainOrder::Fifo => write!(f, "fifo"),
        }
    }
}

impl FromStr for DrainOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "lifo" | "stack" => Ok(DrainOrder::Lifo),
            "fifo" | "queue" => Ok(DrainOrder::Fifo),
            other => Err(Error::InvalidConfig(format!(
                "unknown drain order '{}', expected lifo or fifo",
                other
            ))),
        }
    }
}

/// Fixed-capacity buffer plus the production counter
#[derive(Debug)]
pub struct SharedBuffer {
    /// Items currently buffered; `items.len()` is the current size
    items: VecDeque<Item>,
    /// Maximum number of buffered items
    capacity: usize,
    /// Number of items the run produces in total
    total_items: usize,
    /// Next production index to hand out
    next_to_produce: usize,
    /// Removal end
    order: DrainOrder,
    /// Set when the run is torn down early
    aborted: bool,
}

impl SharedBuffer {
    /// Create an empty buffer. Storage for `capacity` items is allocated up front.
    pub fn new(capacity: usize, total_items: usize, order: DrainOrder) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidConfig(
                "buffer capacity must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
            total_items,
            next_to_produce: 0,
            order,
            aborted: false,
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of items currently buffered
    #[inline]
    pub fn curr_size(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.items.len() == self.capacity
    }

    #[inline]
    pub fn total_items(&self) -> usize {
        self.total_items
    }

    #[inline]
    pub fn next_to_produce(&self) -> usize {
        self.next_to_produce
    }

    #[inline]
    pub fn order(&self) -> DrainOrder {
        self.order
    }

    /// True once every production index has been handed out
    #[inline]
    pub fn production_complete(&self) -> bool {
        self.next_to_produce >= self.total_items
    }

    #[inline]
    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    pub(crate) fn abort(&mut self) {
        self.aborted = true;
    }

    /// Claim the next production index and append it.
    ///
    /// # Panics
    ///
    /// Panics if the buffer is full or production is already complete.
    /// Callers check both under the lock first, so either one firing means
    /// the locking protocol is broken.
    pub fn claim_and_push(&mut self) -> Item {
        assert!(!self.is_full(), "buffer overflow: push into a full buffer");
        assert!(
            !self.production_complete(),
            "production index {} claimed past total {}",
            self.next_to_produce,
            self.total_items
        );

        let item = self.next_to_produce;
        self.items.push_back(item);
        self.next_to_produce += 1;
        item
    }

    /// Remove one item from the configured end.
    ///
    /// # Panics
    ///
    /// Panics if the buffer is empty.
    pub fn take(&mut self) -> Item {
        let taken = match self.order {
            DrainOrder::Lifo => self.items.pop_back(),
            DrainOrder::Fifo => self.items.pop_front(),
        };

        match taken {
            Some(item) => item,
            None => panic!("buffer underflow: take from an empty buffer"),
        }
    }
}

impl fmt::Display for SharedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}/{} buffered, next {} of {}]",
            self.curr_size(),
            self.capacity,
            self.next_to_produce,
            self.total_items
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(matches!(
            SharedBuffer::new(0, 10, DrainOrder::Lifo),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_claim_advances_counters() {
        let mut buf = SharedBuffer::new(3, 5, DrainOrder::Lifo).unwrap();
        assert!(buf.is_empty());

        assert_eq!(buf.claim_and_push(), 0);
        assert_eq!(buf.claim_and_push(), 1);
        assert_eq!(buf.curr_size(), 2);
        assert_eq!(buf.next_to_produce(), 2);
        assert!(!buf.production_complete());
    }

    #[test]
    fn test_lifo_takes_newest() {
        let mut buf = SharedBuffer::new(3, 3, DrainOrder::Lifo).unwrap();
        for _ in 0..3 {
            buf.claim_and_push();
        }
        assert!(buf.is_full());
        assert!(buf.production_complete());

        assert_eq!(buf.take(), 2);
        assert_eq!(buf.take(), 1);
        assert_eq!(buf.take(), 0);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_fifo_takes_oldest() {
        let mut buf = SharedBuffer::new(2, 4, DrainOrder::Fifo).unwrap();
        buf.claim_and_push();
        buf.claim_and_push();
        assert_eq!(buf.take(), 0);
        buf.claim_and_push();
        assert_eq!(buf.take(), 1);
        assert_eq!(buf.take(), 2);
    }

    #[test]
    #[should_panic(expected = "buffer overflow")]
    fn test_push_into_full_panics() {
        let mut buf = SharedBuffer::new(1, 5, DrainOrder::Lifo).unwrap();
        buf.claim_and_push();
        buf.claim_and_push();
    }

    #[test]
    #[should_panic(expected = "claimed past total")]
    fn test_claim_past_total_panics() {
        let mut buf = SharedBuffer::new(4, 1, DrainOrder::Lifo).unwrap();
        buf.claim_and_push();
        buf.claim_and_push();
    }

    #[test]
    #[should_panic(expected = "buffer underflow")]
    fn test_take_from_empty_panics() {
        let mut buf = SharedBuffer::new(1, 1, DrainOrder::Fifo).unwrap();
        buf.take();
    }

    #[test]
    fn test_drain_order_parse() {
        assert_eq!("LIFO".parse::<DrainOrder>().unwrap(), DrainOrder::Lifo);
        assert_eq!("queue".parse::<DrainOrder>().unwrap(), DrainOrder::Fifo);
        assert!("random".parse::<DrainOrder>().is_err());
        assert_eq!(DrainOrder::Fifo.to_string(), "fifo");
    }
}

//! Per-thread producer and consumer loops

pub mod consumer;
pub mod producer;

pub use consumer::ConsumerLoop;
pub use producer::ProducerLoop;

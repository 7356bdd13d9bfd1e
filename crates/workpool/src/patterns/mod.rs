//! Concurrency patterns built from the same primitives as the pool
//!
//! This module provides:
//! - [`map_reduce`] - Map inputs on a worker pool, fold the outputs
//! - [`fan_out_fan_in`] - Round-robin dedicated workers merged into one stream
//! - [`producer_consumer`] - Bounded buffer between one producer and one consumer

mod fan_out;
mod map_reduce;
mod producer_consumer;

pub use fan_out::{fan_out_fan_in, FanOutRecord};
pub use map_reduce::{map_reduce, MapReduceOutput};
pub use producer_consumer::{producer_consumer, ProducerConsumerReport};

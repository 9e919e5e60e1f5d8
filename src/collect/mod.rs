//! Multi-topic live collection with cache merge.

mod collector;
mod result;

pub use collector::Collector;
pub use result::{ReadFailure, ReadOutcome, ReadResult, ValueSource};

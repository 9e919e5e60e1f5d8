//! Time-boxed recording of live traffic into a diffed event stream.

mod event;
mod recorder;

pub use event::{ChangeEvent, ChangeType, FilterKind, FilterSpec, RecordSpec, Recording};
pub use recorder::Recorder;

//! Audit sinks and table writers.

mod sink;
mod writer;

pub use sink::{CsvFailureSink, FailureSink, MemorySink, TracingSink};
pub use writer::write_table;

pub mod benchmark;
pub mod core;
pub mod samplesheet;

pub use benchmark::{BenchmarkRecord, MetricValue};
pub use core::error::{Result, SnakeError, SnakeErrorKind};
pub use samplesheet::SampleSheet;

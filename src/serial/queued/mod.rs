pub mod types;
pub mod writer;

pub use types::{WriterMetrics, WriterRequest};
pub use writer::{QueuedWriterBuilder, QueuedWriterHandle};

//! Graph Builder and its persistence.

pub mod builder;
pub mod writer;

pub use builder::{build_graph, GraphOptions};
pub use writer::{write_graph, write_records, OutputFormat, StoredRecord};

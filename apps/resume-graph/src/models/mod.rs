pub mod graph;
pub mod member;
pub mod record;

pub use graph::{Graph, GraphEdge, GraphNode};
pub use member::Member;
pub use record::{AttributeRecord, Category};

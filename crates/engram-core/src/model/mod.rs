mod edge;
mod edge_type;
mod ids;
mod label;
mod memory;
mod node;

pub use edge::Edge;
pub use edge_type::{EdgeType, ParseEdgeTypeError};
pub use ids::{code_node_id, node_id};
pub use label::{compact_type, decay_rate_for_labels, is_archive_protected, Label, LabelSet};
pub use memory::MemoryState;
pub use node::{derive_summary, Node};

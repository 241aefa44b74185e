//! The canonicalized shared-tree core: strands, annotated pointers, nodes,
//! the tree store, streaming construction, frequency sorting and the binary
//! container format.

mod builder;
mod node;
mod pointer;
mod serialize;
mod sort;
mod store;
mod strand;

pub use builder::{TreeBuilder, DEFAULT_SEGMENT_WIDTH};
pub use node::Node;
pub use pointer::{Pointer, MAX_LAYER_LEN};
pub use store::{Indexer, Iter, Tree};
pub use strand::Strand;

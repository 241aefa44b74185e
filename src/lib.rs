//! Compresses a FASTA-formatted genomic sequence into a shared, balanced
//! binary tree. Subtrees that are equal up to complementation, reversal or
//! both are stored once and referenced through annotated pointers. Layers
//! are then reordered by reference frequency so a variable-width pointer
//! encoding keeps the hottest references short.

pub mod cli;
pub mod compress;
pub mod error;
pub mod io;
pub mod tree;
pub mod util;

pub use error::{Error, Result};
pub use tree::{Node, Pointer, Strand, Tree, TreeBuilder};

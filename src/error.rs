//! Error kinds shared across the crate.

use thiserror::Error;

/// Errors produced while parsing input, building a tree, or decoding a
/// serialized container.
#[derive(Debug, Error)]
pub enum Error {
    /// The input contained a character outside the FASTA nucleotide alphabet.
    #[error("unknown nucleotide symbol '{0}'")]
    BadSymbol(char),

    /// Strand width outside the supported 1..=16 range, or strands of mixed
    /// widths fed into one tree.
    #[error("invalid strand width: {0} (supported range is 1..=16)")]
    BadWidth(usize),

    /// A layer outgrew the 28-bit pointer address space.
    #[error("pointer address space exhausted: a layer cannot hold more than 2^28 - 1 entries")]
    Capacity,

    /// The serialized container is truncated or structurally invalid.
    #[error("malformed container: {0}")]
    BadFormat(&'static str),

    /// The input held no complete strand; a tree needs at least one leaf.
    #[error("empty input: at least one complete strand is required")]
    EmptyInput,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

pub mod fasta;

pub use fasta::{FastaReader, FileReader};

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dagz")]
#[command(author = "DAGZ Contributors")]
#[command(version)]
#[command(about = "Genomic sequence compression into a canonicalized shared binary DAG", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compress a FASTA sequence into a shared-tree DAG archive
    Compress(CompressArgs),
}

#[derive(Parser)]
pub struct CompressArgs {
    /// Input FASTA file (plain or gzipped; raw nucleotide streams work too)
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// Output archive file (default: <input>.dag)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Build and report without writing the archive
    #[arg(long)]
    pub no_save: bool,

    /// Write per-layer reference-count histograms to a CSV file
    #[arg(long, value_name = "FILE")]
    pub histogram: Option<PathBuf>,

    /// Strand width in nucleotides
    #[arg(long, value_name = "N", default_value = "12", value_parser = clap::value_parser!(u8).range(1..=16))]
    pub dna_size: u8,

    /// Log construction and sorting progress
    #[arg(short, long, conflicts_with = "statistics")]
    pub verbose: bool,

    /// Print compression statistics after the build
    #[arg(short, long)]
    pub statistics: bool,
}

impl Default for CompressArgs {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            output: None,
            no_save: false,
            histogram: None,
            dna_size: 12,
            verbose: false,
            statistics: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["dagz", "compress", "genome.fa"]);
        let Commands::Compress(args) = cli.command;
        assert_eq!(args.input, PathBuf::from("genome.fa"));
        assert_eq!(args.dna_size, 12);
        assert!(args.output.is_none());
        assert!(!args.no_save);
    }

    #[test]
    fn test_dna_size_range_is_enforced() {
        assert!(Cli::try_parse_from(["dagz", "compress", "g.fa", "--dna-size", "0"]).is_err());
        assert!(Cli::try_parse_from(["dagz", "compress", "g.fa", "--dna-size", "17"]).is_err());
        assert!(Cli::try_parse_from(["dagz", "compress", "g.fa", "--dna-size", "16"]).is_ok());
    }

    #[test]
    fn test_verbose_conflicts_with_statistics() {
        assert!(Cli::try_parse_from(["dagz", "compress", "g.fa", "-v", "-s"]).is_err());
    }
}

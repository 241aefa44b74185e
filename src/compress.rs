//! The compression pipeline driven by the CLI: read, build, sort, report,
//! serialize.

use std::fs::File;
use std::io::BufWriter;

use tracing::info;

use crate::cli::CompressArgs;
use crate::error::Result;
use crate::io::FastaReader;
use crate::tree::Tree;

/// Runs the full pipeline for one input file and returns the finished tree
/// (sorted, and saved unless suppressed).
pub fn compress(args: &CompressArgs) -> Result<Tree> {
    let reader = FastaReader::from_path(&args.input, args.dna_size)?;

    info!(input = %args.input.display(), dna_size = args.dna_size, "constructing tree");
    let mut tree = Tree::from_fasta(reader)?;

    info!("sorting layers by reference frequency");
    tree.sort();

    if let Some(path) = &args.histogram {
        info!(path = %path.display(), "writing reference histograms");
        let mut writer = BufWriter::new(File::create(path)?);
        tree.write_histograms(&mut writer)?;
    }

    if args.statistics {
        print_statistics(&tree);
    }

    if !args.no_save {
        let output = args
            .output
            .clone()
            .unwrap_or_else(|| args.input.with_extension("dag"));
        info!(path = %output.display(), bytes = tree.bytes(), "saving archive");
        tree.save(&output)?;
    }

    Ok(tree)
}

fn print_statistics(tree: &Tree) {
    let width = tree.width();
    let nucleotides = width * tree.strand_width() as u64;
    let compressed = tree.bytes() as u64;
    println!("Strands:         {width}");
    println!("Nucleotides:     {nucleotides}");
    println!("Tree depth:      {}", tree.depth());
    println!("Unique leaves:   {}", tree.leaf_count());
    println!("Unique nodes:    {}", tree.node_count());
    println!("Archive size:    {compressed} bytes");
    if compressed > 0 {
        println!(
            "Ratio:           {:.3} nucleotides/byte",
            nucleotides as f64 / compressed as f64
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::io::Write;

    fn fasta_file(dir: &tempfile::TempDir, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_compress_writes_default_output() {
        let dir = tempfile::TempDir::new().unwrap();
        let input = fasta_file(&dir, "genome.fa", ">x\nACGTACGTACGTACGTACGTACGT\n");

        let args = CompressArgs {
            input: input.clone(),
            dna_size: 8,
            ..CompressArgs::default()
        };
        let tree = compress(&args).unwrap();
        assert_eq!(tree.width(), 3);

        let archive = input.with_extension("dag");
        let data = std::fs::read(archive).unwrap();
        let loaded = Tree::deserialize(&mut Cursor::new(data), 8).unwrap();
        assert_eq!(loaded, tree);
    }

    #[test]
    fn test_no_save_skips_archive() {
        let dir = tempfile::TempDir::new().unwrap();
        let input = fasta_file(&dir, "genome.fa", ">x\nACGTACGTACGTACGT\n");

        let args = CompressArgs {
            input: input.clone(),
            dna_size: 8,
            no_save: true,
            ..CompressArgs::default()
        };
        compress(&args).unwrap();
        assert!(!input.with_extension("dag").exists());
    }

    #[test]
    fn test_histogram_file_is_written() {
        let dir = tempfile::TempDir::new().unwrap();
        let input = fasta_file(&dir, "genome.fa", ">x\nACGTACGTACGTACGTACGTACGTACGTACGT\n");
        let histogram = dir.path().join("hist.csv");

        let args = CompressArgs {
            input,
            dna_size: 8,
            no_save: true,
            histogram: Some(histogram.clone()),
            ..CompressArgs::default()
        };
        compress(&args).unwrap();
        let csv = std::fs::read_to_string(histogram).unwrap();
        assert!(!csv.trim().is_empty());
    }

    #[test]
    fn test_gzipped_input() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("genome.fa.gz");
        let mut encoder = flate2::write::GzEncoder::new(
            File::create(&path).unwrap(),
            flate2::Compression::default(),
        );
        encoder
            .write_all(b">x\nACGTACGTACGTACGT\n")
            .unwrap();
        encoder.finish().unwrap();

        let args = CompressArgs {
            input: path,
            dna_size: 8,
            no_save: true,
            ..CompressArgs::default()
        };
        let tree = compress(&args).unwrap();
        assert_eq!(tree.width(), 2);
        let emitted: Vec<String> = tree.iter().map(|s| s.to_string()).collect();
        assert_eq!(emitted, vec!["ACGTACGT", "ACGTACGT"]);
    }
}

//! Buffered FASTA input yielding fixed-width strands.
//!
//! Header lines (`>` or the legacy `;`) and all whitespace are skipped; the
//! remaining nucleotide stream is cut into strands of the configured width.
//! Trailing nucleotides that do not fill a whole strand are dropped.
//! Gzip-compressed files are detected by their magic bytes and decoded
//! transparently.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;

use crate::error::{Error, Result};
use crate::tree::Strand;

/// Either a plain file reader or a gzip-decoding one.
pub enum FileReader {
    Plain(BufReader<File>),
    Gzipped(BufReader<GzDecoder<BufReader<File>>>),
}

impl Read for FileReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            FileReader::Plain(r) => r.read(buf),
            FileReader::Gzipped(r) => r.read(buf),
        }
    }
}

impl BufRead for FileReader {
    fn fill_buf(&mut self) -> std::io::Result<&[u8]> {
        match self {
            FileReader::Plain(r) => r.fill_buf(),
            FileReader::Gzipped(r) => r.fill_buf(),
        }
    }

    fn consume(&mut self, amt: usize) {
        match self {
            FileReader::Plain(r) => r.consume(amt),
            FileReader::Gzipped(r) => r.consume(amt),
        }
    }
}

/// Reads a FASTA (or raw nucleotide) stream as a sequence of fixed-width
/// strands.
pub struct FastaReader<R: BufRead> {
    reader: R,
    strand_width: u8,
    line: String,
    position: usize,
}

impl FastaReader<FileReader> {
    /// Opens a FASTA file, sniffing the gzip magic bytes.
    pub fn from_path(path: impl AsRef<Path>, strand_width: u8) -> Result<Self> {
        let file = File::open(path.as_ref())?;

        let mut buffered = BufReader::new(file);
        let is_gzipped = {
            let peek = buffered.fill_buf()?;
            peek.len() >= 2 && peek[0] == 0x1f && peek[1] == 0x8b
        };

        let reader = if is_gzipped {
            FileReader::Gzipped(BufReader::new(GzDecoder::new(buffered)))
        } else {
            FileReader::Plain(buffered)
        };

        Self::new(reader, strand_width)
    }
}

impl<R: BufRead> FastaReader<R> {
    /// Wraps any buffered reader.
    pub fn new(reader: R, strand_width: u8) -> Result<Self> {
        if strand_width == 0 || strand_width > 16 {
            return Err(Error::BadWidth(strand_width as usize));
        }
        Ok(Self {
            reader,
            strand_width,
            line: String::with_capacity(128),
            position: 0,
        })
    }

    pub fn strand_width(&self) -> u8 {
        self.strand_width
    }

    /// Reads the next full-width strand, or `None` at end of input. A final
    /// partial strand is silently dropped.
    pub fn next_strand(&mut self) -> Result<Option<Strand>> {
        let width = self.strand_width as usize;
        let mut symbols = [0u8; 16];
        let mut have = 0;

        while have < width {
            if self.position == self.line.len() && !self.refill()? {
                return Ok(None);
            }
            let pending = &self.line.as_bytes()[self.position..];
            let take = pending.len().min(width - have);
            symbols[have..have + take].copy_from_slice(&pending[..take]);
            self.position += take;
            have += take;
        }

        Strand::from_ascii(&symbols[..width]).map(Some)
    }

    /// Loads the next sequence line, skipping headers and blank lines.
    /// Returns false at end of input.
    fn refill(&mut self) -> Result<bool> {
        loop {
            self.line.clear();
            self.position = 0;
            if self.reader.read_line(&mut self.line)? == 0 {
                return Ok(false);
            }
            if self.line.starts_with('>') || self.line.starts_with(';') {
                continue;
            }
            self.line.retain(|c| !c.is_ascii_whitespace());
            if !self.line.is_empty() {
                return Ok(true);
            }
        }
    }
}

impl<R: BufRead> Iterator for FastaReader<R> {
    type Item = Result<Strand>;

    fn next(&mut self) -> Option<Result<Strand>> {
        self.next_strand().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn reader(data: &str, width: u8) -> FastaReader<BufReader<Cursor<Vec<u8>>>> {
        FastaReader::new(BufReader::new(Cursor::new(data.as_bytes().to_vec())), width).unwrap()
    }

    fn collect(data: &str, width: u8) -> Vec<String> {
        reader(data, width)
            .map(|s| s.unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_reads_fixed_width_strands() {
        let strands = collect(">chr1 test\nACGTACGT\nTTTTAAAA\n", 8);
        assert_eq!(strands, vec!["ACGTACGT", "TTTTAAAA"]);
    }

    #[test]
    fn test_strands_span_lines() {
        let strands = collect(">chr1\nACGTAC\nGTTTTT\nAAAA\n", 8);
        assert_eq!(strands, vec!["ACGTACGT", "TTTTAAAA"]);
    }

    #[test]
    fn test_partial_trailing_strand_is_dropped() {
        let strands = collect(">chr1\nACGTACGTACG\n", 8);
        assert_eq!(strands, vec!["ACGTACGT"]);
    }

    #[test]
    fn test_headers_and_blank_lines_are_skipped() {
        let strands = collect(";legacy comment\n>chr1\n\nACGT\n\n>ignored mid-file\nTGCA\n", 4);
        assert_eq!(strands, vec!["ACGT", "TGCA"]);
    }

    #[test]
    fn test_raw_sequence_without_header() {
        let strands = collect("ACGTACGTTTTTAAAA", 4);
        assert_eq!(strands, vec!["ACGT", "ACGT", "TTTT", "AAAA"]);
    }

    #[test]
    fn test_lowercase_and_ambiguity_codes() {
        let strands = collect(">x\nacgtnrys\n", 8);
        assert_eq!(strands, vec!["ACGTNRYS"]);
    }

    #[test]
    fn test_bad_symbol_is_reported() {
        let mut r = reader(">x\nACG*ACGT\n", 8);
        assert!(matches!(r.next_strand(), Err(Error::BadSymbol('*'))));
    }

    #[test]
    fn test_bad_width_is_rejected() {
        let cursor = BufReader::new(Cursor::new(Vec::new()));
        assert!(matches!(
            FastaReader::new(cursor, 0),
            Err(Error::BadWidth(0))
        ));
        let cursor = BufReader::new(Cursor::new(Vec::new()));
        assert!(matches!(
            FastaReader::new(cursor, 17),
            Err(Error::BadWidth(17))
        ));
    }
}

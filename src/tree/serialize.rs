//! Binary container format.
//!
//! Big-endian throughout: the root pointer in its segmented encoding, a
//! u64 leaf count followed by the raw leaf words, then each layer as a u64
//! size followed by its serialized nodes. A clean end of stream where the
//! next layer size would start terminates the layer list; the final layer
//! always holds the single root node. The strand width is not part of the
//! container and must be supplied on load.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use crate::error::{Error, Result};
use crate::tree::{Node, Pointer, Strand, Tree};
use crate::util;

impl Tree {
    /// Serialized size in bytes, without writing anything.
    pub fn bytes(&self) -> usize {
        let mut total = self.root.bytes() + 8 + self.leaves.len() * Strand::bytes(self.strand_width);
        for layer in &self.layers {
            total += 8;
            total += layer.iter().map(Node::bytes).sum::<usize>();
        }
        total
    }

    pub fn serialize(&self, writer: &mut impl Write) -> Result<()> {
        self.root.serialize(writer)?;
        util::write_u64_be(writer, self.leaves.len() as u64)?;
        for leaf in &self.leaves {
            leaf.serialize(writer)?;
        }
        for layer in &self.layers {
            util::write_u64_be(writer, layer.len() as u64)?;
            for node in layer {
                node.serialize(writer)?;
            }
        }
        Ok(())
    }

    /// Loads a tree serialized with [`Tree::serialize`]. The strand width
    /// is the `--dna-size` the tree was built with.
    pub fn deserialize(reader: &mut impl Read, strand_width: u8) -> Result<Self> {
        if strand_width == 0 || strand_width > 16 {
            return Err(Error::BadWidth(strand_width as usize));
        }

        let mut tree = Tree::empty(strand_width);
        tree.root = Pointer::deserialize(reader)?;

        let leaf_count = util::read_u64_be(reader)?;
        for _ in 0..leaf_count {
            tree.leaves.push(Strand::deserialize(reader, strand_width)?);
        }

        while let Some(size) = util::read_u64_be_opt(reader)? {
            let mut layer = Vec::new();
            for _ in 0..size {
                layer.push(Node::deserialize(reader)?);
            }
            tree.layers.push(layer);
        }

        if tree.leaves.is_empty() || tree.layers.is_empty() {
            return Err(Error::BadFormat("container holds no tree"));
        }
        Ok(tree)
    }

    /// Writes the serialized tree to a file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.serialize(&mut writer)
    }
}

//! Streaming tree construction.
//!
//! The builder consumes the input in fixed-width segments, fully reducing
//! each segment to a single subtree root before the next one is read, so
//! memory stays bounded by the dedup maps rather than the input length.
//! Every leaf and node is stored in canonical form exactly once; pointers
//! carry the transform tags needed to reconstitute the original
//! orientation.

use std::collections::hash_map::Entry;
use std::io::BufRead;

use rustc_hash::FxHashMap;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::io::FastaReader;
use crate::tree::{Node, Pointer, Strand, Tree, MAX_LAYER_LEN};
use crate::util;

/// Strands per construction segment. Each segment becomes one subtree of
/// roughly `log2(SEGMENT_WIDTH)` layers before its root is set aside.
pub const DEFAULT_SEGMENT_WIDTH: usize = 1 << 10;

/// Incremental constructor for [`Tree`]. Feed strands with
/// [`TreeBuilder::reduce`], then call [`TreeBuilder::finish`] to fold the
/// accumulated segment roots into the final tree.
pub struct TreeBuilder {
    tree: Tree,
    leaf_map: FxHashMap<Strand, u32>,
    node_maps: Vec<FxHashMap<Node, u32>>,
    roots: Vec<Pointer>,
    segment_width: usize,
}

impl TreeBuilder {
    pub fn new(strand_width: u8) -> Self {
        Self {
            tree: Tree::empty(strand_width),
            leaf_map: FxHashMap::default(),
            node_maps: Vec::new(),
            roots: Vec::new(),
            segment_width: DEFAULT_SEGMENT_WIDTH,
        }
    }

    /// Overrides the construction segment width (strands per subtree).
    pub fn with_segment_width(mut self, segment_width: usize) -> Self {
        assert!(segment_width >= 2, "a segment must hold at least one pair");
        self.segment_width = segment_width;
        self
    }

    /// Consumes strands, reducing one full segment at a time. May be called
    /// repeatedly; segment boundaries then follow the calls.
    pub fn reduce<I>(&mut self, strands: I) -> Result<()>
    where
        I: IntoIterator<Item = Result<Strand>>,
    {
        for segment in util::chunked(strands.into_iter(), self.segment_width) {
            let segment: Vec<Strand> = segment.into_iter().collect::<Result<_>>()?;
            self.reduce_segment(&segment)?;
            debug!(
                strands = segment.len(),
                roots = self.roots.len(),
                "segment reduced"
            );
        }
        Ok(())
    }

    /// Folds the accumulated segment roots into a single root and returns
    /// the finished tree.
    pub fn finish(mut self) -> Result<Tree> {
        if self.roots.is_empty() {
            return Err(Error::EmptyInput);
        }

        let segments = self.roots.len();
        let mut layer = self.node_maps.len();
        while self.roots.len() > 1 {
            let level = std::mem::take(&mut self.roots);
            self.roots = self.reduce_level(level, layer)?;
            layer += 1;
        }
        self.tree.root = self.roots[0];

        info!(
            segments,
            depth = self.tree.depth(),
            leaves = self.tree.leaf_count(),
            nodes = self.tree.node_count(),
            "construction complete"
        );
        Ok(self.tree)
    }

    /// Reduces one segment to a single pointer and records it as a subtree
    /// root. Shorter segments (the final one) are folded up through
    /// single-child parents until they reach the height of the segments
    /// before them.
    fn reduce_segment(&mut self, segment: &[Strand]) -> Result<()> {
        let mut level = self.reduce_leaves(segment)?;
        let mut layer = 1;
        while level.len() > 1 || layer < self.node_maps.len() {
            level = self.reduce_level(level, layer)?;
            layer += 1;
        }
        self.roots.push(level[0]);
        Ok(())
    }

    /// Pairs up the segment's strands into layer-0 nodes, deduplicating the
    /// leaves on the way.
    fn reduce_leaves(&mut self, segment: &[Strand]) -> Result<Vec<Pointer>> {
        self.ensure_layer(0);
        util::fold_pairs(segment.iter().copied(), |left, right| {
            let left = self.emplace_leaf(left)?;
            let right = match right {
                Some(right) => self.emplace_leaf(right)?,
                None => Pointer::NULL,
            };
            self.emplace_node(0, left, right)
        })
    }

    /// Pairs up a level of pointers into nodes one layer up.
    fn reduce_level(&mut self, level: Vec<Pointer>, layer: usize) -> Result<Vec<Pointer>> {
        self.ensure_layer(layer);
        util::fold_pairs(level, |left, right| {
            self.emplace_node(layer, left, right.unwrap_or(Pointer::NULL))
        })
    }

    fn ensure_layer(&mut self, layer: usize) {
        while self.tree.layers.len() <= layer {
            self.tree.layers.push(Vec::new());
            self.node_maps.push(FxHashMap::default());
        }
    }

    /// Deduplicating leaf insertion: the canonical strand is stored, the
    /// returned pointer carries the transform back to the original.
    fn emplace_leaf(&mut self, leaf: Strand) -> Result<Pointer> {
        if leaf.width() != self.tree.strand_width {
            return Err(Error::BadWidth(leaf.width() as usize));
        }
        let (canonical, mirror, transpose, invariant) = leaf.canonical();

        let next = self.tree.leaves.len();
        let index = match self.leaf_map.entry(canonical) {
            Entry::Occupied(entry) => *entry.get() as usize,
            Entry::Vacant(entry) => {
                if next >= MAX_LAYER_LEN {
                    return Err(Error::Capacity);
                }
                entry.insert(next as u32);
                self.tree.leaves.push(canonical);
                next
            }
        };
        Ok(Pointer::new(index, mirror, transpose, invariant))
    }

    /// Deduplicating node insertion into `layer`. The dedup key is the
    /// canonical form, so any node similar to an already-stored one resolves
    /// to the same index with the appropriate transform tags.
    fn emplace_node(&mut self, layer: usize, left: Pointer, right: Pointer) -> Result<Pointer> {
        let raw = Node::new(left, right);
        let (canonical, mirror, transpose) = raw.canonical();
        let invariant = raw.is_invariant();

        let next = self.tree.layers[layer].len();
        let index = match self.node_maps[layer].entry(canonical) {
            Entry::Occupied(entry) => *entry.get() as usize,
            Entry::Vacant(entry) => {
                if next >= MAX_LAYER_LEN {
                    return Err(Error::Capacity);
                }
                entry.insert(next as u32);
                self.tree.layers[layer].push(canonical);
                next
            }
        };
        Ok(Pointer::new(index, mirror, transpose, invariant))
    }
}

impl Tree {
    /// Builds a tree from an in-memory strand sequence. All strands must
    /// share one width.
    pub fn from_strands(strands: impl IntoIterator<Item = Strand>) -> Result<Self> {
        let mut iter = strands.into_iter().peekable();
        let width = match iter.peek() {
            Some(strand) => strand.width(),
            None => return Err(Error::EmptyInput),
        };
        let mut builder = TreeBuilder::new(width);
        builder.reduce(iter.map(Ok))?;
        builder.finish()
    }

    /// Builds a tree by draining a FASTA reader.
    pub fn from_fasta<R: BufRead>(reader: FastaReader<R>) -> Result<Self> {
        let mut builder = TreeBuilder::new(reader.strand_width());
        builder.reduce(reader)?;
        builder.finish()
    }
}

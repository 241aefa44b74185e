//! Frequency-based layer reordering.
//!
//! Each layer is permuted so that its most-referenced entries land at the
//! smallest indices, which lets the segmented pointer encoding spend one
//! byte on the hottest references. Reordering layer `k` rewrites only layer
//! `k` itself and the pointers in layer `k + 1`, so non-adjacent layers can
//! be processed concurrently: one wave handles the leaves and the odd
//! layers, a second wave the even layers.

use std::io::Write;

use rayon::prelude::*;
use tracing::info;

use crate::error::Result;
use crate::tree::{Node, Pointer, Strand, Tree};

impl Tree {
    /// Reference counts from the nodes of `parent_layer` into its child
    /// layer (the leaves when `parent_layer` is 0), indexed by child index.
    /// A single-child parent contributes one reference.
    pub fn histogram(&self, parent_layer: usize) -> Vec<u64> {
        let child_len = if parent_layer == 0 {
            self.leaves.len()
        } else {
            self.layers[parent_layer - 1].len()
        };
        layer_histogram(&self.layers[parent_layer], child_len)
    }

    /// Reorders every layer by descending reference count and rewires all
    /// parent pointers accordingly. The denoted sequence is unchanged; only
    /// index assignments move. The top layer holds the single root node and
    /// stays put, so the root pointer survives as-is.
    pub fn sort(&mut self) {
        let (leaves, layers) = (&mut self.leaves, &mut self.layers);

        // First wave: the leaves (rewiring layer 0) alongside each odd
        // layer (rewiring the even layer above it).
        let (first, rest) = layers.split_at_mut(1);
        rayon::join(
            || sort_leaf_layer(leaves, &mut first[0]),
            || {
                rest.par_chunks_mut(2).for_each(|pair| {
                    if let [child, parent] = pair {
                        sort_node_layer(child, parent);
                    }
                })
            },
        );

        // Second wave: the even layers, rewiring the odd layers above.
        layers.par_chunks_mut(2).for_each(|pair| {
            if let [child, parent] = pair {
                sort_node_layer(child, parent);
            }
        });

        info!(depth = self.depth(), "layers sorted by reference frequency");
    }

    /// Writes the per-layer reference histograms as CSV: one row per parent
    /// layer (leaf references first), counts in descending order, rows
    /// broken every 1000 values, a blank line between layers.
    pub fn write_histograms(&self, writer: &mut impl Write) -> Result<()> {
        for layer in 0..self.depth() {
            let mut counts = self.histogram(layer);
            counts.sort_unstable_by(|a, b| b.cmp(a));
            for chunk in counts.chunks(1000) {
                let mut line = String::with_capacity(chunk.len() * 4);
                for count in chunk {
                    line.push_str(&count.to_string());
                    line.push(',');
                }
                writeln!(writer, "{line}")?;
            }
            writeln!(writer)?;
        }
        Ok(())
    }
}

fn layer_histogram(parents: &[Node], child_len: usize) -> Vec<u64> {
    let mut counts = vec![0u64; child_len];
    for node in parents {
        if !node.left().is_null() {
            counts[node.left().index()] += 1;
        }
        if !node.right().is_null() {
            counts[node.right().index()] += 1;
        }
    }
    counts
}

/// The permutation sending each old index to its new position: descending
/// reference count, ties broken by ascending old index so the result is
/// deterministic.
fn frequency_permutation(counts: &[u64]) -> Vec<u32> {
    let mut by_count: Vec<u32> = (0..counts.len() as u32).collect();
    by_count.sort_by(|&a, &b| counts[b as usize].cmp(&counts[a as usize]));

    let mut permutation = vec![0u32; counts.len()];
    for (new, &old) in by_count.iter().enumerate() {
        permutation[old as usize] = new as u32;
    }
    permutation
}

/// Moves each entry `i` to position `permutation[i]`.
fn reorder<T: Copy>(items: &mut Vec<T>, permutation: &[u32]) {
    let mut reordered = items.clone();
    for (old, &item) in items.iter().enumerate() {
        reordered[permutation[old] as usize] = item;
    }
    *items = reordered;
}

/// Remaps every child reference in `parents` through the permutation,
/// keeping transform tags intact. Null pointers stay null.
fn rewire(parents: &mut [Node], permutation: &[u32]) {
    let update = |pointer: Pointer| {
        if pointer.is_null() {
            pointer
        } else {
            Pointer::new(
                permutation[pointer.index()] as usize,
                pointer.is_mirrored(),
                pointer.is_transposed(),
                pointer.is_invariant(),
            )
        }
    };
    for node in parents.iter_mut() {
        *node = Node::new(update(node.left()), update(node.right()));
    }
}

fn sort_leaf_layer(leaves: &mut Vec<Strand>, parents: &mut Vec<Node>) {
    let permutation = frequency_permutation(&layer_histogram(parents, leaves.len()));
    reorder(leaves, &permutation);
    rewire(parents, &permutation);
}

fn sort_node_layer(child: &mut Vec<Node>, parents: &mut Vec<Node>) {
    let permutation = frequency_permutation(&layer_histogram(parents, child.len()));
    reorder(child, &permutation);
    rewire(parents, &permutation);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(texts: &[&str]) -> Tree {
        let strands: Vec<Strand> = texts.iter().map(|t| Strand::parse(t).unwrap()).collect();
        Tree::from_strands(strands).unwrap()
    }

    #[test]
    fn test_frequency_permutation_is_stable() {
        // Counts 2, 5, 5, 1: index 1 and 2 tie, index 1 keeps precedence.
        let permutation = frequency_permutation(&[2, 5, 5, 1]);
        assert_eq!(permutation, vec![2, 0, 1, 3]);
    }

    #[test]
    fn test_reorder_and_rewire_agree() {
        let mut items = vec!['a', 'b', 'c'];
        let permutation = vec![2, 0, 1];
        reorder(&mut items, &permutation);
        assert_eq!(items, vec!['b', 'c', 'a']);

        let mut parents = vec![Node::new(
            Pointer::new(0, false, true, false),
            Pointer::new(2, true, false, false),
        )];
        rewire(&mut parents, &permutation);
        assert_eq!(parents[0].left().index(), 2);
        assert!(parents[0].left().is_transposed());
        assert_eq!(parents[0].right().index(), 1);
        assert!(parents[0].right().is_mirrored());
    }

    #[test]
    fn test_sort_preserves_sequence_and_counts() {
        let texts = [
            "ACGTACGT", "ACGTACGT", "ACGTACGT", "TTTTAAAA", "CCCCGGGG", "ACGTACGT", "TTTTAAAA",
            "GGGGCCCC", "ACGTACGT",
        ];
        let mut tree = build(&texts);
        let before: Vec<Strand> = tree.iter().collect();
        let leaf_count = tree.leaf_count();
        let node_count = tree.node_count();

        tree.sort();

        let after: Vec<Strand> = tree.iter().collect();
        assert_eq!(before, after);
        assert_eq!(tree.leaf_count(), leaf_count);
        assert_eq!(tree.node_count(), node_count);

        for (i, strand) in after.iter().enumerate() {
            assert_eq!(tree.get(i as u64), *strand);
        }
    }

    #[test]
    fn test_sorted_leaf_histogram_is_non_increasing() {
        let texts = [
            "ACGTACGT", "ACGTACGT", "TTTTAAAA", "ACGTACGT", "CCCCGGGG", "TTTTAAAA", "ACGTACGT",
        ];
        let mut tree = build(&texts);
        tree.sort();
        let counts = tree.histogram(0);
        assert!(counts.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_sort_moves_hot_leaf_to_index_zero() {
        // "TTTTAAAA" appears four times, canonically "AAAATTTT"... the most
        // referenced canonical leaf must land at index 0 after sorting.
        let texts = [
            "TTTTAAAA", "TTTTAAAA", "TTTTAAAA", "TTTTAAAA", "CCCCGGGG", "ACGTACGT", "GGGGAAAA",
        ];
        let mut tree = build(&texts);
        tree.sort();
        let counts = tree.histogram(0);
        assert_eq!(counts[0], *counts.iter().max().unwrap());
    }

    #[test]
    fn test_single_strand_sort_is_identity() {
        let mut tree = build(&["ACGTACGT"]);
        tree.sort();
        assert_eq!(tree.get(0).to_string(), "ACGTACGT");
        assert_eq!(tree.width(), 1);
    }

    #[test]
    fn test_histogram_csv_shape() {
        let mut tree = build(&["ACGTACGT", "ACGTACGT", "TTTTAAAA", "CCCCGGGG"]);
        tree.sort();
        let mut csv = Vec::new();
        tree.write_histograms(&mut csv).unwrap();
        let csv = String::from_utf8(csv).unwrap();
        let blocks: Vec<&str> = csv.split("\n\n").filter(|b| !b.trim().is_empty()).collect();
        assert_eq!(blocks.len(), tree.depth());
        for block in blocks {
            for value in block.trim().trim_end_matches(',').split(',') {
                value.parse::<u64>().unwrap();
            }
        }
    }
}

//! The shared tree store: one deduplicated strand vector plus one node
//! vector per internal layer, all referenced through annotated pointers.

use std::fmt;

use crate::tree::{Node, Pointer, Strand};

/// A balanced binary tree compressed into a DAG. Layer 0 holds the parents
/// of the leaves; the topmost layer holds the single node named by `root`.
#[derive(Debug, PartialEq, Eq)]
pub struct Tree {
    pub(crate) leaves: Vec<Strand>,
    pub(crate) layers: Vec<Vec<Node>>,
    pub(crate) root: Pointer,
    pub(crate) strand_width: u8,
}

impl Tree {
    pub(crate) fn empty(strand_width: u8) -> Self {
        Self {
            leaves: Vec::new(),
            layers: Vec::new(),
            root: Pointer::NULL,
            strand_width,
        }
    }

    /// Number of internal layers.
    pub fn depth(&self) -> usize {
        self.layers.len()
    }

    /// Number of strands denoted by the tree.
    pub fn width(&self) -> u64 {
        self.children(self.depth() - 1, self.root)
    }

    /// Nucleotides per strand.
    pub fn strand_width(&self) -> u8 {
        self.strand_width
    }

    pub fn root(&self) -> Pointer {
        self.root
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    /// Total number of nodes across all layers; leaves are not counted.
    pub fn node_count(&self) -> usize {
        self.layers.iter().map(Vec::len).sum()
    }

    pub fn layer_len(&self, layer: usize) -> usize {
        self.layers[layer].len()
    }

    /// The strand referenced by a leaf pointer, with the pointer's
    /// transforms applied.
    pub fn access_leaf(&self, pointer: Pointer) -> Strand {
        let mut leaf = self.leaves[pointer.index()];
        if pointer.is_mirrored() {
            leaf = leaf.mirrored();
        }
        if pointer.is_transposed() {
            leaf = leaf.transposed();
        }
        leaf
    }

    /// The node referenced by a pointer into the given layer. The caller
    /// interprets the pointer's transform tags.
    pub fn access_node(&self, layer: usize, pointer: Pointer) -> Node {
        self.layers[layer][pointer.index()]
    }

    /// Number of leaves in the subtree referenced by `pointer` at `layer`.
    /// Transform tags are irrelevant here: mirroring and transposition do
    /// not change how many leaves a subtree holds.
    pub fn children(&self, layer: usize, pointer: Pointer) -> u64 {
        if pointer.is_null() {
            return 0;
        }
        let node = self.access_node(layer, pointer);
        if layer == 0 {
            !node.left().is_null() as u64 + !node.right().is_null() as u64
        } else {
            self.children(layer - 1, node.left()) + self.children(layer - 1, node.right())
        }
    }

    /// Random access to the strand at `index`, counting from the leftmost
    /// leaf. Descends from the root, swapping the child order whenever the
    /// current pointer is mirrored and accumulating transform parity along
    /// the path. Linear scans should prefer [`Tree::iter`]: each call here
    /// recounts subtree widths.
    ///
    /// Panics when `index >= self.width()`.
    pub fn get(&self, mut index: u64) -> Strand {
        debug_assert!(index < self.width(), "index beyond tree width");
        let mut current = self.root;

        for layer in (1..self.depth()).rev() {
            let node = self.access_node(layer, current);
            let (left, right) = if current.is_mirrored() {
                (node.right(), node.left())
            } else {
                (node.left(), node.right())
            };

            let left_width = self.children(layer - 1, left);
            let child = if index < left_width {
                left
            } else {
                index -= left_width;
                right
            };
            current = child.transformed(current.is_mirrored(), current.is_transposed());
        }

        let node = self.access_node(0, current);
        let (left, right) = if current.is_mirrored() {
            (node.right(), node.left())
        } else {
            (node.left(), node.right())
        };
        let child = if index < !left.is_null() as u64 {
            left
        } else {
            right
        };
        assert!(!child.is_null(), "index beyond tree width");
        self.access_leaf(child.transformed(current.is_mirrored(), current.is_transposed()))
    }

    /// In-order iteration over the denoted strand sequence.
    pub fn iter(&self) -> Iter<'_> {
        Iter::new(self)
    }

    /// Precomputes per-node subtree widths for repeated random access.
    /// [`Tree::get`] recounts subtree widths on every call; the indexer
    /// spends one pass over the node store and then answers in
    /// `O(depth)`.
    pub fn indexer(&self) -> Indexer<'_> {
        Indexer::new(self)
    }
}

/// Random-access accelerator holding the leaf count of every subtree.
pub struct Indexer<'a> {
    tree: &'a Tree,
    counts: Vec<Vec<u64>>,
}

impl<'a> Indexer<'a> {
    fn new(tree: &'a Tree) -> Self {
        let mut counts: Vec<Vec<u64>> = Vec::with_capacity(tree.depth());
        for (layer, nodes) in tree.layers.iter().enumerate() {
            let count_of = |pointer: Pointer| -> u64 {
                if pointer.is_null() {
                    0
                } else if layer == 0 {
                    1
                } else {
                    counts[layer - 1][pointer.index()]
                }
            };
            let layer_counts = nodes
                .iter()
                .map(|node| count_of(node.left()) + count_of(node.right()))
                .collect();
            counts.push(layer_counts);
        }
        Self { tree, counts }
    }

    /// Number of strands denoted by the tree.
    pub fn width(&self) -> u64 {
        self.counts[self.tree.depth() - 1][self.tree.root.index()]
    }

    /// The strand at `index`, same contract as [`Tree::get`].
    pub fn get(&self, mut index: u64) -> Strand {
        debug_assert!(index < self.width(), "index beyond tree width");
        let tree = self.tree;
        let mut current = tree.root;

        for layer in (1..tree.depth()).rev() {
            let node = tree.access_node(layer, current);
            let (left, right) = if current.is_mirrored() {
                (node.right(), node.left())
            } else {
                (node.left(), node.right())
            };

            let left_width = if left.is_null() {
                0
            } else {
                self.counts[layer - 1][left.index()]
            };
            let child = if index < left_width {
                left
            } else {
                index -= left_width;
                right
            };
            current = child.transformed(current.is_mirrored(), current.is_transposed());
        }

        let node = tree.access_node(0, current);
        let (left, right) = if current.is_mirrored() {
            (node.right(), node.left())
        } else {
            (node.left(), node.right())
        };
        let child = if index < !left.is_null() as u64 {
            left
        } else {
            right
        };
        assert!(!child.is_null(), "index beyond tree width");
        tree.access_leaf(child.transformed(current.is_mirrored(), current.is_transposed()))
    }
}

impl<'a> IntoIterator for &'a Tree {
    type Item = Strand;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Leaves ({}):", self.leaves.len())?;
        for leaf in &self.leaves {
            write!(f, " {leaf}")?;
        }
        writeln!(f)?;
        for layer in &self.layers {
            write!(f, "Layer ({}):", layer.len())?;
            for node in layer {
                write!(f, " {node}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

enum Frame {
    Node { layer: usize, pointer: Pointer },
    Leaf { pointer: Pointer },
}

/// Depth-first iterator with an explicit stack of annotated frames. Each
/// expansion pushes the children of the top frame with the parent's
/// transforms folded into their pointers; a mirrored parent emits its right
/// child first.
pub struct Iter<'a> {
    tree: &'a Tree,
    stack: Vec<Frame>,
}

impl<'a> Iter<'a> {
    fn new(tree: &'a Tree) -> Self {
        let mut stack = Vec::with_capacity(2 * tree.depth().max(1));
        if !tree.root.is_null() {
            stack.push(Frame::Node {
                layer: tree.depth() - 1,
                pointer: tree.root,
            });
        }
        Self { tree, stack }
    }
}

impl Iterator for Iter<'_> {
    type Item = Strand;

    fn next(&mut self) -> Option<Strand> {
        while let Some(frame) = self.stack.pop() {
            let (layer, pointer) = match frame {
                Frame::Leaf { pointer } => return Some(self.tree.access_leaf(pointer)),
                Frame::Node { layer, pointer } => (layer, pointer),
            };

            let node = self.tree.access_node(layer, pointer);
            let (first, second) = if pointer.is_mirrored() {
                (node.right(), node.left())
            } else {
                (node.left(), node.right())
            };

            // Push in reverse so `first` is expanded next.
            for child in [second, first] {
                if child.is_null() {
                    continue;
                }
                let child = child.transformed(pointer.is_mirrored(), pointer.is_transposed());
                if layer == 0 {
                    self.stack.push(Frame::Leaf { pointer: child });
                } else {
                    self.stack.push(Frame::Node {
                        layer: layer - 1,
                        pointer: child,
                    });
                }
            }
        }
        None
    }
}

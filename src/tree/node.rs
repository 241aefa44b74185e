//! Inner tree nodes: ordered pairs of annotated pointers.

use std::fmt;
use std::io::{Read, Write};

use crate::error::Result;
use crate::tree::Pointer;

/// An ordered pair of child pointers. The right child is null only for the
/// single-child parents that close the right edge of an odd-width layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Node {
    left: Pointer,
    right: Pointer,
}

impl Node {
    pub fn new(left: Pointer, right: Pointer) -> Self {
        Self { left, right }
    }

    /// A parent holding a single child, used at the right edge of a layer.
    pub fn single(left: Pointer) -> Self {
        Self::new(left, Pointer::NULL)
    }

    pub fn left(&self) -> Pointer {
        self.left
    }

    pub fn right(&self) -> Pointer {
        self.right
    }

    /// The node denoting the mirrored subtree: children swapped and each
    /// mirror-tagged.
    pub fn mirrored(self) -> Self {
        Self::new(self.right.mirrored(), self.left.mirrored())
    }

    /// The node denoting the complemented subtree: both children
    /// transpose-tagged, order unchanged.
    pub fn transposed(self) -> Self {
        Self::new(self.left.transposed(), self.right.transposed())
    }

    /// Mirror followed by transposition.
    pub fn inverted(self) -> Self {
        self.mirrored().transposed()
    }

    /// True when the node equals its own mirror image, i.e. its children are
    /// each other's mirror. Pointers to such a node suppress the mirror tag.
    pub fn is_invariant(&self) -> bool {
        self.left == self.right.mirrored()
    }

    /// The lexicographically smallest of the four similarity transforms of
    /// this node, with the `(mirror, transpose)` pair that recovers `self`
    /// from it. Ties prefer the identity transform, so a node already in
    /// canonical form reports `(self, false, false)`.
    pub fn canonical(self) -> (Self, bool, bool) {
        let mut best = self;
        let (mut mirror, mut transpose) = (false, false);
        let candidates = [
            (self.mirrored(), true, false),
            (self.transposed(), false, true),
            (self.inverted(), true, true),
        ];
        for (candidate, m, t) in candidates {
            if candidate < best {
                best = candidate;
                mirror = m;
                transpose = t;
            }
        }
        (best, mirror, transpose)
    }

    /// Serialized size in bytes.
    pub fn bytes(&self) -> usize {
        self.left.bytes() + self.right.bytes()
    }

    /// Writes the left pointer, then the right pointer.
    pub fn serialize(&self, writer: &mut impl Write) -> Result<()> {
        self.left.serialize(writer)?;
        self.right.serialize(writer)
    }

    pub fn deserialize(reader: &mut impl Read) -> Result<Self> {
        let left = Pointer::deserialize(reader)?;
        let right = Pointer::deserialize(reader)?;
        Ok(Self::new(left, right))
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node<{}, {}>", self.left, self.right)
    }
}

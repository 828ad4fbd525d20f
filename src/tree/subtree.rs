//! Subtree handles: the descent-time view of a node or leaf.
//!
//! A node's total size and rank are not stored in the node itself; they are
//! reconstructed from the parent's cumulative counters and carried down the
//! recursion in a [`SubtreeRef`]. The handle is a plain value; all lookups
//! resolve against the tree's three packed arrays.

use super::BitVector;

/// A reference to the subtree rooted at a node or leaf.
///
/// `height` is the distance from the leaves: 0 for a leaf, `tree.height`
/// for the root. `size` and `rank` are the totals of the whole subtree,
/// propagated from the parent during descent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct SubtreeRef {
    /// Arena index (node arena for `height > 0`, leaf arena otherwise).
    pub index: usize,
    /// Distance from the leaves.
    pub height: usize,
    /// Total number of bits below this subtree.
    pub size: usize,
    /// Total number of set bits below this subtree.
    pub rank: usize,
}

impl SubtreeRef {
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.height == 0
    }
}

impl BitVector {
    /// Handle for the root node. The root's arena index is always 0.
    #[inline]
    pub(crate) fn root(&self) -> SubtreeRef {
        SubtreeRef {
            index: 0,
            height: self.height,
            size: self.size,
            rank: self.rank,
        }
    }

    /// First field index of `node`'s counter array.
    #[inline]
    pub(crate) fn counter_base(&self, node: usize) -> usize {
        node * self.params.degree
    }

    /// First field index of `node`'s pointer array.
    #[inline]
    pub(crate) fn pointer_base(&self, node: usize) -> usize {
        node * (self.params.degree + 1)
    }

    /// Cumulative size counter `k` of `node` (bits under children `0..=k`).
    #[inline]
    pub(crate) fn size_field(&self, node: usize, k: usize) -> usize {
        self.sizes.get(self.counter_base(node) + k) as usize
    }

    /// Cumulative rank counter `k` of `node`.
    #[inline]
    pub(crate) fn rank_field(&self, node: usize, k: usize) -> usize {
        self.ranks.get(self.counter_base(node) + k) as usize
    }

    /// Child pointer `k` of `node`; 0 is the null sentinel.
    #[inline]
    pub(crate) fn pointer(&self, node: usize, k: usize) -> usize {
        debug_assert!(k <= self.params.degree);
        self.pointers.get(self.pointer_base(node) + k) as usize
    }

    #[inline]
    pub(crate) fn set_pointer(&mut self, node: usize, k: usize, value: usize) {
        debug_assert!(k <= self.params.degree);
        self.pointers.set(self.pointer_base(node) + k, value as u64);
    }

    /// Handle for the `k`-th child of `t`, with its subtree size and rank
    /// reconstructed from `t`'s cumulative counters.
    pub(crate) fn child(&self, t: SubtreeRef, k: usize) -> SubtreeRef {
        let d = self.params.degree;
        debug_assert!(!t.is_leaf());
        debug_assert!(k <= d);

        let pointer = self.pointer(t.index, k);
        debug_assert!(pointer != 0, "child {} of node {} is null", k, t.index);

        let (size, rank) = if k == 0 {
            (self.size_field(t.index, 0), self.rank_field(t.index, 0))
        } else if k == d {
            (
                t.size - self.size_field(t.index, d - 1),
                t.rank - self.rank_field(t.index, d - 1),
            )
        } else {
            (
                self.size_field(t.index, k) - self.size_field(t.index, k - 1),
                self.rank_field(t.index, k) - self.rank_field(t.index, k - 1),
            )
        };

        SubtreeRef {
            index: pointer,
            height: t.height - 1,
            size,
            rank,
        }
    }

    /// The child where a bit can be *inserted* at `index`, and the index
    /// translated into that child.
    ///
    /// Selects the first child whose cumulative size reaches `index`, so an
    /// insertion at a child boundary targets the lower child's high end.
    pub(crate) fn find_insert_point(&self, t: SubtreeRef, index: usize) -> (usize, usize) {
        debug_assert!(!t.is_leaf());
        let base = self.counter_base(t.index);
        let child = self
            .sizes
            .find(base, base + self.params.degree, index as u64);

        let new_index = if child > 0 {
            index - self.size_field(t.index, child - 1)
        } else {
            index
        };
        (child, new_index)
    }

    /// The child holding the bit at `index`, and the index translated into
    /// that child.
    ///
    /// Same as [`find_insert_point`](Self::find_insert_point), except that
    /// an index sitting exactly at a child's high boundary belongs to the
    /// next child.
    pub(crate) fn find_child(&self, t: SubtreeRef, index: usize) -> (usize, usize) {
        let (child, new_index) = self.find_insert_point(t, index);
        if new_index == self.child(t, child).size {
            (child + 1, 0)
        } else {
            (child, new_index)
        }
    }

    /// Number of children of `t`.
    pub(crate) fn nchildren(&self, t: SubtreeRef) -> usize {
        debug_assert!(!t.is_leaf());
        if t.size == 0 {
            return 0;
        }
        self.find_insert_point(t, t.size).0 + 1
    }

    /// A leaf is full at 64 bits; a node is full with `degree + 1` children.
    pub(crate) fn subtree_full(&self, t: SubtreeRef) -> bool {
        if t.is_leaf() {
            t.size == 64
        } else {
            self.nchildren(t) == self.params.degree + 1
        }
    }
}

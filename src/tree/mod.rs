//! The packed B+-tree engine behind [`BitVector`].
//!
//! The tree keeps its nodes in three parallel [`PackedView`] arenas
//! (cumulative sizes, cumulative ranks, child pointers) and its leaves in a
//! plain word arena. Every descent step selects a child with one SWAR
//! subtraction over the node's packed size counters; insertion rebalances a
//! sliding window of siblings *before* descending, so no split ever
//! propagates upward.

#[cfg(not(test))]
use alloc::vec::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use core::fmt;

use crate::bitview::BitView;
use crate::broadword::{insert_bit_in_word, low_mask};
use crate::error::{Error, Result};
use crate::packed::PackedView;
use crate::popcount::popcount_word;

mod params;
mod subtree;

use params::TreeParams;
use subtree::SubtreeRef;

/// Default node width in bits (a multiple of the 64-bit word size).
pub const DEFAULT_NODE_WIDTH: u64 = 256;

/// A dynamic bit vector with logarithmic-time point access, point update
/// and insertion, stored as a packed B+-tree.
///
/// The vector is created with a fixed capacity; all arenas are sized once
/// at construction and insertion beyond the capacity fails with
/// [`Error::CapacityExceeded`]. Leaves are single 64-bit words; internal
/// nodes store cumulative child sizes and ranks in bit-packed counter
/// arrays, which makes child selection a constant-time SIMD-in-a-word
/// operation.
///
/// # Example
///
/// ```
/// use dynbits::BitVector;
///
/// let mut bv = BitVector::new(1024)?;
/// bv.push_back(true)?;
/// bv.push_back(false)?;
/// bv.insert(1, true)?;
///
/// assert_eq!(bv.size(), 3);
/// assert_eq!(bv.rank(), 2);
/// assert!(bv.access(0)? && bv.access(1)? && !bv.access(2)?);
/// # Ok::<(), dynbits::Error>(())
/// ```
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BitVector {
    params: TreeParams,
    /// Cumulative subtree sizes, `degree` counters per node.
    sizes: PackedView,
    /// Cumulative subtree ranks, `degree` counters per node.
    ranks: PackedView,
    /// Child pointers, `degree + 1` per node. Pointer 0 is the null
    /// sentinel (the leaf arena reserves index 0 for it).
    pointers: PackedView,
    /// Leaf arena; each leaf is one word holding up to 64 bits.
    leaves: Vec<u64>,
    free_node: usize,
    free_leaf: usize,
    size: usize,
    rank: usize,
    height: usize,
}

impl BitVector {
    /// Create an empty vector able to hold up to `capacity` bits, with the
    /// default node width.
    pub fn new(capacity: u64) -> Result<Self> {
        Self::with_node_width(capacity, DEFAULT_NODE_WIDTH)
    }

    /// Create an empty vector with an explicit node width.
    ///
    /// `node_width` must be a positive multiple of 64 and large enough to
    /// hold the counters derived from `capacity`; otherwise
    /// [`Error::InvalidArgument`] is returned.
    pub fn with_node_width(capacity: u64, node_width: u64) -> Result<Self> {
        let capacity = usize::try_from(capacity)
            .map_err(|_| Error::InvalidArgument("capacity does not fit in usize"))?;
        let node_width = usize::try_from(node_width)
            .map_err(|_| Error::InvalidArgument("node width does not fit in usize"))?;
        let params = TreeParams::new(capacity, node_width)?;

        let mut leaves = Vec::new();
        leaves.resize(params.leaf_slots + 1, 0);

        let mut tree = Self {
            sizes: PackedView::new(params.counter_width, params.node_slots * params.degree),
            ranks: PackedView::new(params.counter_width, params.node_slots * params.degree),
            pointers: PackedView::new(params.pointer_width, params.node_slots * (params.degree + 1)),
            leaves,
            free_node: 0,
            free_leaf: 1,
            size: 0,
            rank: 0,
            height: 1,
            params,
        };

        // The root always lives at node index 0; its first leaf is
        // allocated lazily by the first insertion.
        let root = tree.alloc_node()?;
        debug_assert!(root == 0);
        Ok(tree)
    }

    /// Number of bits currently stored.
    #[inline]
    pub fn size(&self) -> u64 {
        self.size as u64
    }

    /// Maximum number of bits the vector can hold.
    #[inline]
    pub fn capacity(&self) -> u64 {
        self.params.capacity as u64
    }

    /// Total number of set bits.
    #[inline]
    pub fn rank(&self) -> u64 {
        self.rank as u64
    }

    /// True if no bits are stored.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// True if the vector holds `capacity` bits.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.size == self.params.capacity
    }

    /// Height of the tree (distance of the root from the leaves).
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// The bit at position `index`.
    pub fn access(&self, index: u64) -> Result<bool> {
        if index >= self.size() {
            return Err(Error::IndexOutOfRange {
                index,
                len: self.size(),
            });
        }

        let mut t = self.root();
        let mut i = index as usize;
        while !t.is_leaf() {
            let (child, new_index) = self.find_child(t, i);
            t = self.child(t, child);
            i = new_index;
        }
        Ok((self.leaves[t.index] >> i) & 1 == 1)
    }

    /// Overwrite the bit at position `index`.
    ///
    /// A set that flips the bit updates the cumulative rank counters of
    /// every node on the descent path.
    pub fn set(&mut self, index: u64, bit: bool) -> Result<()> {
        if self.access(index)? == bit {
            return Ok(());
        }

        let d = self.params.degree;
        let mut t = self.root();
        let mut i = index as usize;
        while !t.is_leaf() {
            let (child, new_index) = self.find_child(t, i);
            let next = self.child(t, child);
            let base = self.counter_base(t.index);
            if bit {
                self.ranks.increment(base + child, base + d, 1);
            } else {
                self.ranks.decrement(base + child, base + d, 1);
            }
            t = next;
            i = new_index;
        }

        let word = &mut self.leaves[t.index];
        if bit {
            *word |= 1 << i;
            self.rank += 1;
        } else {
            *word &= !(1 << i);
            self.rank -= 1;
        }
        Ok(())
    }

    /// Insert `bit` at position `index`, shifting `[index, size)` one place
    /// toward higher indices.
    ///
    /// Fails with [`Error::IndexOutOfRange`] if `index > size`, and with
    /// [`Error::CapacityExceeded`] if the vector is full. Failed insertions
    /// commit no mutation.
    pub fn insert(&mut self, index: u64, bit: bool) -> Result<()> {
        if index > self.size() {
            return Err(Error::IndexOutOfRange {
                index,
                len: self.size(),
            });
        }
        if self.size >= self.params.capacity {
            return Err(Error::CapacityExceeded {
                capacity: self.capacity(),
            });
        }
        // Reserve every arena slot this insertion could possibly claim, so
        // no allocation can fail after the first counter is touched.
        self.reserve_slots()?;

        if self.subtree_full(self.root()) {
            self.promote_root()?;
        }
        self.insert_at(self.root(), index as usize, bit)?;

        self.size += 1;
        if bit {
            self.rank += 1;
        }
        Ok(())
    }

    /// Iterate over all stored bits in order.
    ///
    /// The iterator walks the leaves left to right, re-descending only at
    /// leaf boundaries.
    pub fn iter(&self) -> BitIter<'_> {
        BitIter {
            tree: self,
            position: 0,
            word: 0,
            remaining: 0,
        }
    }

    /// Append a bit; equivalent to `insert(size, bit)`.
    #[inline]
    pub fn push_back(&mut self, bit: bool) -> Result<()> {
        self.insert(self.size(), bit)
    }

    /// Prepend a bit; equivalent to `insert(0, bit)`.
    #[inline]
    pub fn push_front(&mut self, bit: bool) -> Result<()> {
        self.insert(0, bit)
    }

    // ------------------------------------------------------------------
    // Arena allocation
    // ------------------------------------------------------------------

    /// Node slots currently allocated in the packed arenas.
    #[inline]
    fn node_slots(&self) -> usize {
        self.sizes.len() / self.params.degree
    }

    fn alloc_node(&mut self) -> Result<usize> {
        if self.free_node >= self.node_slots() {
            return Err(Error::CapacityExceeded {
                capacity: self.capacity(),
            });
        }
        self.free_node += 1;
        Ok(self.free_node - 1)
    }

    fn alloc_leaf(&mut self) -> Result<usize> {
        if self.free_leaf >= self.leaves.len() {
            return Err(Error::CapacityExceeded {
                capacity: self.capacity(),
            });
        }
        self.free_leaf += 1;
        Ok(self.free_leaf - 1)
    }

    /// Ensure the arenas can absorb a whole insertion before any of its
    /// mutations land: one promotion copy plus at most one split per level,
    /// and up to two leaves. Arenas grow append-only on demand; an index
    /// that would no longer fit in a pointer field is a hard capacity
    /// limit.
    fn reserve_slots(&mut self) -> Result<()> {
        let d = self.params.degree;
        let pointer_space = 1usize << self.params.pointer_width;

        let nodes_needed = self.free_node + self.height + 2;
        if nodes_needed > self.node_slots() {
            if nodes_needed > pointer_space {
                return Err(Error::CapacityExceeded {
                    capacity: self.capacity(),
                });
            }
            let grown = nodes_needed
                .max(self.node_slots() + self.node_slots() / 2)
                .min(pointer_space);
            self.sizes.resize(grown * d);
            self.ranks.resize(grown * d);
            self.pointers.resize(grown * (d + 1));
        }

        let leaves_needed = self.free_leaf + 2;
        if leaves_needed > self.leaves.len() {
            if leaves_needed > pointer_space {
                return Err(Error::CapacityExceeded {
                    capacity: self.capacity(),
                });
            }
            let grown = leaves_needed
                .max(self.leaves.len() + self.leaves.len() / 2)
                .min(pointer_space);
            self.leaves.resize(grown, 0);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Insertion
    // ------------------------------------------------------------------

    /// Grow the tree by one level: the root's contents move to a fresh
    /// arena slot which becomes the root's single child. The root's own
    /// arena index never changes.
    fn promote_root(&mut self) -> Result<()> {
        let d = self.params.degree;
        let copy = self.alloc_node()?;

        let src = self.counter_base(0);
        let dst = self.counter_base(copy);
        self.sizes.copy_within(src, src + d, dst, dst + d);
        self.ranks.copy_within(src, src + d, dst, dst + d);
        let psrc = self.pointer_base(0);
        let pdst = self.pointer_base(copy);
        self.pointers.copy_within(psrc, psrc + d + 1, pdst, pdst + d + 1);

        // Reinitialize the root with the copy as its only child: every
        // cumulative counter holds the full subtree totals.
        self.sizes.broadcast(src, src + d, self.size as u64);
        self.ranks.broadcast(src, src + d, self.rank as u64);
        self.pointers.set(psrc, copy as u64);
        self.pointers.broadcast(psrc + 1, psrc + d + 1, 0);

        self.height += 1;
        Ok(())
    }

    /// Add `+1` to the size counters (and `bit` to the rank counters) of
    /// `t`'s fields `[child, degree)`.
    fn bump_counters(&mut self, t: SubtreeRef, child: usize, bit: bool) {
        let base = self.counter_base(t.index);
        let end = base + self.params.degree;
        self.sizes.increment(base + child, end, 1);
        if bit {
            self.ranks.increment(base + child, end, 1);
        }
    }

    /// Insert into the subtree of `t`, which the caller guarantees is not
    /// full. The propagated `t.size`/`t.rank` are pre-insertion totals.
    fn insert_at(&mut self, t: SubtreeRef, index: usize, bit: bool) -> Result<()> {
        debug_assert!(!t.is_leaf());
        debug_assert!(!self.subtree_full(t));
        debug_assert!(index <= t.size);

        let (mut child, mut new_index) = self.find_insert_point(t, index);

        if t.height == 1 {
            if self.pointer(t.index, child) == 0 {
                // Only an empty root has no first leaf yet.
                debug_assert!(t.size == 0 && child == 0);
                let leaf = self.alloc_leaf()?;
                self.set_pointer(t.index, 0, leaf);
            }

            if self.child(t, child).size == 64 {
                self.rebalance_leaves(t, child)?;
                let (c, i) = self.find_insert_point(t, index);
                child = c;
                new_index = i;
            }

            let leaf = self.pointer(t.index, child);
            self.bump_counters(t, child, bit);
            self.leaves[leaf] = insert_bit_in_word(self.leaves[leaf], new_index, bit);
        } else {
            if self.subtree_full(self.child(t, child)) {
                self.rebalance_nodes(t, child)?;
                let (c, i) = self.find_insert_point(t, index);
                child = c;
                new_index = i;
            }

            let next = self.child(t, child);
            self.bump_counters(t, child, bit);
            self.insert_at(next, new_index, bit)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Local rebalancing
    // ------------------------------------------------------------------

    /// Insert a new empty child slot at position `pos` of node `t`,
    /// shifting the subsequent counters and pointers one field up in
    /// place. Allocates the child's arena slot and returns its index.
    fn insert_child(&mut self, t: SubtreeRef, pos: usize) -> Result<usize> {
        let d = self.params.degree;
        debug_assert!(pos >= 1 && pos <= d);
        debug_assert!(!self.subtree_full(t));

        // Allocate before shifting anything, so a failure leaves the node
        // untouched.
        let slot = if t.height == 1 {
            self.alloc_leaf()?
        } else {
            self.alloc_node()?
        };

        let base = self.counter_base(t.index);
        // new_sizes[pos] = sizes[pos - 1] (the new child is empty), and
        // everything above moves up one field.
        self.sizes
            .copy_within(base + pos - 1, base + d - 1, base + pos, base + d);
        self.ranks
            .copy_within(base + pos - 1, base + d - 1, base + pos, base + d);

        let pbase = self.pointer_base(t.index);
        self.pointers
            .copy_within(pbase + pos, pbase + d, pbase + pos + 1, pbase + d + 1);
        self.pointers.set(pbase + pos, slot as u64);
        Ok(slot)
    }

    /// Choose the contiguous window of `width` existing children of `t`
    /// containing `child` that has the most free bits. Returns
    /// `(begin, occupied_bits)`; leaf occupancies come straight from the
    /// cumulative size counters.
    fn find_leaf_window(&self, t: SubtreeRef, child: usize, width: usize) -> (usize, usize) {
        let children = self.nchildren(t);
        let lo = child.saturating_sub(width - 1);
        let hi = child.min(children - width);

        let window_occupancy = |p: usize| {
            let high = self.size_field(t.index, p + width - 1);
            let low = if p > 0 {
                self.size_field(t.index, p - 1)
            } else {
                0
            };
            high - low
        };

        let mut best = lo;
        let mut best_occ = window_occupancy(lo);
        for p in lo + 1..=hi {
            let occ = window_occupancy(p);
            if occ < best_occ {
                best = p;
                best_occ = occ;
            }
        }
        (best, best_occ)
    }

    /// Same as [`find_leaf_window`](Self::find_leaf_window) for internal
    /// children, weighing each candidate child by its child count. The
    /// window sum is maintained incrementally while sliding.
    fn find_node_window(&self, t: SubtreeRef, child: usize, width: usize) -> (usize, usize) {
        let children = self.nchildren(t);
        let lo = child.saturating_sub(width - 1);
        let hi = child.min(children - width);

        let weights: Vec<usize> = (lo..hi + width)
            .map(|j| self.nchildren(self.child(t, j)))
            .collect();

        let mut occ: usize = weights[..width].iter().sum();
        let mut best = lo;
        let mut best_occ = occ;
        for p in lo + 1..=hi {
            occ = occ - weights[p - 1 - lo] + weights[p - 1 - lo + width];
            if occ < best_occ {
                best = p;
                best_occ = occ;
            }
        }
        (best, best_occ)
    }

    /// Make room around a full leaf: redistribute the bits of a window of
    /// sibling leaves evenly, splitting off one extra leaf first when the
    /// window is saturated.
    fn rebalance_leaves(&mut self, t: SubtreeRef, child: usize) -> Result<()> {
        debug_assert!(t.height == 1);
        let width = self.params.buffer.min(self.nchildren(t));
        let (begin, occupied) = self.find_leaf_window(t, child, width);

        let mut slots = width;
        if occupied >= width * (64 - width) {
            self.insert_child(t, begin + width)?;
            slots += 1;
        }
        self.spread_leaf_bits(t, begin, begin + slots, occupied);
        Ok(())
    }

    /// Rewrite the leaves of children `[begin, end)` of `t` from a gathered
    /// bit buffer, distributing `total` bits as evenly as possible (the
    /// remainder goes to the first leaves), and rebuild the window's
    /// cumulative counters.
    fn spread_leaf_bits(&mut self, t: SubtreeRef, begin: usize, end: usize, total: usize) {
        let slots = end - begin;
        let mut buffer = BitView::new(total);
        let mut offset = 0;
        for j in begin..end {
            let leaf = self.child(t, j);
            buffer.set(offset, offset + leaf.size, self.leaves[leaf.index]);
            offset += leaf.size;
        }
        debug_assert!(offset == total);

        let per_leaf = total / slots;
        let remainder = total % slots;
        debug_assert!(per_leaf >= 1);

        let base = self.counter_base(t.index);
        let mut cum_size = if begin > 0 {
            self.size_field(t.index, begin - 1)
        } else {
            0
        };
        let mut cum_rank = if begin > 0 {
            self.rank_field(t.index, begin - 1)
        } else {
            0
        };

        let mut offset = 0;
        for (i, j) in (begin..end).enumerate() {
            let take = per_leaf + usize::from(i < remainder);
            let word = buffer.get(offset, offset + take);
            offset += take;

            let leaf = self.pointer(t.index, j);
            self.leaves[leaf] = word;
            cum_size += take;
            cum_rank += popcount_word(word) as usize;
            // The last child's cumulative counter is implied by the node
            // totals and has no field of its own.
            if j < self.params.degree {
                self.sizes.set(base + j, cum_size as u64);
                self.ranks.set(base + j, cum_rank as u64);
            }
        }
    }

    /// Make room around a full internal child: redistribute whole child
    /// pointers (with their size/rank triples) across a window of sibling
    /// nodes, splitting off one extra node first when the window is
    /// saturated.
    fn rebalance_nodes(&mut self, t: SubtreeRef, child: usize) -> Result<()> {
        debug_assert!(t.height >= 2);
        let width = self.params.buffer.min(self.nchildren(t));
        let (begin, occupied) = self.find_node_window(t, child, width);

        let mut slots = width;
        if occupied >= width * (self.params.degree + 1 - width) {
            self.insert_child(t, begin + width)?;
            slots += 1;
        }
        self.spread_children(t, begin, begin + slots, occupied);
        Ok(())
    }

    /// Redistribute `total` grandchildren over children `[begin, end)` of
    /// `t`, rebuilding each child's cumulative counter arrays and the
    /// window's counters in `t`.
    fn spread_children(&mut self, t: SubtreeRef, begin: usize, end: usize, total: usize) {
        let d = self.params.degree;
        let slots = end - begin;

        let mut entries: Vec<(usize, usize, usize)> = Vec::with_capacity(total);
        for j in begin..end {
            let node = self.child(t, j);
            for m in 0..self.nchildren(node) {
                let grandchild = self.child(node, m);
                entries.push((
                    grandchild.size,
                    grandchild.rank,
                    self.pointer(node.index, m),
                ));
            }
        }
        debug_assert!(entries.len() == total);

        let per_node = total / slots;
        let remainder = total % slots;
        debug_assert!(per_node >= 1);

        let tbase = self.counter_base(t.index);
        let mut parent_size = if begin > 0 {
            self.size_field(t.index, begin - 1)
        } else {
            0
        };
        let mut parent_rank = if begin > 0 {
            self.rank_field(t.index, begin - 1)
        } else {
            0
        };

        let mut next = 0;
        for (i, j) in (begin..end).enumerate() {
            let take = per_node + usize::from(i < remainder);
            let node = self.pointer(t.index, j);
            let base = self.counter_base(node);
            let pbase = self.pointer_base(node);

            let mut cum_size = 0usize;
            let mut cum_rank = 0usize;
            for m in 0..take {
                let (size, rank, pointer) = entries[next];
                next += 1;
                cum_size += size;
                cum_rank += rank;
                self.sizes.set(base + m, cum_size as u64);
                self.ranks.set(base + m, cum_rank as u64);
                self.pointers.set(pbase + m, pointer as u64);
            }
            // Cumulative counters go flat after the last child; unused
            // pointer slots are nulled.
            self.sizes.broadcast(base + take, base + d, cum_size as u64);
            self.ranks.broadcast(base + take, base + d, cum_rank as u64);
            self.pointers.broadcast(pbase + take, pbase + d + 1, 0);

            parent_size += cum_size;
            parent_rank += cum_rank;
            if j < d {
                self.sizes.set(tbase + j, parent_size as u64);
                self.ranks.set(tbase + j, parent_rank as u64);
            }
        }
        debug_assert!(next == total);
    }

    // ------------------------------------------------------------------
    // Validation walks (test support)
    // ------------------------------------------------------------------

    /// Assert the structural invariants of the whole tree: cumulative
    /// counters consistent with the subtrees below them, counter tails
    /// flat, degree caps respected, leaf words clean above their length,
    /// and the scalar totals in agreement.
    #[doc(hidden)]
    pub fn check_invariants(&self) {
        let (size, rank) = self.check_subtree(self.root(), true);
        assert_eq!(size, self.size, "tree size disagrees with leaf total");
        assert_eq!(rank, self.rank, "tree rank disagrees with leaf total");
    }

    fn check_subtree(&self, t: SubtreeRef, is_root: bool) -> (usize, usize) {
        if t.is_leaf() {
            assert!(t.index != 0, "leaf resolved to the null sentinel");
            assert!(t.size >= 1 && t.size <= 64, "leaf size {} invalid", t.size);
            let word = self.leaves[t.index];
            assert_eq!(word & !low_mask(t.size), 0, "dirty bits above leaf end");
            let rank = popcount_word(word) as usize;
            assert_eq!(rank, t.rank, "leaf rank mismatch");
            return (t.size, rank);
        }

        let d = self.params.degree;
        let children = self.nchildren(t);
        assert!(children <= d + 1, "node over degree cap");
        if !is_root {
            assert!(children >= 1, "non-root node with no children");
        }

        let mut cum_size = 0;
        let mut cum_rank = 0;
        for k in 0..children {
            let child = self.child(t, k);
            let (size, rank) = self.check_subtree(child, false);
            assert_eq!(size, child.size, "cumulative size broken at child {}", k);
            assert_eq!(rank, child.rank, "cumulative rank broken at child {}", k);
            cum_size += size;
            cum_rank += rank;
            if k < d {
                assert_eq!(self.size_field(t.index, k), cum_size);
                assert_eq!(self.rank_field(t.index, k), cum_rank);
            }
        }
        for k in children.max(1) - 1..d {
            assert_eq!(self.size_field(t.index, k), cum_size, "tail not flat");
            assert_eq!(self.rank_field(t.index, k), cum_rank, "tail not flat");
        }
        (cum_size, cum_rank)
    }

    /// Assert the steady-state occupancy floors: every non-root leaf holds
    /// at least `b(64-b)/(b+1)` bits and every non-root internal node has
    /// at least `ceil((d+1)/b)` children. Only meaningful once the tree has
    /// grown past its root-only phase (e.g. when filled to capacity).
    #[doc(hidden)]
    pub fn check_occupancy(&self) {
        self.check_occupancy_below(self.root(), true);
    }

    fn check_occupancy_below(&self, t: SubtreeRef, is_root: bool) {
        if t.is_leaf() {
            if !is_root {
                assert!(
                    t.size >= self.params.leaf_floor(),
                    "leaf of {} bits below the occupancy floor {}",
                    t.size,
                    self.params.leaf_floor()
                );
            }
            return;
        }
        let children = self.nchildren(t);
        if !is_root {
            assert!(
                children >= self.params.node_floor(),
                "node with {} children below the occupancy floor {}",
                children,
                self.params.node_floor()
            );
        }
        for k in 0..children {
            self.check_occupancy_below(self.child(t, k), false);
        }
    }
}

impl<'a> IntoIterator for &'a BitVector {
    type Item = bool;
    type IntoIter = BitIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the bits of a [`BitVector`].
pub struct BitIter<'a> {
    tree: &'a BitVector,
    /// Global index of the next bit.
    position: usize,
    /// Current leaf word, shifted so the next bit sits at bit 0.
    word: u64,
    /// Bits left in the current leaf.
    remaining: usize,
}

impl<'a> Iterator for BitIter<'a> {
    type Item = bool;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.tree.size {
            return None;
        }
        if self.remaining == 0 {
            let mut t = self.tree.root();
            let mut i = self.position;
            while !t.is_leaf() {
                let (child, new_index) = self.tree.find_child(t, i);
                t = self.tree.child(t, child);
                i = new_index;
            }
            self.word = self.tree.leaves[t.index] >> i;
            self.remaining = t.size - i;
        }

        let bit = self.word & 1 == 1;
        self.word >>= 1;
        self.remaining -= 1;
        self.position += 1;
        Some(bit)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.tree.size - self.position;
        (remaining, Some(remaining))
    }
}

impl<'a> ExactSizeIterator for BitIter<'a> {}

impl fmt::Debug for BitVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitVector")
            .field("capacity", &self.params.capacity)
            .field("node_width", &self.params.node_width)
            .field("size", &self.size)
            .field("rank", &self.rank)
            .field("height", &self.height)
            .field("degree", &self.params.degree)
            .field("buffer", &self.params.buffer)
            .field("counter_width", &self.params.counter_width)
            .field("pointer_width", &self.params.pointer_width)
            .field("nodes", &self.free_node)
            .field("leaves", &(self.free_leaf - 1))
            .finish()
    }
}

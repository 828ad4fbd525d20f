//! Capacity-derived geometry of the packed B+-tree.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::broadword::bit_len;
use crate::error::{Error, Result};

/// Smallest `r` with `r * r >= n`.
fn ceil_sqrt(n: usize) -> usize {
    let mut r = 0;
    while r * r < n {
        r += 1;
    }
    r
}

/// Geometry parameters of a tree, fixed at construction.
///
/// Every quantity is derived from the requested capacity `N` and node width
/// `W_n`:
///
/// - `counter_width` is one bit more than needed to store `N`, reserving
///   the high flag bit of every counter field for the SWAR child search.
/// - `degree` (`d`) is the number of counters a node word group can hold;
///   nodes have up to `d + 1` children.
/// - `buffer` (`b`, roughly `sqrt(d)`) is the number of siblings involved
///   in a local rebalance.
/// - The arena bounds (`node_slots`, `leaf_slots`) are conservative upper
///   bounds with slack, so bump allocation cannot fail while the vector
///   holds fewer than `N` bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub(crate) struct TreeParams {
    /// Maximum number of bits stored in the vector.
    pub capacity: usize,
    /// Number of bits used for one node's counter array.
    pub node_width: usize,
    /// Bit width of the size/rank counter fields.
    pub counter_width: usize,
    /// Bit width of the child pointer fields.
    pub pointer_width: usize,
    /// Number of counters per node; children per node is `degree + 1`.
    pub degree: usize,
    /// Number of siblings in a rebalance window.
    pub buffer: usize,
    /// Internal node arena bound.
    pub node_slots: usize,
    /// Leaf arena bound, excluding the null sentinel at index 0.
    pub leaf_slots: usize,
}

impl TreeParams {
    pub fn new(capacity: usize, node_width: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidArgument("capacity must be positive"));
        }
        if node_width == 0 || node_width % 64 != 0 {
            return Err(Error::InvalidArgument(
                "node width must be a positive multiple of 64",
            ));
        }

        // One extra bit so that a counter holding exactly `capacity` keeps
        // its flag bit clear.
        let counter_width = bit_len(capacity as u64) + 1;
        let degree = node_width / counter_width;
        if degree < 2 {
            return Err(Error::InvalidArgument(
                "node width too small for the capacity's counters",
            ));
        }

        let mut buffer = ceil_sqrt(degree).max(1);
        while buffer > 1 && (degree + 1) / buffer < buffer {
            buffer -= 1;
        }

        // A full-width window split leaves every leaf at the occupancy
        // floor; the floor bounds the number of leaves ever in use. The
        // extra slots absorb the under-filled leaves of a small tree.
        let leaf_floor = (buffer * (64 - buffer) / (buffer + 1)).max(1);
        let leaf_slots = capacity.div_ceil(leaf_floor) + buffer + 2;

        // Every rebalance window holds at least one full node, so each
        // level averages at least (d + 1) / (b + 1) children per node; one
        // slack slot per level covers root promotion copies. The arenas can
        // still grow past these estimates within the pointer space.
        let mut node_slots = 0;
        let mut level = leaf_slots;
        while level > 1 {
            let mut next = (level * (buffer + 1)).div_ceil(degree + 1) + 1;
            if next >= level {
                next = level - 1;
            }
            node_slots += next;
            level = next;
        }
        node_slots += 4;

        // The widest pointer the node layout can afford; one bit of
        // headroom over the estimate leaves room for on-demand growth.
        let affordable = counter_width.min(node_width / (degree + 1));
        let needed = bit_len(node_slots.max(leaf_slots + 1) as u64).max(1);
        if needed > affordable {
            return Err(Error::InvalidArgument(
                "pointer width exceeds counter width; capacity too small for this node width",
            ));
        }
        let pointer_width = (needed + 1).min(affordable);

        Ok(Self {
            capacity,
            node_width,
            counter_width,
            pointer_width,
            degree,
            buffer,
            node_slots,
            leaf_slots,
        })
    }

    /// Minimum bit count of a leaf in a steady-state tree.
    #[inline]
    pub fn leaf_floor(&self) -> usize {
        self.buffer * (64 - self.buffer) / (self.buffer + 1)
    }

    /// Minimum child count of a non-root internal node in a steady-state
    /// tree.
    #[inline]
    pub fn node_floor(&self) -> usize {
        (self.degree + 1).div_ceil(self.buffer)
    }
}

//! Property-based tests for the bit vector and its underlying layers.

use proptest::prelude::*;

use dynbits::{BitVector, PackedView};

proptest! {
    /// Inserting into the vector and a plain Vec<bool> ground truth leaves
    /// them identical, with matching size and rank.
    #[test]
    fn prop_insert_matches_reference(
        ops in prop::collection::vec((0.0..1.0f64, any::<bool>()), 1..300)
    ) {
        let mut bv = BitVector::new(4096).unwrap();
        let mut reference: Vec<bool> = Vec::new();

        for (ratio, bit) in ops {
            let position = (ratio * (reference.len() + 1) as f64) as usize;
            let position = position.min(reference.len());
            bv.insert(position as u64, bit).unwrap();
            reference.insert(position, bit);
        }

        prop_assert_eq!(bv.size(), reference.len() as u64);
        prop_assert_eq!(bv.rank(), reference.iter().filter(|&&b| b).count() as u64);
        for (k, &bit) in reference.iter().enumerate() {
            prop_assert_eq!(bv.access(k as u64).unwrap(), bit, "bit {}", k);
        }
        bv.check_invariants();
    }

    /// push_back(b0); push_back(b1); ... ; access(k) == b_k.
    #[test]
    fn prop_push_back_access(bits in prop::collection::vec(any::<bool>(), 1..600)) {
        let mut bv = BitVector::with_node_width(2048, 64).unwrap();
        for &bit in &bits {
            bv.push_back(bit).unwrap();
        }
        for (k, &bit) in bits.iter().enumerate() {
            prop_assert_eq!(bv.access(k as u64).unwrap(), bit, "bit {}", k);
        }
        bv.check_invariants();
    }

    /// Setting bits matches the reference and keeps rank consistent.
    #[test]
    fn prop_set_matches_reference(
        len in 1..500usize,
        sets in prop::collection::vec((0.0..1.0f64, any::<bool>()), 1..100)
    ) {
        let mut bv = BitVector::new(4096).unwrap();
        let mut reference = vec![false; len];
        for _ in 0..len {
            bv.push_back(false).unwrap();
        }

        for (ratio, bit) in sets {
            let position = ((ratio * len as f64) as usize).min(len - 1);
            bv.set(position as u64, bit).unwrap();
            reference[position] = bit;
        }

        prop_assert_eq!(bv.rank(), reference.iter().filter(|&&b| b).count() as u64);
        for (k, &bit) in reference.iter().enumerate() {
            prop_assert_eq!(bv.access(k as u64).unwrap(), bit, "bit {}", k);
        }
        bv.check_invariants();
    }

    /// A single insert shifts the suffix up by exactly one position.
    #[test]
    fn prop_insert_shifts_suffix(
        bits in prop::collection::vec(any::<bool>(), 1..300),
        ratio in 0.0..1.0f64,
        bit in any::<bool>()
    ) {
        let mut bv = BitVector::new(2048).unwrap();
        for &b in &bits {
            bv.push_back(b).unwrap();
        }

        let position = ((ratio * (bits.len() + 1) as f64) as usize).min(bits.len());
        bv.insert(position as u64, bit).unwrap();

        prop_assert_eq!(bv.access(position as u64).unwrap(), bit);
        for k in 0..position {
            prop_assert_eq!(bv.access(k as u64).unwrap(), bits[k]);
        }
        for k in position..bits.len() {
            prop_assert_eq!(bv.access(k as u64 + 1).unwrap(), bits[k]);
        }
    }
}

proptest! {
    /// broadcast writes the same value into every field of the range.
    #[test]
    fn prop_broadcast_law(
        width in 1..30usize,
        len in 1..80usize,
        value in any::<u64>()
    ) {
        let value = value & ((1 << width) - 1);
        let mut view = PackedView::new(width, len);
        view.broadcast(0, len, value);
        for k in 0..len {
            prop_assert_eq!(view.get(k), value, "field {}", k);
        }
    }

    /// increment adds n to every field in the range and nothing else.
    #[test]
    fn prop_increment_law(
        width in 5..30usize,
        len in 2..60usize,
        seed in any::<u64>(),
        n in 0..8u64
    ) {
        let cap = 1u64 << (width - 1);
        let mut view = PackedView::new(width, len);
        let before: Vec<u64> = (0..len)
            .map(|k| seed.wrapping_mul(k as u64 + 1) % (cap - 8))
            .collect();
        for (k, &v) in before.iter().enumerate() {
            view.set(k, v);
        }

        let a = len / 3;
        let b = len;
        view.increment(a, b, n);
        for (k, &v) in before.iter().enumerate() {
            let expect = if (a..b).contains(&k) { v + n } else { v };
            prop_assert_eq!(view.get(k), expect, "field {}", k);
        }
    }

    /// find agrees with a linear scan on monotone fields.
    #[test]
    fn prop_find_matches_linear(
        width in 4..30usize,
        mut values in prop::collection::vec(any::<u64>(), 1..60),
        threshold in any::<u64>()
    ) {
        let cap = 1u64 << (width - 1);
        for v in values.iter_mut() {
            *v %= cap;
        }
        values.sort_unstable();
        let threshold = threshold % cap;

        let mut view = PackedView::new(width, values.len());
        for (k, &v) in values.iter().enumerate() {
            view.set(k, v);
        }

        let expect = values
            .iter()
            .position(|&v| v >= threshold)
            .unwrap_or(values.len());
        prop_assert_eq!(view.find(0, values.len(), threshold), expect);
    }
}

//! Fixed-width packed integer fields over a [`BitView`].
//!
//! [`PackedView`] presents a word buffer as a dense array of equal-width
//! unsigned fields and adds the aggregate operations the B+-tree nodes
//! need: broadcast assignment, SIMD-in-a-word increment/decrement of a field
//! range, and the flag-bit threshold search that selects a child with a
//! single subtraction and popcount per word.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::bitview::BitView;
use crate::broadword::{count_fields_at_least, field_low_mask, low_mask};

/// A sequence of `len` fields of `width` bits each, stored contiguously in
/// a [`BitView`].
///
/// Fields may straddle word boundaries; aggregate operations chunk the
/// range by whole fields (`64 / width` fields per step) and rely on the
/// view's unaligned range accessors, so no field is ever processed in two
/// halves.
///
/// # SWAR preconditions
///
/// [`increment`](Self::increment) requires that no field overflows its
/// width; [`find`](Self::find) additionally requires every field to keep
/// its high "flag" bit zero (value `< 2^(width-1)`) and the fields of the
/// searched range to be monotone non-decreasing. Violations are fatal in
/// debug builds and undefined in release.
///
/// # Example
///
/// ```
/// use dynbits::PackedView;
///
/// let mut fields = PackedView::new(13, 40);
/// fields.broadcast(0, 40, 7);
/// fields.increment(10, 20, 2);
/// assert_eq!(fields.get(9), 7);
/// assert_eq!(fields.get(10), 9);
/// ```
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PackedView {
    bits: BitView,
    width: usize,
    len: usize,
    field_low: u64,
}

impl PackedView {
    /// Create a zeroed view of `len` fields of `width` bits each.
    ///
    /// `width` must be in `1..=64`.
    pub fn new(width: usize, len: usize) -> Self {
        assert!((1..=64).contains(&width), "field width must be in 1..=64");
        Self {
            bits: BitView::new(width * len),
            width,
            len,
            field_low: field_low_mask(width),
        }
    }

    /// Number of fields.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if the view has no fields.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Width of each field in bits.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// The underlying bit view.
    #[inline]
    pub fn bits(&self) -> &BitView {
        &self.bits
    }

    /// Whole fields that fit in one 64-bit chunk.
    #[inline]
    fn fields_per_chunk(&self) -> usize {
        64 / self.width
    }

    /// Grow the view to `len` fields, zeroing the new ones.
    ///
    /// Growth is append-only: existing fields keep their indices and
    /// contents. Shrinking is not supported.
    pub fn resize(&mut self, len: usize) {
        debug_assert!(len >= self.len);
        self.bits.resize(self.width * len);
        self.len = len;
    }

    /// The field at index `i`.
    #[inline]
    pub fn get(&self, i: usize) -> u64 {
        debug_assert!(i < self.len);
        self.bits.get(i * self.width, (i + 1) * self.width)
    }

    /// Overwrite the field at index `i` with the low `width` bits of `value`.
    #[inline]
    pub fn set(&mut self, i: usize, value: u64) {
        debug_assert!(i < self.len);
        debug_assert!(self.width == 64 || value < 1 << self.width);
        self.bits.set(i * self.width, (i + 1) * self.width, value);
    }

    /// The packed word composed of fields `[a, b)`, field `a` lowest.
    ///
    /// Requires `(b - a) * width <= 64`.
    #[inline]
    pub fn get_range(&self, a: usize, b: usize) -> u64 {
        debug_assert!(a <= b && b <= self.len);
        debug_assert!((b - a) * self.width <= 64);
        self.bits.get(a * self.width, b * self.width)
    }

    /// Overwrite fields `[a, b)` with a pre-packed payload.
    ///
    /// Requires `(b - a) * width <= 64`.
    #[inline]
    pub fn set_range(&mut self, a: usize, b: usize, packed: u64) {
        debug_assert!(a <= b && b <= self.len);
        debug_assert!((b - a) * self.width <= 64);
        self.bits.set(a * self.width, b * self.width, packed);
    }

    /// Write `value` into every field of `[a, b)`.
    ///
    /// The splat pattern is `field_low_mask * value`, written one chunk of
    /// whole fields at a time.
    pub fn broadcast(&mut self, a: usize, b: usize, value: u64) {
        debug_assert!(a <= b && b <= self.len);
        debug_assert!(self.width == 64 || value < 1 << self.width);

        let pattern = self.field_low.wrapping_mul(value);
        let step = self.fields_per_chunk();
        let mut i = a;
        while i < b {
            let n = step.min(b - i);
            self.bits.set(i * self.width, (i + n) * self.width, pattern);
            i += n;
        }
    }

    /// Add `n` to every field of `[a, b)` simultaneously.
    ///
    /// The caller asserts that no field overflows its width.
    pub fn increment(&mut self, a: usize, b: usize, n: u64) {
        debug_assert!(a <= b && b <= self.len);
        #[cfg(debug_assertions)]
        for i in a..b {
            debug_assert!(
                self.width == 64 || self.get(i) + n < 1 << self.width,
                "field {} overflows its width",
                i
            );
        }

        let step = self.fields_per_chunk();
        let mut i = a;
        while i < b {
            let fields = step.min(b - i);
            let begin = i * self.width;
            let end = (i + fields) * self.width;
            let pattern = self.field_low.wrapping_mul(n) & low_mask(fields * self.width);
            let chunk = self.bits.get(begin, end).wrapping_add(pattern);
            self.bits.set(begin, end, chunk);
            i += fields;
        }
    }

    /// Subtract `n` from every field of `[a, b)` simultaneously.
    ///
    /// Each field must hold at least `n`, so no borrow crosses into the
    /// next field.
    pub fn decrement(&mut self, a: usize, b: usize, n: u64) {
        debug_assert!(a <= b && b <= self.len);
        #[cfg(debug_assertions)]
        for i in a..b {
            debug_assert!(self.get(i) >= n, "field {} underflows", i);
        }

        let step = self.fields_per_chunk();
        let mut i = a;
        while i < b {
            let fields = step.min(b - i);
            let begin = i * self.width;
            let end = (i + fields) * self.width;
            let pattern = self.field_low.wrapping_mul(n) & low_mask(fields * self.width);
            let chunk = self.bits.get(begin, end).wrapping_sub(pattern);
            self.bits.set(begin, end, chunk);
            i += fields;
        }
    }

    /// Smallest `k` (relative to `a`) with `field[a + k] >= threshold`,
    /// or `b - a` if no field of `[a, b)` reaches the threshold.
    ///
    /// The fields of the range must be monotone non-decreasing with flag
    /// bits clear, and `threshold` must fit below the flag bit. Each chunk
    /// is resolved with one broadcast subtraction and one popcount.
    pub fn find(&self, a: usize, b: usize, threshold: u64) -> usize {
        debug_assert!(a <= b && b <= self.len);
        debug_assert!(self.width < 2 || threshold < 1 << (self.width - 1));

        let step = self.fields_per_chunk();
        let mut i = a;
        while i < b {
            let fields = step.min(b - i);
            let chunk = self.bits.get(i * self.width, (i + fields) * self.width);
            let at_least =
                count_fields_at_least(chunk, threshold, self.width, fields, self.field_low);
            if at_least > 0 {
                // Monotone fields: the matches occupy the chunk's suffix.
                return i - a + fields - at_least;
            }
            i += fields;
        }
        b - a
    }

    /// Copy fields `[src_a, src_b)` over fields `[dest_a, dest_b)` of the
    /// same view, truncating the source if the destination is shorter.
    ///
    /// Overlapping ranges are legal; the underlying bit copy picks the safe
    /// direction.
    pub fn copy_within(&mut self, src_a: usize, src_b: usize, dest_a: usize, dest_b: usize) {
        debug_assert!(src_a <= src_b && src_b <= self.len);
        debug_assert!(dest_a <= dest_b && dest_b <= self.len);
        self.bits.copy_within(
            src_a * self.width,
            src_b * self.width,
            dest_a * self.width,
            dest_b * self.width,
        );
    }

    /// Iterate over the field values.
    pub fn iter(&self) -> FieldIter<'_> {
        FieldIter {
            view: self,
            index: 0,
        }
    }

    /// Copy fields from another view as a raw bit-level copy.
    ///
    /// The views may have different widths; the source is truncated to the
    /// destination's bit length.
    pub fn copy_from(
        &mut self,
        src: &PackedView,
        src_a: usize,
        src_b: usize,
        dest_a: usize,
        dest_b: usize,
    ) {
        debug_assert!(src_a <= src_b && src_b <= src.len);
        debug_assert!(dest_a <= dest_b && dest_b <= self.len);
        self.bits.copy_from(
            &src.bits,
            src_a * src.width,
            src_b * src.width,
            dest_a * self.width,
            dest_b * self.width,
        );
    }
}

impl<'a> IntoIterator for &'a PackedView {
    type Item = u64;
    type IntoIter = FieldIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the fields of a [`PackedView`].
pub struct FieldIter<'a> {
    view: &'a PackedView,
    index: usize,
}

impl<'a> Iterator for FieldIter<'a> {
    type Item = u64;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.view.len {
            return None;
        }
        let value = self.view.get(self.index);
        self.index += 1;
        Some(value)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.view.len - self.index;
        (remaining, Some(remaining))
    }
}

impl<'a> ExactSizeIterator for FieldIter<'a> {}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // Single fields and ranges
    // ========================================================================

    #[test]
    fn test_set_get_roundtrip() {
        for width in [1, 5, 8, 13, 21, 32, 63, 64] {
            let mut view = PackedView::new(width, 50);
            let cap = if width == 64 { u64::MAX } else { (1 << width) - 1 };
            for i in 0..50 {
                view.set(i, (i as u64 * 0x9E37) & cap);
            }
            for i in 0..50 {
                assert_eq!(view.get(i), (i as u64 * 0x9E37) & cap, "width {}", width);
            }
        }
    }

    #[test]
    fn test_fields_straddle_word_boundary() {
        // Width 13: field 4 occupies bits 52..65, crossing the first word.
        let mut view = PackedView::new(13, 10);
        view.set(4, 0x1ABC);
        assert_eq!(view.get(4), 0x1ABC);
        assert_eq!(view.get(3), 0);
        assert_eq!(view.get(5), 0);
    }

    #[test]
    fn test_get_range_packs_fields() {
        let mut view = PackedView::new(8, 16);
        for i in 0..8 {
            view.set(i, i as u64 + 1);
        }
        assert_eq!(view.get_range(0, 4), 0x0403_0201);
        assert_eq!(view.get_range(2, 6), 0x0605_0403);
    }

    #[test]
    fn test_set_range_payload() {
        let mut view = PackedView::new(8, 16);
        view.set_range(3, 7, 0x0D0C_0B0A);
        assert_eq!(view.get(3), 0x0A);
        assert_eq!(view.get(4), 0x0B);
        assert_eq!(view.get(5), 0x0C);
        assert_eq!(view.get(6), 0x0D);
        assert_eq!(view.get(2), 0);
        assert_eq!(view.get(7), 0);
    }

    // ========================================================================
    // Broadcast / increment / decrement
    // ========================================================================

    #[test]
    fn test_broadcast() {
        for width in [7, 13, 20] {
            let mut view = PackedView::new(width, 30);
            view.broadcast(5, 25, 42);
            for i in 0..30 {
                let expect = if (5..25).contains(&i) { 42 } else { 0 };
                assert_eq!(view.get(i), expect, "width {} field {}", width, i);
            }
        }
    }

    #[test]
    fn test_increment_range() {
        let mut view = PackedView::new(13, 40);
        for i in 0..40 {
            view.set(i, i as u64);
        }
        view.increment(8, 31, 100);
        for i in 0..40 {
            let expect = i as u64 + if (8..31).contains(&i) { 100 } else { 0 };
            assert_eq!(view.get(i), expect, "field {}", i);
        }
    }

    #[test]
    fn test_decrement_range() {
        let mut view = PackedView::new(13, 40);
        view.broadcast(0, 40, 500);
        view.decrement(3, 37, 123);
        for i in 0..40 {
            let expect = if (3..37).contains(&i) { 377 } else { 500 };
            assert_eq!(view.get(i), expect, "field {}", i);
        }
    }

    #[test]
    fn test_increment_empty_range_is_noop() {
        let mut view = PackedView::new(8, 10);
        view.broadcast(0, 10, 9);
        view.increment(4, 4, 1);
        view.decrement(4, 4, 1);
        for i in 0..10 {
            assert_eq!(view.get(i), 9);
        }
    }

    // ========================================================================
    // find
    // ========================================================================

    /// Reference: linear scan for the first field >= threshold.
    fn find_linear(view: &PackedView, a: usize, b: usize, t: u64) -> usize {
        (a..b).position(|i| view.get(i) >= t).unwrap_or(b - a)
    }

    #[test]
    fn test_find_monotone() {
        let mut view = PackedView::new(13, 30);
        let values: Vec<u64> = (0..30).map(|i| (i * i) as u64).collect();
        for (i, &v) in values.iter().enumerate() {
            view.set(i, v);
        }
        for t in [0, 1, 2, 5, 100, 400, 841, 842, 4000] {
            assert_eq!(
                view.find(0, 30, t),
                find_linear(&view, 0, 30, t),
                "threshold {}",
                t
            );
        }
    }

    #[test]
    fn test_find_subrange() {
        let mut view = PackedView::new(8, 24);
        for i in 0..24 {
            view.set(i, (i as u64) * 5);
        }
        // Search only [6, 18): results are relative to the range start.
        assert_eq!(view.find(6, 18, 0), 0);
        assert_eq!(view.find(6, 18, 31), 1);
        assert_eq!(view.find(6, 18, 85), 11);
        assert_eq!(view.find(6, 18, 86), 12);
    }

    #[test]
    fn test_find_all_equal() {
        let mut view = PackedView::new(9, 17);
        view.broadcast(0, 17, 40);
        assert_eq!(view.find(0, 17, 40), 0);
        assert_eq!(view.find(0, 17, 41), 17);
        assert_eq!(view.find(0, 17, 0), 0);
    }

    // ========================================================================
    // Copies
    // ========================================================================

    #[test]
    fn test_copy_within_shift_up() {
        // The in-place child shift: move fields [2, 9) to [3, 10).
        let mut view = PackedView::new(13, 10);
        for i in 0..10 {
            view.set(i, 100 + i as u64);
        }
        view.copy_within(2, 9, 3, 10);
        assert_eq!(view.get(2), 102);
        for i in 3..10 {
            assert_eq!(view.get(i), 100 + i as u64 - 1, "field {}", i);
        }
    }

    #[test]
    fn test_copy_within_shift_down() {
        let mut view = PackedView::new(13, 10);
        for i in 0..10 {
            view.set(i, 100 + i as u64);
        }
        view.copy_within(3, 10, 2, 9);
        for i in 2..9 {
            assert_eq!(view.get(i), 100 + i as u64 + 1, "field {}", i);
        }
        assert_eq!(view.get(9), 109);
    }

    #[test]
    fn test_iter_yields_all_fields() {
        let mut view = PackedView::new(13, 25);
        for i in 0..25 {
            view.set(i, 1000 + i as u64);
        }
        let collected: Vec<u64> = view.iter().collect();
        assert_eq!(collected.len(), 25);
        for (i, &v) in collected.iter().enumerate() {
            assert_eq!(v, 1000 + i as u64);
        }
        assert_eq!(view.iter().len(), 25);
    }

    #[test]
    fn test_copy_from_same_width() {
        let mut src = PackedView::new(11, 20);
        for i in 0..20 {
            src.set(i, i as u64 * 3);
        }
        let mut dst = PackedView::new(11, 20);
        dst.copy_from(&src, 4, 16, 0, 12);
        for i in 0..12 {
            assert_eq!(dst.get(i), (i as u64 + 4) * 3, "field {}", i);
        }
    }
}

//! Translation-tree geometry.
//!
//! This module derives, from the two structural parameters of the tree
//! (depth and page-offset bit count), everything the walkers need: the
//! per-level index width and bit shift, the offset mask, and the base mask.
//! All of it is pure, stateless bit arithmetic.

use crate::VirtualAddress;

/// log2 of the size of one page table entry in bytes.
///
/// Entries are single words, so a table of `page_size / entry_size` entries
/// occupies exactly one page.
const ENTRY_SHIFT: usize = size_of::<usize>().trailing_zeros() as usize;

/// The structural parameters of a translation tree.
///
/// `levels` is the number of tables traversed root-to-leaf; `pobits` is the
/// page-offset width in bits, so the page size is `1 << pobits`. A
/// `Geometry` is fixed at construction and is meant to be defined as a
/// `const` by the caller.
///
/// The consumed VA range is `levels * index_bits() + pobits` bits; keeping
/// that within the address width is the caller's configuration obligation,
/// not a runtime check. VA bits above the consumed range are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    levels: usize,
    pobits: usize,
}

impl Geometry {
    /// Creates a geometry with the given tree depth and offset-bit count.
    ///
    /// # Panics
    ///
    /// Panics if `levels` is zero or if the page is too small to hold a
    /// table (the per-level index width must be positive).
    pub const fn new(levels: usize, pobits: usize) -> Self {
        assert!(levels >= 1, "tree depth must be at least 1");
        assert!(
            pobits > ENTRY_SHIFT,
            "page size must leave a positive per-level index width"
        );
        Self { levels, pobits }
    }

    /// Returns the number of tree levels traversed root-to-leaf.
    #[inline]
    pub const fn levels(self) -> usize {
        self.levels
    }

    /// Returns the page-offset width in bits.
    #[inline]
    pub const fn pobits(self) -> usize {
        self.pobits
    }

    /// Returns the page size in bytes.
    #[inline]
    pub const fn page_size(self) -> usize {
        1 << self.pobits
    }

    /// Returns the per-level index width in bits.
    #[inline]
    pub const fn index_bits(self) -> usize {
        self.pobits - ENTRY_SHIFT
    }

    /// Returns the number of entries in one page table.
    #[inline]
    pub const fn entries_per_table(self) -> usize {
        1 << self.index_bits()
    }

    /// Returns the mask isolating the page-offset bits of an address.
    #[inline]
    pub const fn offset_mask(self) -> usize {
        self.page_size() - 1
    }

    /// Returns the mask isolating the page-aligned base of an address.
    ///
    /// Applied to a page table entry, this also strips the low-order flag
    /// bits packed into the offset range.
    #[inline]
    pub const fn base_mask(self) -> usize {
        !self.offset_mask()
    }

    /// Returns the VA bit shift of the index field for `level`.
    ///
    /// Level 0 is the root (highest-order field); `levels - 1` is the leaf.
    #[inline]
    pub const fn shift_for(self, level: usize) -> usize {
        self.pobits + (self.levels - 1 - level) * self.index_bits()
    }

    /// Extracts the table index a virtual address selects at `level`.
    #[inline]
    pub const fn index_of(self, va: VirtualAddress, level: usize) -> usize {
        (va.as_usize() >> self.shift_for(level)) & (self.entries_per_table() - 1)
    }

    /// Extracts the page-offset bits of a virtual address.
    #[inline]
    pub const fn page_offset(self, va: VirtualAddress) -> usize {
        va.as_usize() & self.offset_mask()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 4 KiB pages, three levels: 9-bit indices above a 12-bit offset.
    const DEEP: Geometry = Geometry::new(3, 12);

    #[test]
    fn derived_sizes() {
        assert_eq!(DEEP.page_size(), 4096);
        assert_eq!(DEEP.index_bits(), 12 - ENTRY_SHIFT);
        assert_eq!(DEEP.entries_per_table(), 4096 / size_of::<usize>());
        assert_eq!(DEEP.entries_per_table() * size_of::<usize>(), DEEP.page_size());
    }

    #[test]
    fn masks_partition_the_address() {
        assert_eq!(DEEP.offset_mask(), 0xFFF);
        assert_eq!(DEEP.offset_mask() & DEEP.base_mask(), 0);
        assert_eq!(DEEP.offset_mask() | DEEP.base_mask(), usize::MAX);
    }

    #[test]
    fn shifts_descend_from_root_to_leaf() {
        // Leaf index sits directly above the offset; each level above it
        // shifts up by one index width.
        assert_eq!(DEEP.shift_for(2), 12);
        assert_eq!(DEEP.shift_for(1), 12 + DEEP.index_bits());
        assert_eq!(DEEP.shift_for(0), 12 + 2 * DEEP.index_bits());
    }

    #[test]
    fn index_extraction() {
        let va = VirtualAddress::new(
            (3 << DEEP.shift_for(0)) | (5 << DEEP.shift_for(1)) | (7 << 12) | 0x123,
        );
        assert_eq!(DEEP.index_of(va, 0), 3);
        assert_eq!(DEEP.index_of(va, 1), 5);
        assert_eq!(DEEP.index_of(va, 2), 7);
        assert_eq!(DEEP.page_offset(va), 0x123);
    }

    #[test]
    fn bits_above_consumed_range_are_ignored() {
        let consumed = DEEP.pobits() + DEEP.levels() * DEEP.index_bits();
        let va = VirtualAddress::new(0x1234);
        let noisy = VirtualAddress::new(0x1234 | (1 << consumed));
        for level in 0..DEEP.levels() {
            assert_eq!(DEEP.index_of(va, level), DEEP.index_of(noisy, level));
        }
        assert_eq!(DEEP.page_offset(va), DEEP.page_offset(noisy));
    }

    #[test]
    fn single_level_consumes_offset_then_one_index() {
        let flat = Geometry::new(1, 12);
        assert_eq!(flat.shift_for(0), 12);
        let va = VirtualAddress::new(0x5000);
        assert_eq!(flat.index_of(va, 0), 5);
    }

    #[test]
    #[should_panic(expected = "tree depth")]
    fn zero_levels_rejected() {
        let _ = Geometry::new(0, 12);
    }
}

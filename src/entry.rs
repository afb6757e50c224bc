//! Page table entries.

use crate::{Geometry, PhysicalAddress};

/// A single page table entry.
///
/// One word: bit 0 is the valid flag, and when it is set the bits above the
/// page-offset width hold the page-aligned physical base of the entry's
/// target (a child table, or a data page at the leaf level). An invalid
/// entry is the all-zero word; clearing an entry never leaves stale base
/// bits behind the flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(transparent)]
pub struct Pte(usize);

impl Pte {
    /// Valid bit (bit 0).
    const VALID: usize = 1 << 0;

    /// The cleared entry.
    pub const INVALID: Pte = Pte(0);

    /// Creates a valid entry referencing `base`.
    ///
    /// `base` must be page-aligned; alignment is what makes room for the
    /// flag bits in the offset range.
    pub fn map(base: PhysicalAddress, geometry: Geometry) -> Self {
        debug_assert!(
            base.is_aligned(geometry.page_size()),
            "entry target must be page-aligned"
        );
        Self((base.as_usize() & geometry.base_mask()) | Self::VALID)
    }

    /// Returns whether the valid flag is set.
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 & Self::VALID != 0
    }

    /// Returns the target base, or `None` for an invalid entry.
    pub fn address(self, geometry: Geometry) -> Option<PhysicalAddress> {
        if self.is_valid() {
            Some(PhysicalAddress::new(self.0 & geometry.base_mask()))
        } else {
            None
        }
    }

    /// Returns the raw word value of this entry.
    #[inline]
    pub const fn as_raw(self) -> usize {
        self.0
    }

    /// Creates an entry from a raw word value.
    #[inline]
    pub const fn from_raw(raw: usize) -> Self {
        Self(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GEOMETRY: Geometry = Geometry::new(2, 12);

    #[test]
    fn invalid_is_all_zero() {
        assert_eq!(Pte::INVALID.as_raw(), 0);
        assert!(!Pte::INVALID.is_valid());
        assert_eq!(Pte::INVALID.address(GEOMETRY), None);
    }

    #[test]
    fn map_sets_flag_and_preserves_base() {
        let base = PhysicalAddress::new(0x3000);
        let entry = Pte::map(base, GEOMETRY);
        assert!(entry.is_valid());
        assert_eq!(entry.address(GEOMETRY), Some(base));
        assert_eq!(entry.as_raw(), 0x3001);
    }

    #[test]
    fn raw_round_trip() {
        let entry = Pte::map(PhysicalAddress::new(0x7000), GEOMETRY);
        assert_eq!(Pte::from_raw(entry.as_raw()), entry);
    }
}

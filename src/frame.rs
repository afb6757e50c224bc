//! Frame handles for the simulated physical space.

use core::fmt;
use core::ops::{Add, Sub};

/// A physical page frame number.
///
/// Frame numbers are the opaque owning handles the translation tree stores;
/// the arena resolves them to storage. Frame `n` backs the page-aligned
/// physical base `n << pobits`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct FrameNumber(usize);

impl FrameNumber {
    /// Creates a new frame number.
    #[inline]
    pub const fn new(number: usize) -> Self {
        Self(number)
    }

    /// Returns the raw frame number.
    #[inline]
    pub const fn as_usize(self) -> usize {
        self.0
    }
}

impl fmt::Debug for FrameNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FrameNumber({})", self.0)
    }
}

impl fmt::Display for FrameNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add<usize> for FrameNumber {
    type Output = Self;

    #[inline]
    fn add(self, rhs: usize) -> Self::Output {
        Self(self.0 + rhs)
    }
}

impl Sub<FrameNumber> for FrameNumber {
    type Output = usize;

    #[inline]
    fn sub(self, rhs: FrameNumber) -> Self::Output {
        self.0 - rhs.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic() {
        let frame = FrameNumber::new(10);
        assert_eq!((frame + 5).as_usize(), 15);
        assert_eq!((frame + 5) - frame, 5);
    }

    #[test]
    fn comparison() {
        assert!(FrameNumber::new(3) < FrameNumber::new(4));
        assert_eq!(FrameNumber::new(3), FrameNumber::new(3));
    }
}

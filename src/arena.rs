//! Backing storage for simulated physical pages.
//!
//! The arena stands in for physical memory: every acquired frame is a
//! uniquely-owned, zeroed, page-sized block addressed by a [`FrameNumber`].
//! Frames are word-addressable so a frame can serve as either a page table
//! or a data page. Released slots are recycled through a free list.

use crate::{FrameNumber, Geometry, PhysicalAddress};

/// An arena of page-sized frames.
///
/// Frame `n` backs the physical base `n << pobits`, so every base the arena
/// hands out is page-aligned by construction. Resource exhaustion is the
/// host allocator failing, which aborts the process; there is no error path
/// out of [`acquire`](Self::acquire).
pub struct FrameArena {
    /// Words per frame (also the entry count of a page table).
    words_per_frame: usize,
    /// Page-offset width, for frame number <-> physical base conversion.
    pobits: usize,
    /// Frame storage; `None` marks a released slot awaiting reuse.
    frames: Vec<Option<Box<[usize]>>>,
    /// Indices of released slots.
    free: Vec<usize>,
}

impl FrameArena {
    /// Creates an empty arena for the given geometry.
    pub fn new(geometry: Geometry) -> Self {
        Self {
            words_per_frame: geometry.entries_per_table(),
            pobits: geometry.pobits(),
            frames: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Acquires a zeroed frame.
    pub fn acquire(&mut self) -> FrameNumber {
        let words = vec![0usize; self.words_per_frame].into_boxed_slice();
        let index = match self.free.pop() {
            Some(index) => {
                debug_assert!(self.frames[index].is_none());
                self.frames[index] = Some(words);
                index
            }
            None => {
                self.frames.push(Some(words));
                self.frames.len() - 1
            }
        };
        log::trace!("acquired frame {}", index);
        FrameNumber::new(index)
    }

    /// Releases a live frame, dropping its storage.
    ///
    /// # Panics
    ///
    /// Panics if `frame` is not currently live. A caller holding a released
    /// or never-acquired frame number has broken the one-owner contract.
    pub fn release(&mut self, frame: FrameNumber) {
        let slot = self
            .frames
            .get_mut(frame.as_usize())
            .expect("released a frame that was never acquired");
        assert!(slot.take().is_some(), "released frame {frame} twice");
        self.free.push(frame.as_usize());
        log::trace!("released frame {}", frame);
    }

    /// Reads the word at `index` in a live frame.
    pub fn word(&self, frame: FrameNumber, index: usize) -> usize {
        self.storage(frame)[index]
    }

    /// Writes the word at `index` in a live frame.
    pub fn set_word(&mut self, frame: FrameNumber, index: usize, value: usize) {
        self.storage_mut(frame)[index] = value;
    }

    /// Returns the physical base address of a frame.
    #[inline]
    pub fn base_of(&self, frame: FrameNumber) -> PhysicalAddress {
        PhysicalAddress::new(frame.as_usize() << self.pobits)
    }

    /// Returns the frame number backing a page-aligned physical base.
    #[inline]
    pub fn frame_of(&self, base: PhysicalAddress) -> FrameNumber {
        FrameNumber::new(base.as_usize() >> self.pobits)
    }

    /// Returns the number of currently live frames.
    pub fn live_frames(&self) -> usize {
        self.frames.len() - self.free.len()
    }

    fn storage(&self, frame: FrameNumber) -> &[usize] {
        self.frames[frame.as_usize()]
            .as_deref()
            .expect("frame is not live")
    }

    fn storage_mut(&mut self, frame: FrameNumber) -> &mut [usize] {
        self.frames[frame.as_usize()]
            .as_deref_mut()
            .expect("frame is not live")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GEOMETRY: Geometry = Geometry::new(2, 6);

    #[test]
    fn acquired_frames_are_zeroed() {
        let mut arena = FrameArena::new(GEOMETRY);
        let frame = arena.acquire();
        for index in 0..GEOMETRY.entries_per_table() {
            assert_eq!(arena.word(frame, index), 0);
        }
    }

    #[test]
    fn recycled_frames_are_zeroed() {
        let mut arena = FrameArena::new(GEOMETRY);
        let frame = arena.acquire();
        arena.set_word(frame, 3, 0xDEAD);
        arena.release(frame);

        let recycled = arena.acquire();
        assert_eq!(recycled, frame, "free slot should be reused");
        assert_eq!(arena.word(recycled, 3), 0);
    }

    #[test]
    fn bases_are_page_aligned_and_round_trip() {
        let mut arena = FrameArena::new(GEOMETRY);
        for _ in 0..8 {
            let frame = arena.acquire();
            let base = arena.base_of(frame);
            assert!(base.is_aligned(GEOMETRY.page_size()));
            assert_eq!(arena.frame_of(base), frame);
        }
    }

    #[test]
    fn live_count_tracks_acquire_and_release() {
        let mut arena = FrameArena::new(GEOMETRY);
        assert_eq!(arena.live_frames(), 0);
        let a = arena.acquire();
        let b = arena.acquire();
        assert_eq!(arena.live_frames(), 2);
        arena.release(a);
        assert_eq!(arena.live_frames(), 1);
        arena.release(b);
        assert_eq!(arena.live_frames(), 0);
    }

    #[test]
    fn words_persist_per_frame() {
        let mut arena = FrameArena::new(GEOMETRY);
        let a = arena.acquire();
        let b = arena.acquire();
        arena.set_word(a, 0, 1);
        arena.set_word(b, 0, 2);
        assert_eq!(arena.word(a, 0), 1);
        assert_eq!(arena.word(b, 0), 2);
    }

    #[test]
    #[should_panic(expected = "twice")]
    fn double_release_panics() {
        let mut arena = FrameArena::new(GEOMETRY);
        let frame = arena.acquire();
        arena.release(frame);
        arena.release(frame);
    }
}

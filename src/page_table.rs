//! The translation tree and its public operations.
//!
//! A [`PageTable`] is a radix tree of page table entries rooted at a single
//! root register. Mapping grows only the path it needs, unmapping prunes
//! emptied tables bottom-up, and teardown releases every reachable frame in
//! post-order. Between any two public operations the structure is a strict
//! tree: every reachable table or data page is referenced by exactly one
//! valid entry, and no table with zero valid entries persists.

use crate::{FrameArena, FrameNumber, Geometry, PhysicalAddress, Pte, VirtualAddress};

/// Outcome of [`PageTable::allocate_page`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapResult {
    /// The start address was not page-aligned; nothing changed.
    Misaligned,
    /// The page was already mapped; nothing changed.
    AlreadyMapped,
    /// A new mapping was created.
    Mapped,
}

/// Outcome of [`PageTable::deallocate_page`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnmapResult {
    /// The start address was not page-aligned; nothing changed.
    Misaligned,
    /// The page was not mapped; nothing changed.
    NotMapped,
    /// The mapping existed and was removed.
    Unmapped,
}

/// A software multi-level page table.
///
/// Geometry is fixed at construction. Mutating operations take `&mut self`
/// and translation takes `&self`; a caller needing access from multiple
/// execution contexts must impose external mutual exclusion, exactly as a
/// single hardware walker assumes no concurrent walkers.
pub struct PageTable {
    geometry: Geometry,
    arena: FrameArena,
    /// The root register. `None` is the empty address space.
    root: Option<FrameNumber>,
}

impl PageTable {
    /// Creates an empty page table with the given geometry.
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            arena: FrameArena::new(geometry),
            root: None,
        }
    }

    /// Returns the geometry this tree was built with.
    #[inline]
    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// Returns the physical base of the root table, or `None` when the
    /// address space is empty.
    ///
    /// Exposed for inspection and test setup; the root register has no
    /// other observable state.
    pub fn root(&self) -> Option<PhysicalAddress> {
        self.root.map(|frame| self.arena.base_of(frame))
    }

    /// Returns the number of live frames (tables plus data pages).
    pub fn live_frames(&self) -> usize {
        self.arena.live_frames()
    }

    /// Translates a virtual address to a physical address.
    ///
    /// Returns `None` if the address is unmapped. Pure and non-mutating;
    /// an unmapped address is a normal result, not an error.
    pub fn translate(&self, va: VirtualAddress) -> Option<PhysicalAddress> {
        let g = self.geometry;
        let mut table = self.root?;
        for level in 0..g.levels() - 1 {
            let entry = self.entry(table, g.index_of(va, level));
            table = self.arena.frame_of(entry.address(g)?);
        }
        let leaf = self.entry(table, g.index_of(va, g.levels() - 1));
        let base = leaf.address(g)?;
        Some(base + g.page_offset(va))
    }

    /// Maps the virtual page starting at `start_va`, growing the tree as
    /// needed.
    ///
    /// Only the path to the new leaf is grown; sibling entries are never
    /// touched. Mapping an already-mapped page is an idempotent no-op.
    pub fn allocate_page(&mut self, start_va: VirtualAddress) -> MapResult {
        let g = self.geometry;
        if !start_va.is_aligned(g.page_size()) {
            return MapResult::Misaligned;
        }

        let mut table = match self.root {
            Some(frame) => frame,
            None => {
                let frame = self.arena.acquire();
                self.root = Some(frame);
                log::debug!("created root table at {}", self.arena.base_of(frame));
                frame
            }
        };

        for level in 0..g.levels() - 1 {
            let index = g.index_of(start_va, level);
            table = match self.entry(table, index).address(g) {
                Some(base) => self.arena.frame_of(base),
                None => {
                    let child = self.arena.acquire();
                    self.set_entry(table, index, Pte::map(self.arena.base_of(child), g));
                    log::trace!("grew level {} table for {}", level + 1, start_va);
                    child
                }
            };
        }

        let index = g.index_of(start_va, g.levels() - 1);
        if self.entry(table, index).is_valid() {
            return MapResult::AlreadyMapped;
        }
        let page = self.arena.acquire();
        self.set_entry(table, index, Pte::map(self.arena.base_of(page), g));
        log::trace!("mapped {} -> {}", start_va, self.arena.base_of(page));
        MapResult::Mapped
    }

    /// Unmaps the virtual page starting at `start_va`, pruning tables that
    /// become empty.
    ///
    /// The data page is released and the leaf entry cleared to the all-zero
    /// word; then every table left without a valid entry is released
    /// bottom-up, clearing the parent entry that referenced it, up to and
    /// including the root.
    pub fn deallocate_page(&mut self, start_va: VirtualAddress) -> UnmapResult {
        let g = self.geometry;
        if !start_va.is_aligned(g.page_size()) {
            return UnmapResult::Misaligned;
        }
        let Some(root) = self.root else {
            return UnmapResult::NotMapped;
        };

        // Walk down recording (table, index) at every level; unlike
        // translation, pruning needs the whole path afterwards.
        let mut path: Vec<(FrameNumber, usize)> = Vec::with_capacity(g.levels());
        let mut table = root;
        for level in 0..g.levels() {
            let index = g.index_of(start_va, level);
            path.push((table, index));
            if level + 1 == g.levels() {
                break;
            }
            match self.entry(table, index).address(g) {
                Some(base) => table = self.arena.frame_of(base),
                // Missing intermediate table: the leaf is unreachable.
                None => return UnmapResult::NotMapped,
            }
        }

        let &(leaf_table, leaf_index) = path.last().expect("depth is at least 1");
        let Some(page_base) = self.entry(leaf_table, leaf_index).address(g) else {
            return UnmapResult::NotMapped;
        };
        self.arena.release(self.arena.frame_of(page_base));
        self.set_entry(leaf_table, leaf_index, Pte::INVALID);
        log::trace!("unmapped {}", start_va);

        // Prune bottom-up, stopping at the first table that still holds a
        // valid entry.
        for level in (0..g.levels()).rev() {
            let (frame, _) = path[level];
            if !self.table_is_empty(frame) {
                break;
            }
            self.arena.release(frame);
            if level == 0 {
                self.root = None;
                log::debug!("root table released; address space is empty");
            } else {
                let (parent, parent_index) = path[level - 1];
                self.set_entry(parent, parent_index, Pte::INVALID);
            }
        }

        UnmapResult::Unmapped
    }

    /// Unmaps `n_pages` consecutive pages starting at `start_va`, returning
    /// how many mappings were actually removed.
    ///
    /// A misaligned start returns 0 with no side effects. The gate is on
    /// the start address only: stepping by whole pages keeps every later
    /// address aligned. Pages that were already unmapped do not count and
    /// are not errors.
    pub fn deallocate_range(&mut self, start_va: VirtualAddress, n_pages: usize) -> usize {
        let g = self.geometry;
        if !start_va.is_aligned(g.page_size()) {
            return 0;
        }
        let mut removed = 0;
        for i in 0..n_pages {
            if self.deallocate_page(start_va + i * g.page_size()) == UnmapResult::Unmapped {
                removed += 1;
            }
        }
        removed
    }

    /// Frees the entire tree: every data page, every table, post-order.
    ///
    /// No-op when the address space is already empty. Afterwards the root
    /// register is empty. Discarding the whole tree at once needs no path
    /// tracking, unlike single-page pruning.
    pub fn destroy_all(&mut self) {
        let Some(root) = self.root.take() else {
            return;
        };
        self.free_subtree(root, 0);
        log::debug!("destroyed translation tree");
    }

    /// Releases the subtree rooted at `table` (a table at `level`),
    /// children first. Recursion depth is bounded by the tree depth.
    fn free_subtree(&mut self, table: FrameNumber, level: usize) {
        let g = self.geometry;
        for index in 0..g.entries_per_table() {
            let Some(base) = self.entry(table, index).address(g) else {
                continue;
            };
            let child = self.arena.frame_of(base);
            if level + 1 == g.levels() {
                // Leaf-table entries reference data pages.
                self.arena.release(child);
            } else {
                self.free_subtree(child, level + 1);
            }
        }
        self.arena.release(table);
    }

    fn table_is_empty(&self, table: FrameNumber) -> bool {
        (0..self.geometry.entries_per_table()).all(|index| !self.entry(table, index).is_valid())
    }

    fn entry(&self, table: FrameNumber, index: usize) -> Pte {
        Pte::from_raw(self.arena.word(table, index))
    }

    fn set_entry(&mut self, table: FrameNumber, index: usize, entry: Pte) {
        self.arena.set_word(table, index, entry.as_raw());
    }
}

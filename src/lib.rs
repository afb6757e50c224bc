//! # softpt
//!
//! A software-simulated multi-level page table. Virtual addresses are
//! translated to physical addresses through a configurable-depth radix tree
//! of page table entries, backed by dynamically allocated, page-aligned
//! blocks standing in for physical pages. It provides:
//!
//! - Pure address decomposition derived from two structural parameters
//!   (tree depth and page-offset bit count).
//! - Lazy tree growth on mapping and bottom-up pruning on unmapping.
//! - Read-only translation walks and full-tree teardown.
//!
//! There is no notion of processes, permissions, TLBs, or swap; a
//! [`PageTable`] is a single translation tree and nothing more.

mod address;
mod arena;
mod entry;
mod frame;
mod geometry;
mod page_table;

pub use address::{PhysicalAddress, VirtualAddress};
pub use arena::FrameArena;
pub use entry::Pte;
pub use frame::FrameNumber;
pub use geometry::Geometry;
pub use page_table::{MapResult, PageTable, UnmapResult};

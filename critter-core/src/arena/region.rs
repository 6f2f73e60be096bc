//! Backing storage for the arena
//!
//! This is the only place in the crate that touches raw pointers. Every
//! access goes through a range that the allocator guarantees is disjoint
//! from every other live range.

#![allow(unsafe_code)]

use alloc::boxed::Box;
use core::cell::UnsafeCell;

pub(crate) struct Region {
    bytes: Box<[UnsafeCell<u8>]>,
}

// SAFETY: the region is only reached through allocator spans. Live spans never
// overlap, a span is written only through its unique `ImageBuffer`, and it is
// read through `ImageData` only after that buffer has been consumed.
unsafe impl Sync for Region {}

impl Region {
    pub(crate) fn new(size: usize) -> Self {
        let bytes = (0..size).map(|_| UnsafeCell::new(0u8)).collect();
        Self { bytes }
    }

    pub(crate) fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Shared view of `start..start + len`
    ///
    /// # Safety
    ///
    /// No mutable view of the range may be alive for the returned lifetime.
    pub(crate) unsafe fn slice(&self, start: usize, len: usize) -> &[u8] {
        let cells = &self.bytes[start..start + len];
        // SAFETY: UnsafeCell<u8> has the layout of u8, the range is in bounds
        // and the caller rules out concurrent writers.
        unsafe { core::slice::from_raw_parts(UnsafeCell::raw_get(cells.as_ptr()), len) }
    }

    /// Mutable view of `start..start + len`
    ///
    /// # Safety
    ///
    /// The caller must hold the only handle for the range and no other view
    /// of it may be alive for the returned lifetime.
    #[allow(clippy::mut_from_ref)]
    pub(crate) unsafe fn slice_mut(&self, start: usize, len: usize) -> &mut [u8] {
        let cells = &self.bytes[start..start + len];
        // SAFETY: interior mutability through UnsafeCell, exclusivity is
        // upheld by the caller.
        unsafe { core::slice::from_raw_parts_mut(UnsafeCell::raw_get(cells.as_ptr()), len) }
    }
}

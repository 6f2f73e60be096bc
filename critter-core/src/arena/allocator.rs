//! First-fit allocator over the image region

use alloc::sync::{Arc, Weak};
use alloc::vec::Vec;
use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use super::handle::{ImageBuffer, Span};
use super::region::Region;

/// Bookkeeping for one reservation
struct Entry {
    start: usize,
    end: usize,
    owner: Weak<Span>,
}

impl Entry {
    fn is_live(&self) -> bool {
        self.owner.strong_count() > 0
    }
}

/// Fixed-size arena for image bytes
///
/// Entries are kept sorted by start offset. Released entries are purged
/// lazily on the next allocator call.
pub struct ImageArena {
    region: Arc<Region>,
    entries: Mutex<CriticalSectionRawMutex, RefCell<Vec<Entry>>>,
}

impl ImageArena {
    /// Create an arena backed by `size` bytes
    pub fn new(size: usize) -> Self {
        Self {
            region: Arc::new(Region::new(size)),
            entries: Mutex::new(RefCell::new(Vec::new())),
        }
    }

    /// Total size of the region
    pub fn capacity(&self) -> usize {
        self.region.len()
    }

    /// Reserve `size` bytes at the first gap that can hold them
    ///
    /// Returns `None` for zero-sized requests or when no single gap is large
    /// enough, even if the free bytes in total would suffice.
    pub fn allocate(&self, size: usize) -> Option<ImageBuffer> {
        if size == 0 {
            return None;
        }

        let capacity = self.capacity();
        let buffer = self.with_entries(|entries| {
            let (index, start) = first_fit(entries, capacity, size)?;
            let span = Arc::new(Span::new(self.region.clone(), start, size));
            entries.insert(
                index,
                Entry {
                    start,
                    end: start + size,
                    owner: Arc::downgrade(&span),
                },
            );
            Some(ImageBuffer::new(span))
        });

        match &buffer {
            Some(b) => trace!("arena: {} bytes at {}", size, b.range().start),
            None => debug!("arena: no gap for {} bytes", size),
        }
        buffer
    }

    /// Size of the largest contiguous free gap
    ///
    /// `allocate(n)` succeeds for every `0 < n <= largest_block_size()`.
    pub fn largest_block_size(&self) -> usize {
        let capacity = self.capacity();
        self.with_entries(|entries| {
            let mut largest = 0;
            let mut cursor = 0;
            for entry in entries.iter() {
                largest = largest.max(entry.start - cursor);
                cursor = entry.end;
            }
            largest.max(capacity - cursor)
        })
    }

    /// Bytes held by live allocations
    pub fn used_bytes(&self) -> usize {
        self.with_entries(|entries| entries.iter().map(|e| e.end - e.start).sum())
    }

    /// Number of live allocations
    pub fn live_allocations(&self) -> usize {
        self.with_entries(|entries| entries.len())
    }

    /// Run `f` on the purged entry list inside the critical section
    fn with_entries<R>(&self, f: impl FnOnce(&mut Vec<Entry>) -> R) -> R {
        self.entries.lock(|cell| {
            let mut entries = cell.borrow_mut();
            entries.retain(Entry::is_live);
            f(&mut entries)
        })
    }
}

/// Find the first gap of at least `size` bytes
///
/// Returns the insertion index for the new entry and its start offset.
fn first_fit(entries: &[Entry], capacity: usize, size: usize) -> Option<(usize, usize)> {
    let mut cursor = 0;
    for (index, entry) in entries.iter().enumerate() {
        if entry.start - cursor >= size {
            return Some((index, cursor));
        }
        cursor = entry.end;
    }
    (capacity - cursor >= size).then_some((entries.len(), cursor))
}

//! Allocation handles
//!
//! - [`ImageBuffer`]: unique and writable, fresh from the allocator
//! - [`ImageData`]: frozen, shared and read-only
//! - [`ImageDataRef`]: non-owning observer that may outlive the data

#![allow(unsafe_code)]

use alloc::sync::{Arc, Weak};
use core::fmt;
use core::ops::Range;

use super::region::Region;
use super::ArenaError;

/// A reserved byte range inside the region
pub(crate) struct Span {
    region: Arc<Region>,
    start: usize,
    len: usize,
}

impl Span {
    pub(crate) fn new(region: Arc<Region>, start: usize, len: usize) -> Self {
        debug_assert!(start + len <= region.len());
        Self { region, start, len }
    }

    fn range(&self) -> Range<usize> {
        self.start..self.start + self.len
    }
}

/// Writable allocation with a single owner
///
/// Freeze it once filled to share the bytes.
pub struct ImageBuffer {
    span: Arc<Span>,
}

impl ImageBuffer {
    pub(crate) fn new(span: Arc<Span>) -> Self {
        Self { span }
    }

    /// Size in bytes
    pub fn len(&self) -> usize {
        self.span.len
    }

    /// Whether the buffer holds no bytes (never true for arena allocations)
    pub fn is_empty(&self) -> bool {
        self.span.len == 0
    }

    /// Byte range inside the arena
    pub fn range(&self) -> Range<usize> {
        self.span.range()
    }

    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: this buffer is the only handle to its span, and `&self`
        // excludes the `&mut self` view for the returned lifetime.
        unsafe { self.span.region.slice(self.span.start, self.span.len) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: this buffer is the only handle to its span and is borrowed
        // mutably for the returned lifetime.
        unsafe { self.span.region.slice_mut(self.span.start, self.span.len) }
    }

    /// Give up write access and share the bytes
    pub fn freeze(self) -> ImageData {
        ImageData { span: self.span }
    }
}

impl fmt::Debug for ImageBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageBuffer")
            .field("range", &self.range())
            .finish()
    }
}

/// Shared, read-only image bytes
#[derive(Clone)]
pub struct ImageData {
    span: Arc<Span>,
}

impl ImageData {
    /// Size in bytes
    pub fn len(&self) -> usize {
        self.span.len
    }

    pub fn is_empty(&self) -> bool {
        self.span.len == 0
    }

    /// Byte range inside the arena
    pub fn range(&self) -> Range<usize> {
        self.span.range()
    }

    pub fn as_bytes(&self) -> &[u8] {
        // SAFETY: the writer was consumed by `freeze`, so only shared views of
        // this span exist from here on.
        unsafe { self.span.region.slice(self.span.start, self.span.len) }
    }

    /// Create an observer that does not keep the allocation alive
    pub fn downgrade(&self) -> ImageDataRef {
        ImageDataRef {
            span: Arc::downgrade(&self.span),
        }
    }
}

impl fmt::Debug for ImageData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageData")
            .field("range", &self.range())
            .finish()
    }
}

/// Observer for an [`ImageData`]
///
/// Reading through an observer whose allocation is gone is an error, never
/// a read of reused bytes.
#[derive(Clone)]
pub struct ImageDataRef {
    span: Weak<Span>,
}

impl ImageDataRef {
    /// Whether the observed allocation is still reserved
    pub fn is_live(&self) -> bool {
        self.span.strong_count() > 0
    }

    /// Regain shared access
    pub fn upgrade(&self) -> Result<ImageData, ArenaError> {
        self.span
            .upgrade()
            .map(|span| ImageData { span })
            .ok_or(ArenaError::InvalidHandle)
    }

    /// Regain shared access, treating a released allocation as a bug
    ///
    /// # Panics
    ///
    /// Panics if the allocation has been released.
    pub fn expect_live(&self) -> ImageData {
        match self.upgrade() {
            Ok(data) => data,
            Err(_) => panic!("image data used after its allocation was released"),
        }
    }
}

impl fmt::Debug for ImageDataRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageDataRef")
            .field("live", &self.is_live())
            .finish()
    }
}

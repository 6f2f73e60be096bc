//! Image arena
//!
//! One fixed-size region carved into first-fit allocations. Handles are
//! reference counted: an allocation stays reserved exactly as long as any
//! [`ImageBuffer`] or [`ImageData`] for it is alive, and its bytes become
//! reusable as soon as the last one is dropped. There is no compaction.

mod allocator;
mod handle;
mod region;

pub use allocator::ImageArena;
pub use handle::{ImageBuffer, ImageData, ImageDataRef};

/// Arena errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ArenaError {
    /// No free gap large enough for the request
    OutOfMemory,
    /// Observer handle whose allocation has been released
    InvalidHandle,
}

impl core::fmt::Display for ArenaError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            ArenaError::OutOfMemory => "out of arena memory",
            ArenaError::InvalidHandle => "image handle no longer valid",
        })
    }
}

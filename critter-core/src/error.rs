//! Engine-level error types

use core::fmt;

use crate::arena::ArenaError;
use crate::format::FormatError;
use crate::traits::StorageError;

/// Errors while loading character data or cooking assets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LoadError {
    /// Asset data is malformed or written by an incompatible tool
    Incompatible(FormatError),
    /// Storage backend failed
    Storage(StorageError),
    /// Arena has no gap large enough
    OutOfMemory,
    /// A referenced file, state or character does not exist
    NotFound,
}

impl LoadError {
    /// Short text suitable for a notice on screen
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadError::Incompatible(_) => "Incompatible asset data",
            LoadError::Storage(_) => "Storage error",
            LoadError::OutOfMemory => "Out of image memory",
            LoadError::NotFound => "Asset not found",
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Incompatible(e) => write!(f, "incompatible asset: {}", e),
            LoadError::Storage(e) => write!(f, "storage: {}", e),
            LoadError::OutOfMemory => f.write_str("out of image memory"),
            LoadError::NotFound => f.write_str("not found"),
        }
    }
}

impl From<FormatError> for LoadError {
    fn from(e: FormatError) -> Self {
        LoadError::Incompatible(e)
    }
}

impl From<StorageError> for LoadError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound => LoadError::NotFound,
            other => LoadError::Storage(other),
        }
    }
}

impl From<ArenaError> for LoadError {
    fn from(e: ArenaError) -> Self {
        match e {
            ArenaError::OutOfMemory => LoadError::OutOfMemory,
            // A dead handle inside a load means the asset went away underneath us
            ArenaError::InvalidHandle => LoadError::NotFound,
        }
    }
}

/// Outcomes of a state switch request that did not flip immediately
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SwitchError {
    /// Target state does not exist in the loaded character
    NotFound,
    /// Machine was busy; the request sits in the single-slot queue
    Queued,
    /// No character is loaded
    NotReady,
}

impl fmt::Display for SwitchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SwitchError::NotFound => "unknown state",
            SwitchError::Queued => "switch queued",
            SwitchError::NotReady => "no character loaded",
        })
    }
}

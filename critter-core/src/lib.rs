//! Board-agnostic character engine for the badge
//!
//! This crate contains everything that does not depend on a specific board:
//!
//! - Image arena allocator with reference-counted handles
//! - Binary asset records and the on-storage directory convention
//! - Cooker pipeline and layer resource manager
//! - Character state machine (triggers, switching, rendering)
//! - Command dispatcher for the companion app protocol
//! - Platform traits (storage, display, clock) and configuration types

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

extern crate alloc;

// Must come first so the logging macros are visible to every module
#[macro_use]
mod fmt;

pub mod arena;
pub mod character;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod format;
pub mod library;
pub mod loader;
pub mod state;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use arena::{ArenaError, ImageArena, ImageBuffer, ImageData, ImageDataRef};
pub use character::Character;
pub use error::{LoadError, SwitchError};
pub use state::{CharacterInfo, CharacterMachine};

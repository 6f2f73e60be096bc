//! Platform abstraction traits
//!
//! These traits define the interface between the engine and the board:
//! where asset bytes come from, where pixels go, and what time it is.

pub mod clock;
pub mod display;
pub mod storage;

pub use clock::Clock;
pub use display::{AnimationFrame, CharacterDisplay, DisplayError};
pub use storage::{AssetStorage, StorageError};

//! Character state machine
//!
//! The machine owns the loaded character and everything resident for it.
//! Three tasks drive it: the tick task renders and evaluates triggers, the
//! loader worker runs cook and layer jobs, and the command dispatcher reads
//! and switches. All of them go through one critical section.

mod machine;
mod render;
mod shared;
pub mod triggers;

pub use machine::{CharacterInfo, CharacterMachine};

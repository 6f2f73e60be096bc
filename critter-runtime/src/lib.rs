//! Async glue for the badge character engine
//!
//! Board crates wrap the task bodies in this crate with
//! `#[embassy_executor::task]` and hand them concrete storage, display and
//! RNG types:
//!
//! - [`tasks::tick_loop`] drives the state machine on a fixed ticker
//! - [`tasks::loader_worker`] runs cook and layer jobs one at a time
//! - [`tasks::command_service`] answers companion app requests
//!
//! With the `std` feature, [`fs::DirStorage`] serves characters from a host
//! directory so the whole engine can run in a simulator.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_code)]

extern crate alloc;

// Must come first so the logging macros are visible to every module
#[macro_use]
mod fmt;

pub mod boot;
pub mod channels;
pub mod clock;
pub mod config;
#[cfg(any(test, feature = "std"))]
pub mod fs;
pub mod tasks;

pub use boot::{arena_for, boot};
pub use clock::EmbassyClock;
pub use config::{load_config, parse_config, ConfigError};

#[cfg(test)]
mod tests {
    use critter_core::format::{CharacterRecord, Record, StateImageRecord, StateRecord};
    use critter_core::library::CharacterPaths;
    use critter_core::traits::{AnimationFrame, CharacterDisplay, DisplayError};
    use critter_core::character::ImageDescriptor;

    use crate::fs::DirStorage;

    /// Character with a single blank `idle` state
    pub(crate) fn write_character(storage: &DirStorage, id: &str, name: &str) {
        let paths = CharacterPaths::new("characters", id);
        let record = CharacterRecord {
            name: name.into(),
            species: "Animal".into(),
            default_state: "idle".into(),
        };
        storage.write(&paths.character(), &record.to_bytes()).unwrap();
        let state = StateRecord {
            layer: 0,
            image: StateImageRecord::None,
        };
        storage.write(&paths.state("idle"), &state.to_bytes()).unwrap();
    }

    /// Display that only remembers the last error screen
    #[derive(Default)]
    pub(crate) struct ErrorScreen {
        pub error: Option<String>,
    }

    impl CharacterDisplay for ErrorScreen {
        fn show_character_info(&mut self, _: &str, _: &str) -> Result<(), DisplayError> {
            Ok(())
        }

        fn show_image(&mut self, _: &ImageDescriptor, _: &[u8]) -> Result<(), DisplayError> {
            Ok(())
        }

        fn clear_image(&mut self) -> Result<(), DisplayError> {
            Ok(())
        }

        fn fill_background(&mut self, _: u16) -> Result<(), DisplayError> {
            Ok(())
        }

        fn draw_frame(&mut self, _: &AnimationFrame<'_>) -> Result<(), DisplayError> {
            Ok(())
        }

        fn set_progress(&mut self, _: Option<(u32, u32)>) -> Result<(), DisplayError> {
            Ok(())
        }

        fn show_notice(&mut self, _: &str, _: &str) -> Result<(), DisplayError> {
            Ok(())
        }

        fn hide_notice(&mut self) -> Result<(), DisplayError> {
            Ok(())
        }

        fn show_error(&mut self, title: &str, _: &str) -> Result<(), DisplayError> {
            self.error = Some(title.into());
            Ok(())
        }
    }
}

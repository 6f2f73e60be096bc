//! Engine startup
//!
//! Sizes the arena from configuration and loads the selected character.
//! A character that cannot be loaded at boot is fatal for the engine and is
//! shown as an error screen instead of a transient notice.

use embedded_hal_async::delay::DelayNs;

use critter_core::config::EngineConfig;
use critter_core::traits::{AssetStorage, CharacterDisplay, Clock};
use critter_core::{CharacterMachine, ImageArena, LoadError};

/// Arena sized from the configuration
pub fn arena_for(config: &EngineConfig) -> ImageArena {
    info!("image arena: {} bytes", config.arena_size);
    ImageArena::new(config.arena_size as usize)
}

/// Load the selected (or first) character
pub async fn boot<S, C, D, W>(
    machine: &CharacterMachine<'_, S, C>,
    display: &mut D,
    delay: &mut W,
) -> Result<(), LoadError>
where
    S: AssetStorage,
    C: Clock,
    D: CharacterDisplay,
    W: DelayNs,
{
    match machine.load_selected_or_first(delay).await {
        Ok(()) => {
            if let Some(info) = machine.info() {
                info!("character {} ready", info.id.as_str());
            }
            Ok(())
        }
        Err(e) => {
            error!("no character could be loaded: {}", e);
            if display
                .show_error("Couldn't load character", e.as_str())
                .is_err()
            {
                warn!("error screen failed");
            }
            Err(e)
        }
    }
}

//! Character display trait
//!
//! Widget construction, fonts and the panel driver live behind this trait.
//! The engine only says what to show; the implementation decides how.

use crate::character::{Animation, ImageDescriptor};

/// Errors reported by a display implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayError {
    /// Image dimensions do not fit the screen
    OutOfBounds,
    /// Pixel data does not match the declared dimensions
    InvalidData,
    /// Panel or bus failure
    Bus,
}

/// One animation frame ready to blit
#[derive(Debug, Clone, Copy)]
pub struct AnimationFrame<'a> {
    /// Placement, size and upscale flag
    pub animation: &'a Animation,
    /// Raw RGB565 pixels
    pub pixels: &'a [u8],
}

/// Output surface for the character
pub trait CharacterDisplay {
    /// Show the character's name and species in the header
    fn show_character_info(&mut self, name: &str, species: &str) -> Result<(), DisplayError>;

    /// Show a still image in the character area
    fn show_image(&mut self, image: &ImageDescriptor, data: &[u8]) -> Result<(), DisplayError>;

    /// Hide the character image
    fn clear_image(&mut self) -> Result<(), DisplayError>;

    /// Fill the screen with an RGB565 colour (big-endian as stored)
    fn fill_background(&mut self, color: u16) -> Result<(), DisplayError>;

    /// Blit one animation frame
    fn draw_frame(&mut self, frame: &AnimationFrame<'_>) -> Result<(), DisplayError>;

    /// Show or update the loading bar; `None` hides it
    fn set_progress(&mut self, progress: Option<(u32, u32)>) -> Result<(), DisplayError>;

    /// Show a dismissible notice
    fn show_notice(&mut self, title: &str, detail: &str) -> Result<(), DisplayError>;

    /// Hide the notice
    fn hide_notice(&mut self) -> Result<(), DisplayError>;

    /// Show a full-screen error, used when no character can run
    fn show_error(&mut self, title: &str, detail: &str) -> Result<(), DisplayError>;
}

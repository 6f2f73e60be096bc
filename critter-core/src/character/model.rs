//! Character building blocks

use alloc::string::String;
use alloc::vec::Vec;

/// When an asset is brought into the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Residency {
    /// Loaded when a state that shows it is entered
    #[default]
    OnDemand,
    /// Loaded with the character and kept until the character changes
    Preload,
    /// Loaded with its state's layer and evicted when the layer changes
    Layer,
}

/// Reference to a still image file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDescriptor {
    /// File name under `images/`, without extension
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub has_alpha: bool,
    /// Draw at twice the stored size
    pub upscale: bool,
    pub residency: Residency,
}

/// Reference from a state to a shared animation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationRef {
    pub name: String,
    /// State requested once playback completes
    pub next_state: String,
    /// Number of times the animation is played
    pub loop_count: u16,
    pub residency: Residency,
}

/// How a sequence gets its frames into memory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SequenceMode {
    /// Every frame is cooked when the state is entered
    LoadAll,
    /// Two buffers; the next frame loads while the current one shows
    LoadEach,
    /// Frames are loaded with the character
    Preload,
}

/// One frame of a sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceFrame {
    pub image: ImageDescriptor,
    /// How long the frame stays on screen
    pub duration_us: i64,
}

/// Timed slideshow of still images
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    pub frames: Vec<SequenceFrame>,
    pub mode: SequenceMode,
}

/// What a state shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateImage {
    None,
    Image(ImageDescriptor),
    Animation(AnimationRef),
    Sequence(Sequence),
}

/// Condition that moves the machine to another state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Trigger {
    /// Fires once the state has been active for `duration_us`
    ElapsedTime { duration_us: i64 },
    /// Fires when the screen was tapped since the previous tick
    Clicked,
    /// Fires after a random delay in `[start_us, end_us]`, then with
    /// probability `1 / chance_mod` (always when `chance_mod` is 0)
    Random {
        start_us: i64,
        end_us: i64,
        chance_mod: u32,
    },
}

/// Edge to another state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub target: String,
    pub trigger: Trigger,
}

/// A named visual state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    /// Layer whose assets this state needs resident
    pub layer: u16,
    pub image: StateImage,
    /// Evaluated in order; the first match wins
    pub transitions: Vec<Transition>,
}

/// Where animation frames are read from during playback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AnimationMode {
    /// Streamed frame by frame through one scratch buffer
    FromStorage,
    /// All frames resident in the arena before playback
    FromMemory,
}

/// Fixed-size RGB565 frame animation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Animation {
    pub x: u16,
    pub y: u16,
    pub width: u32,
    pub height: u32,
    pub frame_count: u32,
    pub interval_us: i64,
    /// Fill the screen with `background_color` before the first frame
    pub clear_screen: bool,
    /// RGB565, big-endian as stored
    pub background_color: u16,
    pub mode: AnimationMode,
    pub upscale: bool,
}

impl Animation {
    /// Size of one RGB565 frame in bytes, `None` if it does not fit `usize`
    pub fn frame_bytes(&self) -> Option<usize> {
        usize::try_from(self.width)
            .ok()?
            .checked_mul(usize::try_from(self.height).ok()?)?
            .checked_mul(2)
    }
}

/// What an action does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionEffect {
    SwitchState(String),
}

/// User-invocable action exposed to the companion app
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    /// Text shown on the action button
    pub display: String,
    pub effect: ActionEffect,
}

//! Cooker pipeline
//!
//! Prepares the visual of a state whose assets are not resident yet. A
//! cooked set belongs to exactly one state and is replaced on every switch.

use alloc::vec::Vec;

use embedded_hal_async::delay::DelayNs;

use super::{Loader, Progress, ProgressSink};
use crate::arena::{ImageBuffer, ImageData};
use crate::character::{
    AnimationMode, Character, Residency, SequenceFrame, SequenceMode, State, StateImage,
};
use crate::error::LoadError;
use crate::traits::AssetStorage;

/// Whether entering `state` requires a cook job first
pub fn needs_cooking(character: &Character, state: &State) -> bool {
    match &state.image {
        StateImage::None => false,
        StateImage::Image(image) => image.residency == Residency::OnDemand,
        StateImage::Animation(reference) => {
            reference.residency == Residency::OnDemand
                && character
                    .animation(&reference.name)
                    .is_some_and(|a| a.mode == AnimationMode::FromMemory)
        }
        StateImage::Sequence(sequence) => sequence.mode != SequenceMode::Preload,
    }
}

/// Assets cooked for the current state
#[derive(Debug)]
pub enum CookedSet {
    /// Single still image
    Image(ImageData),
    /// Every frame of a `FromMemory` animation
    Animation(Vec<ImageData>),
    /// Every frame of a `LoadAll` sequence, in order
    Sequence(Vec<ImageData>),
    /// Two rotating buffers for a `LoadEach` sequence
    PingPong(PingPong),
}

/// Two buffers sized for the largest frame of a sequence
///
/// One buffer is on screen while the other receives the next frame.
#[derive(Debug)]
pub struct PingPong {
    buffers: [ImageBuffer; 2],
    /// Frame index and byte length held by each buffer
    loaded: [Option<(usize, usize)>; 2],
    shown: Option<usize>,
}

impl PingPong {
    pub fn new(front: ImageBuffer, back: ImageBuffer) -> Self {
        Self {
            buffers: [front, back],
            loaded: [None, None],
            shown: None,
        }
    }

    /// Buffer holding `frame`, if any
    pub fn slot_of(&self, frame: usize) -> Option<usize> {
        self.loaded
            .iter()
            .position(|entry| entry.is_some_and(|(index, _)| index == frame))
    }

    /// Make sure `frame` is loaded, without touching the buffer on screen
    ///
    /// Returns the buffer that holds it.
    pub async fn prepare<S: AssetStorage>(
        &mut self,
        loader: &Loader<'_, S>,
        frames: &[SequenceFrame],
        frame: usize,
    ) -> Result<usize, LoadError> {
        if let Some(slot) = self.slot_of(frame) {
            return Ok(slot);
        }
        let slot = match self.shown {
            Some(shown) => 1 - shown,
            None => 0,
        };
        let descriptor = &frames.get(frame).ok_or(LoadError::NotFound)?.image;
        // Forget the old contents first so a failed read never looks loaded
        self.loaded[slot] = None;
        let len = loader
            .read_image_into(descriptor, &mut self.buffers[slot])
            .await?;
        self.loaded[slot] = Some((frame, len));
        Ok(slot)
    }

    /// Record that `slot` is now on screen
    pub fn mark_shown(&mut self, slot: usize) {
        self.shown = Some(slot);
    }

    /// Loaded bytes of `slot`
    pub fn bytes(&self, slot: usize) -> &[u8] {
        let len = self.loaded[slot].map_or(0, |(_, len)| len);
        &self.buffers[slot].as_slice()[..len]
    }
}

impl<'a, S: AssetStorage> Loader<'a, S> {
    /// Cook the visual of state `target`
    ///
    /// The set is returned whole; on failure everything allocated so far has
    /// already been released.
    pub async fn cook<D: DelayNs, P: ProgressSink + ?Sized>(
        &self,
        character: &Character,
        target: &str,
        delay: &mut D,
        sink: &P,
    ) -> Result<CookedSet, LoadError> {
        let state = character.state(target).ok_or(LoadError::NotFound)?;
        info!("cooking {}", target);

        match &state.image {
            StateImage::Image(image) => {
                let mut progress = Progress::new(sink, 1);
                let data = self.load_image(image).await?;
                progress.step();
                Ok(CookedSet::Image(data))
            }
            StateImage::Animation(reference) => {
                let animation = character
                    .animation(&reference.name)
                    .ok_or(LoadError::NotFound)?;
                let mut progress = Progress::new(sink, animation.frame_count);
                let frames = self
                    .load_animation(&reference.name, animation, delay, &mut progress)
                    .await?;
                Ok(CookedSet::Animation(frames))
            }
            StateImage::Sequence(sequence) => match sequence.mode {
                SequenceMode::LoadAll => {
                    let mut progress = Progress::new(sink, sequence.frames.len() as u32);
                    let mut frames = Vec::with_capacity(sequence.frames.len());
                    for frame in &sequence.frames {
                        frames.push(self.load_image(&frame.image).await?);
                        progress.step();
                        delay.delay_ms(self.pacing_ms).await;
                    }
                    Ok(CookedSet::Sequence(frames))
                }
                SequenceMode::LoadEach => self.cook_ping_pong(&sequence.frames, sink).await,
                SequenceMode::Preload => Err(LoadError::NotFound),
            },
            StateImage::None => Err(LoadError::NotFound),
        }
    }

    async fn cook_ping_pong<P: ProgressSink + ?Sized>(
        &self,
        frames: &[SequenceFrame],
        sink: &P,
    ) -> Result<CookedSet, LoadError> {
        if frames.is_empty() {
            return Ok(CookedSet::Sequence(Vec::new()));
        }

        let mut largest = 0;
        for frame in frames {
            largest = largest.max(self.image_size(&frame.image).await?);
        }

        let mut progress = Progress::new(sink, 1);
        let front = self.reserve(largest)?;
        let back = self.reserve(largest)?;
        let mut ping_pong = PingPong::new(front, back);
        ping_pong.prepare(self, frames, 0).await?;
        progress.step();
        Ok(CookedSet::PingPong(ping_pong))
    }
}

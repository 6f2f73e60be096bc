//! Rendering the current state
//!
//! The render plan is computed inside the critical section and only holds
//! cloned handles, so drawing and animation playback run without the lock.
//! The machine is busy for the whole render.

use alloc::vec::Vec;

use embedded_hal_async::delay::DelayNs;

use super::machine::{best_effort, CharacterMachine};
use super::shared::{BusyGuard, Shared};
use crate::arena::ImageData;
use crate::character::{
    Animation, AnimationMode, AnimationRef, ImageDescriptor, Residency, Sequence, SequenceFrame,
    SequenceMode, StateImage,
};
use crate::loader::{CookedSet, PingPong};
use crate::traits::{AnimationFrame, AssetStorage, CharacterDisplay, Clock};

/// What to draw for the current state
#[derive(Debug)]
pub(crate) enum RenderPlan {
    Skip,
    Clear,
    Still {
        image: ImageDescriptor,
        data: ImageData,
    },
    /// Play an animation; `frames` is `None` when streaming from storage
    Play {
        reference: AnimationRef,
        animation: Animation,
        frames: Option<Vec<ImageData>>,
    },
    /// Show one ping-pong sequence frame and prefetch the next
    PingPong {
        frames: Vec<SequenceFrame>,
        index: usize,
        buffers: PingPong,
    },
}

impl Shared {
    pub(crate) fn render_plan(&mut self, now_us: u64) -> RenderPlan {
        self.ui_dirty = false;
        let Some(character) = self.character.clone() else {
            return RenderPlan::Skip;
        };
        let Some(state) = character.state(&self.current) else {
            return RenderPlan::Skip;
        };

        match &state.image {
            StateImage::None => RenderPlan::Clear,
            StateImage::Image(image) => match self.resident_image(image) {
                Some(data) => RenderPlan::Still {
                    image: image.clone(),
                    data,
                },
                None => {
                    warn!("image {} not resident", image.name.as_str());
                    RenderPlan::Clear
                }
            },
            StateImage::Animation(reference) => match character.animation(&reference.name) {
                Some(animation) => RenderPlan::Play {
                    reference: reference.clone(),
                    animation: animation.clone(),
                    frames: self.resident_animation(reference, animation),
                },
                None => {
                    warn!("animation {} missing", reference.name.as_str());
                    RenderPlan::Clear
                }
            },
            StateImage::Sequence(sequence) => self.sequence_plan(sequence, now_us),
        }
    }

    fn resident_image(&self, image: &ImageDescriptor) -> Option<ImageData> {
        match image.residency {
            Residency::Preload => self.preloaded.image(&image.name).cloned(),
            Residency::Layer => self.layer.image(&image.name).cloned(),
            Residency::OnDemand => match &self.cooked {
                Some(CookedSet::Image(data)) => Some(data.clone()),
                _ => None,
            },
        }
    }

    /// Resident frames, or `None` to stream from storage
    fn resident_animation(
        &self,
        reference: &AnimationRef,
        animation: &Animation,
    ) -> Option<Vec<ImageData>> {
        match reference.residency {
            Residency::Preload => self.preloaded.animation(&reference.name).map(<[_]>::to_vec),
            Residency::Layer => self.layer.animation(&reference.name).map(<[_]>::to_vec),
            Residency::OnDemand => match (&self.cooked, animation.mode) {
                (Some(CookedSet::Animation(frames)), AnimationMode::FromMemory) => {
                    Some(frames.clone())
                }
                _ => None,
            },
        }
    }

    /// Advance the sequence cursor when its deadline passed
    fn sequence_plan(&mut self, sequence: &Sequence, now_us: u64) -> RenderPlan {
        let count = sequence.frames.len();
        if count == 0 {
            return RenderPlan::Clear;
        }

        let index = match self.sequence_cursor {
            None => 0,
            Some(cursor) if now_us > self.next_frame_us => (cursor + 1) % count,
            Some(cursor) => cursor,
        };
        if self.sequence_cursor != Some(index) || self.next_frame_us == 0 {
            let duration = u64::try_from(sequence.frames[index].duration_us).unwrap_or(0);
            self.sequence_cursor = Some(index);
            self.next_frame_us = now_us.saturating_add(duration).max(1);
        }

        let frame = &sequence.frames[index];
        let data = match sequence.mode {
            SequenceMode::Preload => self.preloaded.image(&frame.image.name).cloned(),
            SequenceMode::LoadAll => match &self.cooked {
                Some(CookedSet::Sequence(frames)) => frames.get(index).cloned(),
                _ => None,
            },
            SequenceMode::LoadEach => {
                return match self.cooked.take() {
                    Some(CookedSet::PingPong(buffers)) => RenderPlan::PingPong {
                        frames: sequence.frames.clone(),
                        index,
                        buffers,
                    },
                    other => {
                        self.cooked = other;
                        RenderPlan::Clear
                    }
                };
            }
        };

        match data {
            Some(data) => RenderPlan::Still {
                image: frame.image.clone(),
                data,
            },
            None => {
                warn!("sequence frame {} not resident", index);
                RenderPlan::Clear
            }
        }
    }
}

impl<S: AssetStorage, C: Clock> CharacterMachine<'_, S, C> {
    /// Draw the current state
    ///
    /// Animations play to completion here and then request their next state.
    pub(super) async fn render<D: CharacterDisplay, W: DelayNs>(
        &self,
        display: &mut D,
        delay: &mut W,
    ) {
        let guard = BusyGuard::new(&self.shared);
        let now = self.clock.now_us();
        let plan = self.with(|s| s.render_plan(now));

        let next_state = match plan {
            RenderPlan::Skip => None,
            RenderPlan::Clear => {
                best_effort(display.clear_image());
                None
            }
            RenderPlan::Still { image, data } => {
                best_effort(display.show_image(&image, data.as_bytes()));
                None
            }
            RenderPlan::Play {
                reference,
                animation,
                frames,
            } => {
                self.play(display, delay, &reference, &animation, frames)
                    .await;
                Some(reference.next_state)
            }
            RenderPlan::PingPong {
                frames,
                index,
                mut buffers,
            } => {
                self.show_ping_pong(display, &frames, index, &mut buffers)
                    .await;
                self.with(|s| {
                    if s.cooked.is_none() {
                        s.cooked = Some(CookedSet::PingPong(buffers));
                    }
                });
                None
            }
        };

        drop(guard);
        if let Some(next_state) = next_state {
            let _ = self.switch_state(&next_state);
        }
    }

    async fn play<D: CharacterDisplay, W: DelayNs>(
        &self,
        display: &mut D,
        delay: &mut W,
        reference: &AnimationRef,
        animation: &Animation,
        frames: Option<Vec<ImageData>>,
    ) {
        if animation.clear_screen {
            best_effort(display.fill_background(animation.background_color));
        }
        let loops = reference.loop_count.max(1);
        let interval_us = u64::try_from(animation.interval_us).unwrap_or(0);

        if let Some(frames) = frames {
            for _ in 0..loops {
                for data in &frames {
                    let started = self.clock.now_us();
                    best_effort(display.draw_frame(&AnimationFrame {
                        animation,
                        pixels: data.as_bytes(),
                    }));
                    self.pace(delay, started, interval_us).await;
                }
            }
            return;
        }

        // Stream through a single scratch frame
        let Some(character) = self.character() else {
            return;
        };
        let loader = self.loader(&character);
        let scratch = animation
            .frame_bytes()
            .and_then(|size| self.arena.allocate(size));
        let Some(mut scratch) = scratch else {
            warn!("no room to stream {}", reference.name.as_str());
            self.post_notice("Couldn't play animation", "Out of image memory");
            return;
        };

        for _ in 0..loops {
            for index in 1..=animation.frame_count {
                let started = self.clock.now_us();
                if let Err(e) = loader
                    .read_frame_into(&reference.name, index, scratch.as_mut_slice())
                    .await
                {
                    warn!("frame {} of {}: {}", index, reference.name.as_str(), e);
                    self.post_notice("Couldn't play animation", e.as_str());
                    return;
                }
                best_effort(display.draw_frame(&AnimationFrame {
                    animation,
                    pixels: scratch.as_slice(),
                }));
                self.pace(delay, started, interval_us).await;
            }
        }
    }

    /// Hold the frame until its interval is over, yielding at least the pacing gap
    async fn pace<W: DelayNs>(&self, delay: &mut W, started_us: u64, interval_us: u64) {
        let spent = self.clock.now_us().saturating_sub(started_us);
        let minimum = u64::from(self.config.frame_pacing_ms) * 1000;
        let wait = interval_us.saturating_sub(spent).max(minimum);
        delay
            .delay_us(u32::try_from(wait).unwrap_or(u32::MAX))
            .await;
    }

    async fn show_ping_pong<D: CharacterDisplay>(
        &self,
        display: &mut D,
        frames: &[SequenceFrame],
        index: usize,
        buffers: &mut PingPong,
    ) {
        let Some(character) = self.character() else {
            return;
        };
        let loader = self.loader(&character);

        let slot = match buffers.prepare(&loader, frames, index).await {
            Ok(slot) => slot,
            Err(e) => {
                warn!("sequence frame {}: {}", index, e);
                self.post_notice("Couldn't load frame", e.as_str());
                return;
            }
        };
        best_effort(display.show_image(&frames[index].image, buffers.bytes(slot)));
        buffers.mark_shown(slot);

        let next = (index + 1) % frames.len();
        if let Err(e) = buffers.prepare(&loader, frames, next).await {
            warn!("prefetch of frame {} failed: {}", next, e);
        }
    }
}

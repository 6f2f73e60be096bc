//! Record layouts

use alloc::string::String;
use alloc::vec::Vec;

use super::bytes::{Reader, Writer};
use super::{FormatError, Record, RecordKind};
use crate::character::{
    Action, ActionEffect, Animation, AnimationMode, AnimationRef, ImageDescriptor, Residency,
    SequenceFrame, SequenceMode, Trigger,
};

/// Version written into `character.bin` by the asset tooling
pub const FORMAT_VERSION: u16 = 1;

/// Size of every name field
pub const NAME_LEN: usize = 64;

const STATE_UNION_LEN: usize = 131;
const TRIGGER_PAYLOAD_LEN: usize = 20;
const ACTION_PAYLOAD_LEN: usize = 64;

/// Header of a character directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterRecord {
    pub name: String,
    pub species: String,
    pub default_state: String,
}

impl Record for CharacterRecord {
    const KIND: RecordKind = RecordKind::Character;
    const SIZE: usize = 2 + 3 * NAME_LEN;

    fn decode(bytes: &[u8]) -> Result<Self, FormatError> {
        let mut r = Reader::new(bytes, Self::KIND, Self::SIZE)?;
        let found = r.u16()?;
        if found != FORMAT_VERSION {
            return Err(FormatError::VersionMismatch {
                found,
                expected: FORMAT_VERSION,
            });
        }
        Ok(Self {
            name: r.string(NAME_LEN)?,
            species: r.string(NAME_LEN)?,
            default_state: r.string(NAME_LEN)?,
        })
    }

    fn to_bytes(&self) -> Vec<u8> {
        Writer::with_capacity(Self::SIZE)
            .u16(FORMAT_VERSION)
            .string(NAME_LEN, &self.name)
            .string(NAME_LEN, &self.species)
            .string(NAME_LEN, &self.default_state)
            .finish()
    }
}

/// Visual part of a state record
///
/// Sequence frames live in their own files, so only the count is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateImageRecord {
    None,
    Image(ImageDescriptor),
    Animation(AnimationRef),
    Sequence { frame_count: u16, mode: SequenceMode },
}

/// Contents of `state.bin`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateRecord {
    pub layer: u16,
    pub image: StateImageRecord,
}

impl Record for StateRecord {
    const KIND: RecordKind = RecordKind::State;
    const SIZE: usize = 3 + STATE_UNION_LEN;

    fn decode(bytes: &[u8]) -> Result<Self, FormatError> {
        let mut r = Reader::new(bytes, Self::KIND, Self::SIZE)?;
        let layer = r.u16()?;
        let image = match r.u8()? {
            0 => StateImageRecord::None,
            1 => {
                let name = r.string(NAME_LEN)?;
                let width = r.u32()?;
                let height = r.u32()?;
                let has_alpha = r.bool()?;
                let upscale = r.bool()?;
                let residency = residency(&mut r)?;
                StateImageRecord::Image(ImageDescriptor {
                    name,
                    width,
                    height,
                    has_alpha,
                    upscale,
                    residency,
                })
            }
            2 => StateImageRecord::Animation(AnimationRef {
                name: r.string(NAME_LEN)?,
                next_state: r.string(NAME_LEN)?,
                loop_count: r.u16()?,
                residency: residency(&mut r)?,
            }),
            3 => {
                let frame_count = r.u16()?;
                let mode = match r.u8()? {
                    0 => SequenceMode::LoadAll,
                    1 => SequenceMode::LoadEach,
                    2 => SequenceMode::Preload,
                    tag => return Err(r.unknown_tag(tag)),
                };
                StateImageRecord::Sequence { frame_count, mode }
            }
            tag => return Err(r.unknown_tag(tag)),
        };
        Ok(Self { layer, image })
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut w = Writer::with_capacity(Self::SIZE);
        w.u16(self.layer);
        match &self.image {
            StateImageRecord::None => {
                w.u8(0);
            }
            StateImageRecord::Image(d) => {
                w.u8(1)
                    .string(NAME_LEN, &d.name)
                    .u32(d.width)
                    .u32(d.height)
                    .bool(d.has_alpha)
                    .bool(d.upscale)
                    .u8(residency_tag(d.residency));
            }
            StateImageRecord::Animation(a) => {
                w.u8(2)
                    .string(NAME_LEN, &a.name)
                    .string(NAME_LEN, &a.next_state)
                    .u16(a.loop_count)
                    .u8(residency_tag(a.residency));
            }
            StateImageRecord::Sequence { frame_count, mode } => {
                let mode = match mode {
                    SequenceMode::LoadAll => 0,
                    SequenceMode::LoadEach => 1,
                    SequenceMode::Preload => 2,
                };
                w.u8(3).u16(*frame_count).u8(mode);
            }
        }
        w.pad_to(Self::SIZE).finish()
    }
}

/// Contents of `transition.bin`; the target is the directory name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRecord {
    /// Evaluation order among the state's transitions
    pub order: u16,
    pub trigger: Trigger,
}

impl Record for TransitionRecord {
    const KIND: RecordKind = RecordKind::Transition;
    const SIZE: usize = 3 + TRIGGER_PAYLOAD_LEN;

    fn decode(bytes: &[u8]) -> Result<Self, FormatError> {
        let mut r = Reader::new(bytes, Self::KIND, Self::SIZE)?;
        let order = r.u16()?;
        let trigger = match r.u8()? {
            0 => Trigger::ElapsedTime {
                duration_us: r.i64()?,
            },
            1 => Trigger::Clicked,
            2 => Trigger::Random {
                start_us: r.i64()?,
                end_us: r.i64()?,
                chance_mod: r.u32()?,
            },
            tag => return Err(r.unknown_tag(tag)),
        };
        Ok(Self { order, trigger })
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut w = Writer::with_capacity(Self::SIZE);
        w.u16(self.order);
        match self.trigger {
            Trigger::ElapsedTime { duration_us } => {
                w.u8(0).i64(duration_us);
            }
            Trigger::Clicked => {
                w.u8(1);
            }
            Trigger::Random {
                start_us,
                end_us,
                chance_mod,
            } => {
                w.u8(2).i64(start_us).i64(end_us).u32(chance_mod);
            }
        }
        w.pad_to(Self::SIZE).finish()
    }
}

impl Record for Animation {
    const KIND: RecordKind = RecordKind::Animation;
    const SIZE: usize = 29;

    fn decode(bytes: &[u8]) -> Result<Self, FormatError> {
        let mut r = Reader::new(bytes, Self::KIND, Self::SIZE)?;
        let x = r.u16()?;
        let y = r.u16()?;
        let width = r.u32()?;
        let height = r.u32()?;
        let frame_count = r.u32()?;
        let interval_us = r.i64()?;
        let clear_screen = r.bool()?;
        let background_color = r.u16_be()?;
        let mode = match r.u8()? {
            0 => AnimationMode::FromStorage,
            1 => AnimationMode::FromMemory,
            tag => return Err(r.unknown_tag(tag)),
        };
        let upscale = r.bool()?;
        Ok(Self {
            x,
            y,
            width,
            height,
            frame_count,
            interval_us,
            clear_screen,
            background_color,
            mode,
            upscale,
        })
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mode = match self.mode {
            AnimationMode::FromStorage => 0,
            AnimationMode::FromMemory => 1,
        };
        Writer::with_capacity(Self::SIZE)
            .u16(self.x)
            .u16(self.y)
            .u32(self.width)
            .u32(self.height)
            .u32(self.frame_count)
            .i64(self.interval_us)
            .bool(self.clear_screen)
            .u16_be(self.background_color)
            .u8(mode)
            .bool(self.upscale)
            .finish()
    }
}

impl Record for SequenceFrame {
    const KIND: RecordKind = RecordKind::SequenceFrame;
    const SIZE: usize = NAME_LEN + 18;

    fn decode(bytes: &[u8]) -> Result<Self, FormatError> {
        let mut r = Reader::new(bytes, Self::KIND, Self::SIZE)?;
        let image = ImageDescriptor {
            name: r.string(NAME_LEN)?,
            width: r.u32()?,
            height: r.u32()?,
            has_alpha: r.bool()?,
            upscale: r.bool()?,
            residency: Residency::OnDemand,
        };
        Ok(Self {
            image,
            duration_us: r.i64()?,
        })
    }

    fn to_bytes(&self) -> Vec<u8> {
        Writer::with_capacity(Self::SIZE)
            .string(NAME_LEN, &self.image.name)
            .u32(self.image.width)
            .u32(self.image.height)
            .bool(self.image.has_alpha)
            .bool(self.image.upscale)
            .i64(self.duration_us)
            .finish()
    }
}

impl Record for Action {
    const KIND: RecordKind = RecordKind::Action;
    const SIZE: usize = NAME_LEN + 1 + ACTION_PAYLOAD_LEN;

    fn decode(bytes: &[u8]) -> Result<Self, FormatError> {
        let mut r = Reader::new(bytes, Self::KIND, Self::SIZE)?;
        let display = r.string(NAME_LEN)?;
        let effect = match r.u8()? {
            0 => ActionEffect::SwitchState(r.string(ACTION_PAYLOAD_LEN)?),
            tag => return Err(r.unknown_tag(tag)),
        };
        Ok(Self { display, effect })
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut w = Writer::with_capacity(Self::SIZE);
        w.string(NAME_LEN, &self.display);
        match &self.effect {
            ActionEffect::SwitchState(target) => {
                w.u8(0).string(ACTION_PAYLOAD_LEN, target);
            }
        }
        w.finish()
    }
}

fn residency(r: &mut Reader<'_>) -> Result<Residency, FormatError> {
    match r.u8()? {
        0 => Ok(Residency::OnDemand),
        1 => Ok(Residency::Preload),
        2 => Ok(Residency::Layer),
        tag => Err(r.unknown_tag(tag)),
    }
}

fn residency_tag(residency: Residency) -> u8 {
    match residency {
        Residency::OnDemand => 0,
        Residency::Preload => 1,
        Residency::Layer => 2,
    }
}

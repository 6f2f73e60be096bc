//! Character directory decoder
//!
//! Builds a complete [`Character`] or fails; nothing partial is returned.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use super::CharacterPaths;
use crate::character::{
    Action, Animation, Character, Sequence, SequenceFrame, State, StateImage, Transition,
};
use crate::error::LoadError;
use crate::format::{CharacterRecord, Record, StateImageRecord, StateRecord, TransitionRecord};
use crate::traits::AssetStorage;

/// Read and decode one fixed-size record
pub async fn read_record<R: Record, S: AssetStorage>(
    storage: &S,
    path: &str,
) -> Result<R, LoadError> {
    let mut buffer = vec![0u8; R::SIZE];
    let len = storage.read(path, &mut buffer).await?;
    R::decode(&buffer[..len]).map_err(|e| {
        warn!("decode {}: {}", path, e);
        LoadError::Incompatible(e)
    })
}

/// Decode the character stored under `<root>/<id>`
pub async fn decode_character<S: AssetStorage>(
    storage: &S,
    root: &str,
    id: &str,
) -> Result<Character, LoadError> {
    let paths = CharacterPaths::new(root, id);
    let header: CharacterRecord = read_record(storage, &paths.character()).await?;

    let mut states = BTreeMap::new();
    for name in storage.list_dirs(&paths.states()).await? {
        let state = decode_state(storage, &paths, &name).await?;
        states.insert(name, state);
    }
    if !states.contains_key(&header.default_state) {
        warn!("default state {} missing", header.default_state.as_str());
        return Err(LoadError::NotFound);
    }

    let mut animations = BTreeMap::new();
    for name in storage.list_dirs(&paths.animations()).await? {
        let animation: Animation = read_record(storage, &paths.animation(&name)).await?;
        animations.insert(name, animation);
    }

    let mut actions = BTreeMap::new();
    for name in storage.list_dirs(&paths.actions()).await? {
        let action: Action = read_record(storage, &paths.action(&name)).await?;
        actions.insert(name, action);
    }

    info!(
        "decoded {}: {} states, {} animations, {} actions",
        id,
        states.len(),
        animations.len(),
        actions.len()
    );

    Ok(Character {
        id: id.into(),
        name: header.name,
        species: header.species,
        default_state: header.default_state,
        states,
        animations,
        actions,
    })
}

async fn decode_state<S: AssetStorage>(
    storage: &S,
    paths: &CharacterPaths<'_>,
    name: &str,
) -> Result<State, LoadError> {
    let record: StateRecord = read_record(storage, &paths.state(name)).await?;

    let image = match record.image {
        StateImageRecord::None => StateImage::None,
        StateImageRecord::Image(descriptor) => StateImage::Image(descriptor),
        StateImageRecord::Animation(reference) => StateImage::Animation(reference),
        StateImageRecord::Sequence { frame_count, mode } => {
            let mut frames: Vec<SequenceFrame> = Vec::with_capacity(frame_count as usize);
            for index in 0..frame_count as usize {
                frames.push(read_record(storage, &paths.sequence_frame(name, index)).await?);
            }
            StateImage::Sequence(Sequence { frames, mode })
        }
    };

    let mut ordered: Vec<(u16, String, TransitionRecord)> = Vec::new();
    for target in storage.list_dirs(&paths.transitions(name)).await? {
        let path = paths.transition(name, &target);
        let record: TransitionRecord = read_record(storage, &path).await?;
        ordered.push((record.order, target, record));
    }
    ordered.sort_by(|a, b| (a.0, &a.1).cmp(&(b.0, &b.1)));

    let transitions = ordered
        .into_iter()
        .map(|(_, target, record)| Transition {
            target,
            trigger: record.trigger,
        })
        .collect();

    Ok(State {
        layer: record.layer,
        image,
        transitions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::{ActionEffect, ImageDescriptor, Residency, SequenceMode, Trigger};
    use crate::format::{FormatError, RecordKind};
    use crate::testing::{Fixture, MemStorage};
    use embassy_futures::block_on;

    fn image(name: &str) -> ImageDescriptor {
        ImageDescriptor {
            name: name.into(),
            width: 4,
            height: 4,
            has_alpha: false,
            upscale: false,
            residency: Residency::OnDemand,
        }
    }

    fn basic(storage: &MemStorage) {
        Fixture::new(storage, "fox")
            .character("Fox", "Vulpes", "idle")
            .state("idle", 0, StateImageRecord::Image(image("sit")))
            .state(
                "dance",
                0,
                StateImageRecord::Sequence {
                    frame_count: 2,
                    mode: SequenceMode::LoadAll,
                },
            )
            .sequence_frame(
                "dance",
                0,
                &SequenceFrame {
                    image: image("d0"),
                    duration_us: 1000,
                },
            )
            .sequence_frame(
                "dance",
                1,
                &SequenceFrame {
                    image: image("d1"),
                    duration_us: 2000,
                },
            )
            .transition(
                "idle",
                "dance",
                TransitionRecord {
                    order: 1,
                    trigger: Trigger::Clicked,
                },
            )
            .transition(
                "idle",
                "zzz",
                TransitionRecord {
                    order: 0,
                    trigger: Trigger::ElapsedTime { duration_us: 5 },
                },
            )
            .action(
                "wave",
                &Action {
                    display: "Wave".into(),
                    effect: ActionEffect::SwitchState("dance".into()),
                },
            );
    }

    #[test]
    fn test_decode_complete_character() {
        let storage = MemStorage::new();
        basic(&storage);

        let c = block_on(decode_character(&storage, "characters", "fox")).unwrap();
        assert_eq!(c.name, "Fox");
        assert_eq!(c.species, "Vulpes");
        assert_eq!(c.states.len(), 2);
        assert_eq!(c.action_id_at(0), Some("wave"));

        match &c.state("dance").unwrap().image {
            StateImage::Sequence(seq) => {
                assert_eq!(seq.frames.len(), 2);
                assert_eq!(seq.frames[1].image.name, "d1");
                assert_eq!(seq.frames[1].duration_us, 2000);
            }
            other => panic!("unexpected image {:?}", other),
        }
    }

    #[test]
    fn test_transitions_follow_order_field() {
        let storage = MemStorage::new();
        basic(&storage);

        let c = block_on(decode_character(&storage, "characters", "fox")).unwrap();
        let targets: Vec<_> = c
            .state("idle")
            .unwrap()
            .transitions
            .iter()
            .map(|t| t.target.as_str())
            .collect();
        assert_eq!(targets, vec!["zzz", "dance"]);
    }

    #[test]
    fn test_bad_record_aborts_whole_load() {
        let storage = MemStorage::new();
        basic(&storage);
        // Corrupt one transition deep in the tree
        let path = CharacterPaths::new("characters", "fox").transition("idle", "zzz");
        let mut bytes = TransitionRecord {
            order: 0,
            trigger: Trigger::Clicked,
        }
        .to_bytes();
        bytes[2] = 42;
        storage.put(&path, bytes);

        let result = block_on(decode_character(&storage, "characters", "fox"));
        assert_eq!(
            result,
            Err(LoadError::Incompatible(FormatError::UnknownTag {
                record: RecordKind::Transition,
                tag: 42
            }))
        );
    }

    #[test]
    fn test_truncated_file_is_incompatible() {
        let storage = MemStorage::new();
        basic(&storage);
        let path = CharacterPaths::new("characters", "fox").action("wave");
        storage.put(&path, vec![0u8; 12]);

        let result = block_on(decode_character(&storage, "characters", "fox"));
        assert_eq!(
            result,
            Err(LoadError::Incompatible(FormatError::Truncated {
                record: RecordKind::Action
            }))
        );
    }

    #[test]
    fn test_missing_default_state() {
        let storage = MemStorage::new();
        Fixture::new(&storage, "fox")
            .character("Fox", "Vulpes", "nowhere")
            .state("idle", 0, StateImageRecord::None);

        let result = block_on(decode_character(&storage, "characters", "fox"));
        assert_eq!(result, Err(LoadError::NotFound));
    }

    #[test]
    fn test_missing_character_file() {
        let storage = MemStorage::new();
        let result = block_on(decode_character(&storage, "characters", "ghost"));
        assert_eq!(result, Err(LoadError::NotFound));
    }
}
